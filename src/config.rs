use dotenvy::dotenv;
use std::{
    env,
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    str::FromStr,
};
use thiserror::Error;
use tracing::Level;

pub const DEFAULT_PORT: u16 = 1111;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error("unknown STORAGE_TYPE {0:?}, expected \"local\" or \"memory\"")]
    StorageType(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Local,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    pub storage_type: StorageKind,
    pub storage_path: PathBuf,
    /// `None` leaves upload bodies unbounded.
    pub max_upload_bytes: Option<usize>,
    pub log_level: Level,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source. Unset and empty
    /// variables both fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let storage_type = match var("STORAGE_TYPE").as_deref() {
            None | Some("local") => StorageKind::Local,
            Some("memory") => StorageKind::Memory,
            Some(other) => return Err(ConfigError::StorageType(other.to_string())),
        };

        Ok(Self {
            host: parse(var("HOST"), "HOST")?.unwrap_or(IpAddr::from([0, 0, 0, 0])),
            port: parse(var("PORT"), "PORT")?.unwrap_or(DEFAULT_PORT),
            storage_type,
            storage_path: var("STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("files")),
            max_upload_bytes: parse(var("MAX_UPLOAD_BYTES"), "MAX_UPLOAD_BYTES")?,
            log_level: parse(var("LOG_LEVEL"), "LOG_LEVEL")?.unwrap_or(Level::INFO),
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse<T: FromStr>(value: Option<String>, name: &'static str) -> Result<Option<T>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value.trim().parse() {
        Ok(parsed) => Ok(Some(parsed)),
        Err(_) => Err(ConfigError::Invalid { name, value }),
    }
}
