//! Configuration management for the server.

use rolodex_engine::ComparedFields;
use std::env;

/// Default remote directory endpoint.
const DEFAULT_DIRECTORY_URL: &str = "https://people.googleapis.com/v1";

/// Largest page the directory accepts.
const MAX_PAGE_SIZE: u32 = 1000;

/// Connection settings for the remote directory.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Base URL of the directory API
    pub base_url: String,
    /// Bearer token obtained outside this service
    pub token: String,
    /// Records requested per page
    pub page_size: u32,
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// PostgreSQL connection URL; the in-memory store is used when absent
    pub database_url: Option<String>,
    pub directory: DirectoryConfig,
    /// Maximum concurrent remote create calls during export
    pub export_concurrency: usize,
    /// Fields compared to detect conflicts
    pub compare_fields: ComparedFields,
    /// Push locally-kept conflict winners back to the directory
    pub push_local_winners: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());

        let base_url = lookup("DIRECTORY_URL")
            .unwrap_or_else(|| DEFAULT_DIRECTORY_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let token = lookup("DIRECTORY_TOKEN")
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingDirectoryToken)?;

        let page_size = lookup("DIRECTORY_PAGE_SIZE")
            .unwrap_or_else(|| "100".to_string())
            .parse::<u32>()
            .ok()
            .filter(|size| (1..=MAX_PAGE_SIZE).contains(size))
            .ok_or(ConfigError::InvalidPageSize)?;

        let export_concurrency = lookup("EXPORT_CONCURRENCY")
            .unwrap_or_else(|| "4".to_string())
            .parse::<usize>()
            .ok()
            .filter(|n| *n >= 1)
            .ok_or(ConfigError::InvalidConcurrency)?;

        let compare_fields = match lookup("COMPARE_FIELDS") {
            Some(fields) => fields.parse().map_err(ConfigError::InvalidCompareFields)?,
            None => ComparedFields::default(),
        };

        let push_local_winners = match lookup("PUSH_LOCAL_WINNERS").as_deref() {
            None | Some("") | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(_) => return Err(ConfigError::InvalidFlag("PUSH_LOCAL_WINNERS")),
        };

        Ok(Self {
            host,
            port,
            database_url,
            directory: DirectoryConfig {
                base_url,
                token,
                page_size,
            },
            export_concurrency,
            compare_fields,
            push_local_winners,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DIRECTORY_TOKEN environment variable is required")]
    MissingDirectoryToken,

    #[error("Invalid PORT value")]
    InvalidPort,

    #[error("DIRECTORY_PAGE_SIZE must be between 1 and {}", MAX_PAGE_SIZE)]
    InvalidPageSize,

    #[error("EXPORT_CONCURRENCY must be a positive integer")]
    InvalidConcurrency,

    #[error("Invalid COMPARE_FIELDS: {0}")]
    InvalidCompareFields(String),

    #[error("{0} must be true or false")]
    InvalidFlag(&'static str),
}
