// ./api/src/config.rs
use application::SearchOptions;
use application::search::DEFAULT_SEARCH_WORKERS;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATA_FILE: &str = "books.json";

/// Where the catalog is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    File,
    Memory,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown storage kind '{}'", other)),
        }
    }
}

/// Runtime settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_file: PathBuf,
    pub storage: StorageKind,
    pub search: SearchOptions,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source. Unset or invalid values
    /// fall back to defaults with a log line.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = parsed_or(&lookup, "PORT", DEFAULT_PORT, |_| true);
        let data_file = match lookup("BOOKS_DATA_FILE") {
            Some(path) if !path.trim().is_empty() => {
                info!("Using data file {} from environment variable BOOKS_DATA_FILE.", path);
                PathBuf::from(path)
            }
            _ => {
                info!("BOOKS_DATA_FILE not set. Using default data file {}.", DEFAULT_DATA_FILE);
                PathBuf::from(DEFAULT_DATA_FILE)
            }
        };
        let storage = parsed_or(&lookup, "BOOKS_STORAGE", StorageKind::File, |_| true);
        let workers = parsed_or(&lookup, "SEARCH_WORKERS", DEFAULT_SEARCH_WORKERS, |w| *w >= 1);
        let timeout = lookup("SEARCH_TIMEOUT_MS").and_then(|raw| match raw.trim().parse::<u64>() {
            Ok(ms) if ms > 0 => {
                info!("Search timeout set to {} ms.", ms);
                Some(Duration::from_millis(ms))
            }
            _ => {
                warn!("Invalid SEARCH_TIMEOUT_MS value '{}'. Searches will wait for every worker.", raw);
                None
            }
        });

        Self {
            port,
            data_file,
            storage,
            search: SearchOptions { workers, timeout },
        }
    }
}

fn parsed_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
    valid: impl Fn(&T) -> bool,
) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) if valid(&value) => {
                info!("Using {} {:?} from environment.", key, value);
                value
            }
            _ => {
                warn!(
                    "Invalid {} value '{}' in environment. Using default {:?}.",
                    key, raw, default
                );
                default
            }
        },
        None => {
            info!("{} not set. Using default {:?}.", key, default);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config_from(&[]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.data_file, PathBuf::from("books.json"));
        assert_eq!(config.storage, StorageKind::File);
        assert_eq!(config.search, SearchOptions::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = config_from(&[
            ("PORT", "8081"),
            ("BOOKS_DATA_FILE", "/tmp/library.json"),
            ("BOOKS_STORAGE", "Memory"),
            ("SEARCH_WORKERS", "8"),
            ("SEARCH_TIMEOUT_MS", "250"),
        ]);
        assert_eq!(config.port, 8081);
        assert_eq!(config.data_file, PathBuf::from("/tmp/library.json"));
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.search.workers, 8);
        assert_eq!(config.search.timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = config_from(&[
            ("PORT", "eighty"),
            ("BOOKS_STORAGE", "s3"),
            ("SEARCH_WORKERS", "0"),
            ("SEARCH_TIMEOUT_MS", "soon"),
        ]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.storage, StorageKind::File);
        assert_eq!(config.search.workers, DEFAULT_SEARCH_WORKERS);
        assert_eq!(config.search.timeout, None);
    }
}
