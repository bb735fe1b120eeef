//! Console configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the clinic backend
    pub api_base_url: String,
    /// Path to the local database file
    pub database_path: PathBuf,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn new(data_dir: PathBuf, api_base_url: String) -> Self {
        Self {
            api_base_url,
            database_path: data_dir.join("medboard.db"),
            request_timeout_secs: 30,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("MedBoard"))
            .unwrap_or_else(|| PathBuf::from(".medboard"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir(), "http://localhost:8000".to_string())
    }
}

// Simple dirs implementation for common directories
mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}
