use anyhow::{anyhow, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_DATA_PATH: &str = "mediaData.json";
const DEFAULT_DOCS_PATH: &str = "api-documentation.html";
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_path: PathBuf,
    pub docs_path: PathBuf,
    pub port: u16,
    /// Run the interactive start/stop/exit console instead of serving until a signal.
    pub console: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match value("MEDIAVAULT_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| anyhow!("Invalid MEDIAVAULT_PORT '{}': {}", raw, e))?,
            None => DEFAULT_PORT,
        };
        let console = match value("MEDIAVAULT_CONSOLE") {
            Some(raw) => parse_flag(&raw)
                .ok_or_else(|| anyhow!("Invalid MEDIAVAULT_CONSOLE '{}': expected true/false", raw))?,
            None => true,
        };

        Ok(Self {
            data_path: value("MEDIAVAULT_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
            docs_path: value("MEDIAVAULT_DOCS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCS_PATH)),
            port,
            console,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
