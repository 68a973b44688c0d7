use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

use walletchat_inbox::DefaultCommunity;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub default_community: DefaultCommunity,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.into());

        let port = var("WALLETCHAT_PORT", "8080");
        let port = port
            .parse()
            .with_context(|| format!("WALLETCHAT_PORT is not a port: '{}'", port))?;

        Ok(Self {
            host: var("WALLETCHAT_HOST", "0.0.0.0"),
            port,
            db_path: PathBuf::from(var("WALLETCHAT_DB_PATH", "walletchat.db")),
            default_community: DefaultCommunity {
                address: var("WALLETCHAT_DEFAULT_COMMUNITY", "walletchat"),
                name: var("WALLETCHAT_DEFAULT_COMMUNITY_NAME", "WalletChat HQ"),
            },
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}
