use serde::Deserialize;
use std::{fs, path::Path};
use tracing::info;

#[derive(Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_pdf_dir")]
    pub pdf_dir: String,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default)]
    pub sources: Sources,
}

#[derive(Deserialize)]
pub struct Sources {
    #[serde(default = "default_vero_url")]
    pub vero_url: String,
    #[serde(default = "default_stokomak_url")]
    pub stokomak_url: String,
}

fn default_db_path() -> String {
    "pricestore/products.db".to_string()
}

fn default_pdf_dir() -> String {
    "pricelists".to_string()
}

fn default_http_timeout_secs() -> u64 {
    20
}

fn default_vero_url() -> String {
    crate::extract::web::VERO_URL.to_string()
}

fn default_stokomak_url() -> String {
    crate::extract::web::STOKOMAK_URL.to_string()
}

impl Default for Sources {
    fn default() -> Self {
        Self {
            vero_url: default_vero_url(),
            stokomak_url: default_stokomak_url(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load the config file if present, otherwise run on defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            info!(path = %path.display(), "no config file — using defaults");
            Ok(toml::from_str("")?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.db_path, "pricestore/products.db");
        assert_eq!(cfg.http_timeout_secs, 20);
        assert!(cfg.sources.vero_url.contains("vero"));
    }

    #[test]
    fn partial_config_overrides_only_named_fields() {
        let cfg: Config = toml::from_str(
            "db_path = \"/tmp/p.db\"\n[sources]\nvero_url = \"http://localhost/vero\"\n",
        )
        .unwrap();
        assert_eq!(cfg.db_path, "/tmp/p.db");
        assert_eq!(cfg.sources.vero_url, "http://localhost/vero");
        assert!(cfg.sources.stokomak_url.contains("stokomak"));
    }
}
