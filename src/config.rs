// src/config.rs

use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarketConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    // Quotes are rounded to a multiple of this
    pub price_tick: Decimal,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct UniverseConfig {
    /// JSON array or CSV file of tradable symbols. None = any symbol.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub file_prefix: String,
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub market: MarketConfig,
    #[serde(default)]
    pub universe: UniverseConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Defaults, then an optional `Settings.{toml,yaml,json}`, then `APP__*`
    /// environment variables (e.g. `APP__STORE__PATH`).
    pub fn new() -> Result<Self, ConfigError> {
        Self::build(File::with_name("Settings").required(false))
    }

    fn build(settings: File<config::FileSourceFile, config::FileFormat>) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("store.path", "accounts.json")?
            .set_default("market.base_url", "https://query1.finance.yahoo.com")?
            .set_default("market.timeout_secs", 10)?
            .set_default(
                "market.user_agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
            )?
            .set_default("market.price_tick", "0.0001")?
            .set_default("logging.dir", "logs")?
            .set_default("logging.file_prefix", "paper_desk.log")?
            .set_default("logging.level", "info")?
            .add_source(settings)
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__"),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::str::FromStr;

    #[test]
    fn defaults_apply_without_settings_file() {
        let cfg = AppConfig::build(File::with_name("does-not-exist").required(false)).unwrap();
        assert_eq!(cfg.store.path, PathBuf::from("accounts.json"));
        assert_eq!(cfg.market.timeout_secs, 10);
        assert_eq!(cfg.market.price_tick, Decimal::from_str("0.0001").unwrap());
        assert!(cfg.universe.path.is_none());
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn settings_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Settings.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            "[store]\npath = \"data/users.json\"\n\n[universe]\npath = \"stock_list.txt\"\n\n[market]\ntimeout_secs = 3"
        )
        .unwrap();

        let cfg = AppConfig::build(File::from(path.as_path())).unwrap();
        assert_eq!(cfg.store.path, PathBuf::from("data/users.json"));
        assert_eq!(cfg.universe.path, Some(PathBuf::from("stock_list.txt")));
        assert_eq!(cfg.market.timeout_secs, 3);
        assert_eq!(cfg.market.base_url, "https://query1.finance.yahoo.com");
    }
}
