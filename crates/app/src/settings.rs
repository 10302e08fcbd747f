//! Handles settings for the application.
//!
//! Values are layered: built-in defaults, then the TOML file
//! (`config/dompet.toml` or `--config <path>`), then `DOMPET__*` environment
//! variables (`DOMPET__SERVER__PORT=8080`).

use std::path::PathBuf;

use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG: &str = "config/dompet";

pub const DEFAULT_CATEGORIES: [&str; 12] = [
    "Entertainment",
    "Food",
    "Transportation",
    "Investment",
    "Salary",
    "Gift",
    "Clothing",
    "Health",
    "Bills",
    "Shopping",
    "Bonus",
    "Other",
];

#[derive(Parser, Debug)]
#[command(name = "dompet")]
#[command(about = "Personal finance tracker with budget plans")]
pub struct Cli {
    /// Configuration file. Without it `config/dompet.toml` is used if present.
    #[arg(long, env = "DOMPET_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct Categories {
    pub defaults: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub database: Database,
    pub categories: Categories,
}

impl Settings {
    pub fn new(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => File::from(path.as_path()).required(true),
            None => File::with_name(DEFAULT_CONFIG).required(false),
        };
        Self::builder()?
            .add_source(file)
            .add_source(Environment::with_prefix("DOMPET").separator("__"))
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("app.level", "info")?
            .set_default("server.bind", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("database.sqlite", "dompet.db")?
            .set_default(
                "categories.defaults",
                DEFAULT_CATEGORIES
                    .iter()
                    .map(|name| name.to_string())
                    .collect::<Vec<_>>(),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Settings {
        Settings::builder()
            .unwrap()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn defaults_apply_without_file() {
        let settings = from_toml("");
        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.server.bind, "127.0.0.1");
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.database, Database::Sqlite("dompet.db".to_string()));
        assert_eq!(settings.categories.defaults.len(), DEFAULT_CATEGORIES.len());
    }

    #[test]
    fn file_overrides_defaults() {
        let settings = from_toml(
            r#"
            [app]
            level = "debug"

            [server]
            port = 8080

            [categories]
            defaults = ["Food", "Rent"]
            "#,
        );
        assert_eq!(settings.app.level, "debug");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.bind, "127.0.0.1");
        assert_eq!(settings.categories.defaults, vec!["Food", "Rent"]);
    }

    #[test]
    fn memory_database() {
        let settings = from_toml(r#"database = "memory""#);
        assert_eq!(settings.database, Database::Memory);
    }

    #[test]
    fn sqlite_database_path() {
        let settings = from_toml(
            r#"
            [database]
            sqlite = "/var/lib/dompet/data.db"
            "#,
        );
        assert_eq!(
            settings.database,
            Database::Sqlite("/var/lib/dompet/data.db".to_string())
        );
    }
}
