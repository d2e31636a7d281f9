use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hivetower", about = "Read-only REST API over a hive database")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Path to the SQLite database written by the indexer
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Create the hive tables if they are missing, then serve
    #[arg(long)]
    pub init_schema: bool,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub pagination: PaginationConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Absolute base for pagination links, e.g. `https://api.example.com`.
    pub public_url: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
    pub pool_size: u32,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_limit: i64,
    pub max_limit: i64,
    pub post_cache_default_limit: i64,
    pub post_cache_max_limit: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            public_url: None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            pool_size: 8,
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
            post_cache_default_limit: 5,
            post_cache_max_limit: 10,
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }
        if let Some(ref path) = cli.database {
            config.database.path = Some(path.clone());
        }

        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("hive.db"));
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".hivetower")
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("hive.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(data_dir: Option<PathBuf>) -> Cli {
        Cli {
            config: None,
            host: None,
            port: None,
            data_dir,
            database: None,
            init_schema: false,
        }
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert!(config.server.public_url.is_none());
        assert!(config.database.path.is_none());
        assert_eq!(config.database.pool_size, 8);
        assert_eq!(config.pagination.default_limit, 20);
        assert_eq!(config.pagination.max_limit, 100);
        assert_eq!(config.pagination.post_cache_default_limit, 5);
        assert_eq!(config.pagination.post_cache_max_limit, 10);
    }

    #[test]
    fn data_dir_uses_cli_override() {
        let cli = cli(Some(PathBuf::from("/tmp/test-hivetower")));
        assert_eq!(Config::data_dir(&cli), PathBuf::from("/tmp/test-hivetower"));
    }

    #[test]
    fn data_dir_defaults_to_dot_hivetower() {
        assert!(Config::data_dir(&cli(None)).ends_with(".hivetower"));
    }

    #[test]
    fn load_with_no_config_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load(&cli(Some(tmp.path().to_path_buf()))).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.db_path(), tmp.path().join("hive.db"));
    }

    #[test]
    fn load_reads_toml_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
port = 9000
public_url = "https://api.example.com"

[database]
path = "/var/lib/hive/hive.db"

[pagination]
post_cache_default_limit = 3
"#,
        )
        .unwrap();

        let mut cli = cli(Some(tmp.path().to_path_buf()));
        cli.config = Some(config_path);
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(
            config.server.public_url.as_deref(),
            Some("https://api.example.com")
        );
        assert_eq!(config.db_path(), PathBuf::from("/var/lib/hive/hive.db"));
        assert_eq!(config.pagination.post_cache_default_limit, 3);
        assert_eq!(config.pagination.max_limit, 100);
    }

    #[test]
    fn cli_overrides_beat_toml_values() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
host = "192.168.1.1"
port = 9000

[database]
path = "/from/toml.db"
"#,
        )
        .unwrap();

        let mut cli = cli(Some(tmp.path().to_path_buf()));
        cli.config = Some(config_path);
        cli.host = Some("10.0.0.1".to_string());
        cli.port = Some(4000);
        cli.database = Some(PathBuf::from("/from/cli.db"));
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.host, "10.0.0.1");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.db_path(), PathBuf::from("/from/cli.db"));
    }
}
