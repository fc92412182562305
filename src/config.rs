use crate::error::ConfigError;
use serde_derive::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;
use std::path::Path;
use std::{env, fmt, fs};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_DATABASE: &str = "saas_analytics_demo";
pub const DEFAULT_USER: &str = "saas_user";
pub const DEFAULT_PASSWORD: &str = "demo_password";

/// Connection parameters for the analytics database.
///
/// Resolution order: built-in defaults, then the `[database]` table of the
/// config file, then the libpq-style environment variables
/// (`PGHOST`, `PGPORT`, `PGDATABASE`, `PGUSER`, `PGPASSWORD`).
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            database: DEFAULT_DATABASE.into(),
            user: DEFAULT_USER.into(),
            password: DEFAULT_PASSWORD.into(),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"********")
            .finish()
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env()
    }

    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_lookup(|key| env::var(key).ok())
    }

    pub fn with_lookup<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("PGHOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PGPORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort { value: port })?;
        }
        if let Some(database) = lookup("PGDATABASE") {
            self.database = database;
        }
        if let Some(user) = lookup("PGUSER") {
            self.user = user;
        }
        if let Some(password) = lookup("PGPASSWORD") {
            self.password = password;
        }

        Ok(self)
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
            .application_name("saas-report")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Exit non-zero when any report section failed to compute.
    pub fail_on_query_error: bool,
}

/// Contents of the optional `--config` TOML file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub report: ReportSettings,
}

impl Settings {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads the config file when one is given and applies environment
    /// overrides on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path,
            None => {
                return Ok(Self {
                    database: DatabaseConfig::from_env()?,
                    report: ReportSettings::default(),
                })
            }
        };

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml(&content)?;

        Ok(Self {
            database: settings.database.with_env()?,
            report: settings.report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let cfg = DatabaseConfig::default().with_lookup(lookup_from(&[])).unwrap();

        assert_eq!(cfg.host, "localhost");
        assert_eq!(cfg.port, 5432);
        assert_eq!(cfg.database, "saas_analytics_demo");
        assert_eq!(cfg.user, "saas_user");
        assert_eq!(cfg.password, "demo_password");
    }

    #[test]
    fn test_environment_overrides() {
        let cfg = DatabaseConfig::default()
            .with_lookup(lookup_from(&[("PGHOST", "db.internal"), ("PGPORT", "6543")]))
            .unwrap();

        assert_eq!(cfg.host, "db.internal");
        assert_eq!(cfg.port, 6543);
        assert_eq!(cfg.user, "saas_user");
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = DatabaseConfig::default().with_lookup(lookup_from(&[("PGPORT", "five")]));

        assert!(matches!(result, Err(ConfigError::InvalidPort { value }) if value == "five"));
    }

    #[test]
    fn test_debug_masks_password() {
        let rendered = format!("{:?}", DatabaseConfig::default());

        assert!(!rendered.contains("demo_password"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml(
            r#"
            [database]
            host = "analytics.example.com"

            [report]
            fail_on_query_error = true
            "#,
        )
        .unwrap();

        assert_eq!(settings.database.host, "analytics.example.com");
        assert_eq!(settings.database.port, DEFAULT_PORT);
        assert!(settings.report.fail_on_query_error);
    }

    #[test]
    fn test_load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[report]\nfail_on_query_error = true").unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();

        assert!(settings.report.fail_on_query_error);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Settings::load(Some(Path::new("/nonexistent/saas-report.toml")));

        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
