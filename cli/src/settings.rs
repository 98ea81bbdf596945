//! Layered configuration: built-in defaults, then an optional TOML file,
//! then `LOGBOOK__SECTION__KEY` environment variables.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub prefix: String,
    /// Where an unauthenticated dashboard request redirects to.
    pub login_location: String,
}

/// Cookies are persisted here between runs so an admin login survives.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SessionConfig {
    pub file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:8000".to_string(),
                prefix: "/api".to_string(),
                login_location: "/adminLogin".to_string(),
            },
            session: SessionConfig {
                file: PathBuf::from(".logbook-session.json"),
            },
            logging: LoggingConfig {
                level: "warn".to_string(),
            },
        }
    }
}

impl Settings {
    /// Load settings. An explicit `path` must exist; otherwise `logbook.toml`
    /// in the working directory is read when present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("api.base_url", defaults.api.base_url)?
            .set_default("api.prefix", defaults.api.prefix)?
            .set_default("api.login_location", defaults.api.login_location)?
            .set_default("session.file", defaults.session.file.to_string_lossy().into_owned())?
            .set_default("logging.level", defaults.logging.level)?;

        builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name("logbook").required(false)),
        };

        builder
            .add_source(Environment::with_prefix("LOGBOOK").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serial_test::serial;

    use super::*;

    /// Sets an environment variable for the lifetime of the guard.
    struct EnvVar(&'static str);

    impl EnvVar {
        fn set(name: &'static str, value: &str) -> Self {
            std::env::set_var(name, value);
            Self(name)
        }
    }

    impl Drop for EnvVar {
        fn drop(&mut self) {
            std::env::remove_var(self.0);
        }
    }

    #[test]
    #[serial]
    fn file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[api]\nbase_url = \"https://logbook.example.org\"\n\n[logging]\nlevel = \"debug\""
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();

        assert_eq!(settings.api.base_url, "https://logbook.example.org");
        assert_eq!(settings.api.prefix, "/api");
        assert_eq!(settings.api.login_location, "/adminLogin");
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.session.file, PathBuf::from(".logbook-session.json"));
    }

    #[test]
    #[serial]
    fn environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[api]\nbase_url = \"https://file.example.org\"\nprefix = \"/v2\"").unwrap();
        let _url = EnvVar::set("LOGBOOK__API__BASE_URL", "https://env.example.org");
        let _level = EnvVar::set("LOGBOOK__LOGGING__LEVEL", "trace");

        let settings = Settings::load(Some(file.path())).unwrap();

        assert_eq!(settings.api.base_url, "https://env.example.org");
        assert_eq!(settings.api.prefix, "/v2");
        assert_eq!(settings.logging.level, "trace");
    }

    #[test]
    #[serial]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(Settings::load(Some(&missing)).is_err());
    }
}
