//! Layered configuration.
//!
//! Built-in defaults are overlaid with an optional file (TOML, YAML or JSON,
//! picked by extension) and then with `PICKLELIT_*` environment variables.
//! Nested keys use a double underscore: `PICKLELIT_HTTP__TIMEOUT_SECS=5`.

pub mod error;

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{ErrorKind, Result};

pub const ENV_PREFIX: &str = "PICKLELIT_";
const CONFIG_FILE_NAME: &str = "config.toml";
const DATABASE_FILE_NAME: &str = "catalog.sqlite3";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file; the platform data directory when unset
    pub database: Option<PathBuf>,
    pub http: HttpConfig,
    pub sources: SourcesConfig,
    pub staleness: StalenessConfig,
    pub discover: DiscoverConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Pause between consecutive requests to the same source
    pub request_delay_ms: u64,
}
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("picklelit/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 10,
            request_delay_ms: 500,
        }
    }
}
impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub google_books: String,
    pub open_library: String,
    pub audible_api: String,
    pub audible_site: String,
}
impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            google_books: "https://www.googleapis.com/books/v1".to_string(),
            open_library: "https://openlibrary.org".to_string(),
            audible_api: "https://api.audible.com".to_string(),
            audible_site: "https://www.audible.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StalenessConfig {
    /// Re-fetch book metadata older than this many days
    pub metadata_days: u32,
    /// Re-check audiobook availability older than this many days
    pub audio_days: u32,
}
impl Default for StalenessConfig {
    fn default() -> Self {
        Self {
            metadata_days: 30,
            audio_days: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverConfig {
    pub subject: String,
    pub pages: u32,
    pub page_size: u32,
    pub editions_limit: u32,
    pub year_from: i32,
    pub year_to: i32,
}
impl Default for DiscoverConfig {
    fn default() -> Self {
        Self {
            subject: "romance".to_string(),
            pages: 2,
            page_size: 50,
            editions_limit: 10,
            year_from: 2005,
            year_to: 2025,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location if it
    /// exists. An explicitly given path must exist.
    #[instrument(level = "debug")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path().ok().filter(|p| p.is_file()),
        };
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = &file {
            tracing::debug!(path = %file.display(), "reading configuration file");
            figment = match file.extension().and_then(|e| e.to_str()) {
                Some("yaml" | "yml") => figment.merge(Yaml::file_exact(file)),
                Some("json") => figment.merge(Json::file_exact(file)),
                _ => figment.merge(Toml::file_exact(file)),
            };
        }
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.http.timeout_secs == 0 {
            exn::bail!(ErrorKind::Invalid("http.timeout_secs must be greater than zero"));
        }
        if self.http.user_agent.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("http.user_agent must not be empty"));
        }
        let sources = &self.sources;
        for url in [&sources.google_books, &sources.open_library, &sources.audible_api, &sources.audible_site] {
            if url.trim().is_empty() {
                exn::bail!(ErrorKind::Invalid("source URLs must not be empty"));
            }
        }
        if !(1..=1000).contains(&self.discover.page_size) {
            exn::bail!(ErrorKind::Invalid("discover.page_size must be between 1 and 1000"));
        }
        if self.discover.year_from > self.discover.year_to {
            exn::bail!(ErrorKind::Invalid("discover.year_from must not be after discover.year_to"));
        }
        if self.discover.subject.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("discover.subject must not be empty"));
        }
        Ok(())
    }

    /// The configured database path, or `catalog.sqlite3` in the platform
    /// data directory.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join(DATABASE_FILE_NAME)),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "picklelit").ok_or_raise(|| ErrorKind::NoHomeDir)
}

/// `config.toml` in the platform configuration directory.
pub fn default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.staleness.metadata_days, 30);
        assert_eq!(config.discover.subject, "romance");
        assert_eq!(config.http.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_load_toml_overrides_defaults() {
        let file = write_config(
            ".toml",
            r#"
            database = "/tmp/books.sqlite3"

            [staleness]
            audio_days = 7

            [discover]
            pages = 5
            "#,
        );
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.database, Some(PathBuf::from("/tmp/books.sqlite3")));
        assert_eq!(config.staleness.audio_days, 7);
        assert_eq!(config.staleness.metadata_days, 30);
        assert_eq!(config.discover.pages, 5);
        assert_eq!(config.discover.page_size, 50);
    }

    #[rstest]
    #[case(".yaml", "http:\n  timeout_secs: 3\n")]
    #[case(".json", r#"{"http": {"timeout_secs": 3}}"#)]
    fn test_load_by_extension(#[case] suffix: &str, #[case] contents: &str) {
        let file = write_config(suffix, contents);
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.http.timeout_secs, 3);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert_eq!(*err, ErrorKind::Load);
    }

    #[rstest]
    #[case(r#"http = { timeout_secs = 0 }"#)]
    #[case(r#"discover = { page_size = 0 }"#)]
    #[case(r#"discover = { year_from = 2020, year_to = 2010 }"#)]
    #[case(r#"sources = { google_books = " " }"#)]
    fn test_invalid_values(#[case] toml: &str) {
        let figment = Figment::from(Serialized::defaults(Config::default())).merge(Toml::string(toml));
        let err = Config::from_figment(figment).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }

    #[test]
    fn test_environment_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[http]\ntimeout_secs = 3\n")?;
            jail.set_env("PICKLELIT_HTTP__TIMEOUT_SECS", "7");
            let config = Config::load(Some(Path::new("config.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.http.timeout_secs, 7);
            Ok(())
        });
    }
}
