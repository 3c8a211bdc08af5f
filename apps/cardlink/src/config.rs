//! Configuration loading with env-var overrides.
//!
//! Reads `cardlink.toml` from the current working directory when present
//! (or the file passed with `--config`, which must exist), then applies the
//! `CARDLINK_LOG_FORMAT` override. Every field has a default, so running
//! without a config file is the normal case.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use cardlink_core::{Scope, Slot, Visibility, primitives::LINKS_KEY};
use serde::Deserialize;

use crate::error::AppError;

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "cardlink.toml";

/// Database file used when neither the config nor `--database` names one.
pub const DEFAULT_DATABASE: &str = "cardlink.db";

/// Filter used when `RUST_LOG` is unset and the config names none.
pub const DEFAULT_LOG_FILTER: &str = "cardlink=info,cardlink_core=info";

/// Where the links slot is stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// A redb file on disk.
    #[default]
    Redb,
    /// A throwaway in-process store.
    Memory,
}

impl Backend {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Redb => "redb",
            Self::Memory => "memory",
        }
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(AppError::Config(format!("unknown log format '{other}'"))),
        }
    }
}

/// `[store]` section, resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: Backend,
    pub path: PathBuf,
    pub slot: Slot,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            path: PathBuf::from(DEFAULT_DATABASE),
            slot: Slot::default(),
        }
    }
}

impl StoreConfig {
    /// Apply command-line overrides on top of file values.
    pub fn apply_overrides(&mut self, path: Option<PathBuf>, backend: Option<Backend>) {
        if let Some(path) = path {
            self.path = path;
        }
        if let Some(backend) = backend {
            self.backend = backend;
        }
    }
}

/// `[logging]` section, resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Fully-resolved configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

// ── raw TOML shape ────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    store: RawStore,
    #[serde(default)]
    logging: RawLogging,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStore {
    #[serde(default)]
    backend: Backend,
    path: Option<PathBuf>,
    #[serde(default = "default_scope")]
    scope: Scope,
    #[serde(default = "default_visibility")]
    visibility: Visibility,
    #[serde(default = "default_key")]
    key: String,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawLogging {
    #[serde(default)]
    format: LogFormat,
    filter: Option<String>,
}

impl Default for RawStore {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            path: None,
            scope: default_scope(),
            visibility: default_visibility(),
            key: default_key(),
        }
    }
}

fn default_scope() -> Scope {
    Scope::Board
}

fn default_visibility() -> Visibility {
    Visibility::Shared
}

fn default_key() -> String {
    LINKS_KEY.to_string()
}

// ── loading ───────────────────────────────────────────────────────────────────

/// Load the explicit config file, or `cardlink.toml` if it exists, then
/// apply env-var overrides.
pub fn load(explicit: Option<&Path>) -> Result<Config, AppError> {
    let format_override = env::var("CARDLINK_LOG_FORMAT").ok();

    match explicit {
        Some(path) => load_from(path, format_override.as_deref()),
        None => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            if path.exists() {
                load_from(path, format_override.as_deref())
            } else {
                from_toml("", format_override.as_deref())
            }
        }
    }
}

/// Load one config file. Tests pass overrides directly instead of mutating
/// env vars.
pub fn load_from(path: &Path, format_override: Option<&str>) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
    from_toml(&raw, format_override)
        .map_err(|e| AppError::Config(format!("{e} (in {})", path.display())))
}

/// Parse a TOML document into a resolved config.
pub fn from_toml(raw: &str, format_override: Option<&str>) -> Result<Config, AppError> {
    let parsed: RawConfig =
        toml::from_str(raw).map_err(|e| AppError::Config(format!("parse error: {e}")))?;

    let key = parsed.store.key.trim().to_string();
    if key.is_empty() {
        return Err(AppError::Config("store.key must not be empty".into()));
    }

    let format = match format_override {
        Some(value) => value.parse()?,
        None => parsed.logging.format,
    };

    Ok(Config {
        store: StoreConfig {
            backend: parsed.store.backend,
            path: parsed
                .store
                .path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
            slot: Slot::new(parsed.store.scope, parsed.store.visibility, key),
        },
        logging: LoggingConfig {
            format,
            filter: parsed
                .logging
                .filter
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().expect("temp file");
        f.write_all(content.as_bytes()).expect("write");
        f
    }

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = from_toml("", None).expect("parse");
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.store.slot.path(), "board/shared/card-links");
    }

    #[test]
    fn parse_full_config() {
        let f = write_toml(
            r#"
[store]
backend = "memory"
path = "/tmp/links.db"
scope = "card"
visibility = "private"
key = "links-v2"

[logging]
format = "json"
filter = "cardlink_core=debug"
"#,
        );
        let cfg = load_from(f.path(), None).expect("load");
        assert_eq!(cfg.store.backend, Backend::Memory);
        assert_eq!(cfg.store.path, PathBuf::from("/tmp/links.db"));
        assert_eq!(cfg.store.slot.path(), "card/private/links-v2");
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(cfg.logging.filter, "cardlink_core=debug");
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(Path::new("/nonexistent/cardlink.toml"), None);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn unknown_backend_rejected() {
        let result = from_toml("[store]\nbackend = \"postgres\"\n", None);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn unknown_field_rejected() {
        let result = from_toml("[store]\nbakend = \"redb\"\n", None);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn empty_key_rejected() {
        let result = from_toml("[store]\nkey = \"  \"\n", None);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn env_log_format_override() {
        let cfg = from_toml("[logging]\nformat = \"text\"\n", Some("json")).expect("parse");
        assert_eq!(cfg.logging.format, LogFormat::Json);

        let bad = from_toml("", Some("yaml"));
        assert!(matches!(bad, Err(AppError::Config(_))));
    }

    #[test]
    fn cli_overrides_win() {
        let mut store = from_toml("[store]\npath = \"file.db\"\n", None)
            .expect("parse")
            .store;
        store.apply_overrides(Some(PathBuf::from("flag.db")), Some(Backend::Memory));
        assert_eq!(store.path, PathBuf::from("flag.db"));
        assert_eq!(store.backend, Backend::Memory);

        store.apply_overrides(None, None);
        assert_eq!(store.path, PathBuf::from("flag.db"));
    }
}
