//! Layered configuration for craic.
//!
//! Settings come from `craic.toml`, then environment variables (a `.env`
//! file is loaded by the binary first), then CLI flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! [places]
//! api_key = "..."            # or CRAIC_PLACES_API_KEY / GOOGLE_MAPS_API_KEY
//! radius_m = 5000
//!
//! [store]
//! backend = "sqlite"         # memory | sqlite | firestore
//! path = "/var/lib/craic/checkins.db"
//! collection = "pub_checkins"
//! firestore_project = "wheres-the-craic"
//!
//! [location]
//! default_lat = 53.3498
//! default_lng = -6.2603
//! ```
//!
//! The config file is looked up at `--config`, then `./craic.toml`, then
//! `<config dir>/craic/craic.toml`. Secrets for Firestore are read only from
//! the environment (`CRAIC_FIRESTORE_TOKEN`, `CRAIC_FIRESTORE_API_KEY`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::checkin::COLLECTION;
use crate::geo::Coordinate;
use crate::places::{self, PlacesClient};
use crate::store::{self, CheckInStore, FirestoreStore, MemoryStore, SqliteStore};

pub const CONFIG_FILE_NAME: &str = "craic.toml";

/// Which document store backs check-ins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process only; forgotten when the process exits
    Memory,
    /// Local SQLite file (default)
    #[default]
    Sqlite,
    /// Cloud Firestore over REST
    Firestore,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::Sqlite => write!(f, "sqlite"),
            StoreBackend::Firestore => write!(f, "firestore"),
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "sqlite" => Ok(StoreBackend::Sqlite),
            "firestore" => Ok(StoreBackend::Firestore),
            _ => anyhow::bail!(
                "Invalid store backend '{}'. Valid values: memory, sqlite, firestore",
                s
            ),
        }
    }
}

/// Places provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacesSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_places_base_url")]
    pub base_url: String,
    /// Nearby search radius in metres
    #[serde(default = "default_radius_m")]
    pub radius_m: u32,
}

fn default_places_base_url() -> String {
    places::DEFAULT_BASE_URL.to_string()
}

fn default_radius_m() -> u32 {
    places::DEFAULT_RADIUS_M
}

impl Default for PlacesSection {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_places_base_url(),
            radius_m: default_radius_m(),
        }
    }
}

/// Check-in store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSection {
    #[serde(default)]
    pub backend: StoreBackend,
    /// SQLite file (defaults to the user data dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firestore_project: Option<String>,
    #[serde(default = "default_firestore_base_url")]
    pub firestore_base_url: String,
}

fn default_collection() -> String {
    COLLECTION.to_string()
}

fn default_firestore_base_url() -> String {
    store::firestore::DEFAULT_BASE_URL.to_string()
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: None,
            collection: default_collection(),
            firestore_project: None,
            firestore_base_url: default_firestore_base_url(),
        }
    }
}

/// Fallback position used when the device location is unknown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSection {
    #[serde(default = "default_lat")]
    pub default_lat: f64,
    #[serde(default = "default_lng")]
    pub default_lng: f64,
}

fn default_lat() -> f64 {
    Coordinate::DUBLIN.lat
}

fn default_lng() -> f64 {
    Coordinate::DUBLIN.lng
}

impl Default for LocationSection {
    fn default() -> Self {
        Self {
            default_lat: default_lat(),
            default_lng: default_lng(),
        }
    }
}

/// Contents of `craic.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CraicToml {
    #[serde(default)]
    pub places: PlacesSection,
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub location: LocationSection,
}

impl CraicToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse craic.toml")
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize craic.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.places.radius_m == 0 || self.places.radius_m > 50_000 {
            warnings.push(format!(
                "Invalid places.radius_m {}: must be between 1 and 50000",
                self.places.radius_m
            ));
        }
        if !self.default_position().is_valid() {
            warnings.push(format!(
                "Invalid default location ({}, {})",
                self.location.default_lat, self.location.default_lng
            ));
        }
        if self.store.collection.trim().is_empty() || self.store.collection.contains('/') {
            warnings.push(format!(
                "Invalid store.collection '{}'",
                self.store.collection
            ));
        }
        if self.store.backend == StoreBackend::Firestore && self.store.firestore_project.is_none()
        {
            warnings.push(
                "store.backend is 'firestore' but no firestore_project is set".to_string(),
            );
        }

        warnings
    }

    pub fn default_position(&self) -> Coordinate {
        Coordinate::new(self.location.default_lat, self.location.default_lng)
    }
}

/// Values read from the environment.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub places_api_key: Option<String>,
    pub store_backend: Option<String>,
    pub db_path: Option<PathBuf>,
    pub firestore_project: Option<String>,
    pub firestore_token: Option<String>,
    pub firestore_api_key: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            places_api_key: get("CRAIC_PLACES_API_KEY").or_else(|| get("GOOGLE_MAPS_API_KEY")),
            store_backend: get("CRAIC_STORE"),
            db_path: get("CRAIC_DB_PATH").map(PathBuf::from),
            firestore_project: get("CRAIC_FIRESTORE_PROJECT"),
            firestore_token: get("CRAIC_FIRESTORE_TOKEN"),
            firestore_api_key: get("CRAIC_FIRESTORE_API_KEY"),
        }
    }
}

/// Effective configuration: file, then environment, then CLI.
#[derive(Debug, Clone)]
pub struct CraicConfig {
    /// File the settings were read from, if any
    pub config_path: Option<PathBuf>,
    pub toml: CraicToml,
    pub env: EnvOverrides,
    /// CLI override for the store backend
    pub cli_store: Option<StoreBackend>,
}

impl CraicConfig {
    /// Locate and load the config file, then apply the process environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config_path = match explicit {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                Some(path.to_path_buf())
            }
            None => Self::discover_config_file(),
        };
        let toml = match &config_path {
            Some(path) => CraicToml::load(path)?,
            None => CraicToml::default(),
        };
        Ok(Self {
            config_path,
            toml,
            env: EnvOverrides::from_env(),
            cli_store: None,
        })
    }

    pub fn from_parts(toml: CraicToml, env: EnvOverrides) -> Self {
        Self {
            config_path: None,
            toml,
            env,
            cli_store: None,
        }
    }

    pub fn with_cli_store(mut self, backend: Option<StoreBackend>) -> Self {
        self.cli_store = backend;
        self
    }

    fn discover_config_file() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("craic").join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }

    /// Store backend (CLI → env → file).
    pub fn store_backend(&self) -> Result<StoreBackend> {
        if let Some(backend) = self.cli_store {
            return Ok(backend);
        }
        match &self.env.store_backend {
            Some(value) => value.parse().context("Invalid CRAIC_STORE"),
            None => Ok(self.toml.store.backend),
        }
    }

    /// SQLite path (env → file → user data dir).
    pub fn db_path(&self) -> PathBuf {
        self.env
            .db_path
            .clone()
            .or_else(|| self.toml.store.path.clone())
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join("craic").join("checkins.db")))
            .unwrap_or_else(|| PathBuf::from(".craic/checkins.db"))
    }

    /// Places API key (env → file).
    pub fn places_api_key(&self) -> Option<String> {
        self.env
            .places_api_key
            .clone()
            .or_else(|| self.toml.places.api_key.clone())
    }

    pub fn firestore_project(&self) -> Option<String> {
        self.env
            .firestore_project
            .clone()
            .or_else(|| self.toml.store.firestore_project.clone())
    }

    pub fn radius_m(&self) -> u32 {
        self.toml.places.radius_m
    }

    pub fn default_position(&self) -> Coordinate {
        self.toml.default_position()
    }

    pub fn validate(&self) -> Vec<String> {
        let mut warnings = self.toml.validate();
        if let Some(value) = &self.env.store_backend
            && value.parse::<StoreBackend>().is_err()
        {
            warnings.push(format!("Invalid CRAIC_STORE '{}'", value));
        }
        warnings
    }

    pub fn places_client(&self) -> Result<PlacesClient> {
        let key = self.places_api_key().context(
            "No places API key. Set CRAIC_PLACES_API_KEY or places.api_key in craic.toml",
        )?;
        Ok(PlacesClient::new(key)?.with_base_url(self.toml.places.base_url.clone()))
    }

    /// Open the configured check-in store.
    pub fn open_store(&self) -> Result<Arc<dyn CheckInStore>> {
        let collection = self.toml.store.collection.as_str();
        let store: Arc<dyn CheckInStore> = match self.store_backend()? {
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
            StoreBackend::Sqlite => Arc::new(SqliteStore::open(&self.db_path(), collection)?),
            StoreBackend::Firestore => {
                let project = self.firestore_project().context(
                    "Firestore backend needs a project. Set CRAIC_FIRESTORE_PROJECT or store.firestore_project",
                )?;
                Arc::new(
                    FirestoreStore::new(project, collection)
                        .with_base_url(self.toml.store.firestore_base_url.clone())
                        .with_bearer_token(self.env.firestore_token.clone())
                        .with_api_key(self.env.firestore_api_key.clone()),
                )
            }
        };
        tracing::debug!(backend = store.backend_name(), "opened check-in store");
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> EnvOverrides {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvOverrides::from_lookup(|key| map.get(key).cloned())
    }

    // =========================================
    // StoreBackend tests
    // =========================================

    #[test]
    fn test_store_backend_display_and_parse() {
        for backend in [StoreBackend::Memory, StoreBackend::Sqlite, StoreBackend::Firestore] {
            assert_eq!(backend.to_string().parse::<StoreBackend>().unwrap(), backend);
        }
        assert_eq!("SQLite".parse::<StoreBackend>().unwrap(), StoreBackend::Sqlite);
        let err = "redis".parse::<StoreBackend>().unwrap_err();
        assert!(err.to_string().contains("Invalid store backend"));
    }

    // =========================================
    // CraicToml parsing tests
    // =========================================

    #[test]
    fn test_parse_empty_uses_defaults() {
        let toml = CraicToml::parse("").unwrap();
        assert_eq!(toml.places.radius_m, 5000);
        assert_eq!(toml.store.backend, StoreBackend::Sqlite);
        assert_eq!(toml.store.collection, "pub_checkins");
        assert_eq!(toml.default_position(), Coordinate::DUBLIN);
        assert!(toml.validate().is_empty());
    }

    #[test]
    fn test_parse_all_sections() {
        let content = r#"
[places]
api_key = "file-key"
radius_m = 1500

[store]
backend = "firestore"
collection = "checkins_dev"
firestore_project = "craic-dev"

[location]
default_lat = 51.8985
default_lng = -8.4756
"#;
        let toml = CraicToml::parse(content).unwrap();
        assert_eq!(toml.places.api_key.as_deref(), Some("file-key"));
        assert_eq!(toml.places.radius_m, 1500);
        assert_eq!(toml.store.backend, StoreBackend::Firestore);
        assert_eq!(toml.store.collection, "checkins_dev");
        assert_eq!(toml.default_position(), Coordinate::new(51.8985, -8.4756));
        assert!(toml.validate().is_empty());
    }

    #[test]
    fn test_parse_rejects_unknown_backend() {
        assert!(CraicToml::parse("[store]\nbackend = \"redis\"").is_err());
    }

    #[test]
    fn test_validate_reports_problems() {
        let toml = CraicToml::parse(
            r#"
[places]
radius_m = 0

[store]
backend = "firestore"
collection = "a/b"

[location]
default_lat = 200.0
"#,
        )
        .unwrap();
        let warnings = toml.validate();
        assert_eq!(warnings.len(), 4, "{warnings:?}");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut toml = CraicToml::default();
        toml.places.radius_m = 2500;
        toml.save(&path).unwrap();
        let loaded = CraicToml::load(&path).unwrap();
        assert_eq!(loaded.places.radius_m, 2500);
    }

    // =========================================
    // Layering tests
    // =========================================

    #[test]
    fn test_env_overrides_file_and_cli_overrides_env() {
        let toml = CraicToml::parse("[places]\napi_key = \"file-key\"").unwrap();
        let config = CraicConfig::from_parts(
            toml,
            env(&[("CRAIC_PLACES_API_KEY", "env-key"), ("CRAIC_STORE", "memory")]),
        );
        assert_eq!(config.places_api_key().as_deref(), Some("env-key"));
        assert_eq!(config.store_backend().unwrap(), StoreBackend::Memory);

        let config = config.with_cli_store(Some(StoreBackend::Sqlite));
        assert_eq!(config.store_backend().unwrap(), StoreBackend::Sqlite);
    }

    #[test]
    fn test_google_maps_key_is_a_fallback() {
        let overrides = env(&[("GOOGLE_MAPS_API_KEY", "maps-key")]);
        assert_eq!(overrides.places_api_key.as_deref(), Some("maps-key"));
        let both = env(&[("GOOGLE_MAPS_API_KEY", "maps-key"), ("CRAIC_PLACES_API_KEY", "craic")]);
        assert_eq!(both.places_api_key.as_deref(), Some("craic"));
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let overrides = env(&[("CRAIC_STORE", "  ")]);
        assert!(overrides.store_backend.is_none());
    }

    #[test]
    fn test_invalid_env_backend_is_an_error_and_a_warning() {
        let config = CraicConfig::from_parts(CraicToml::default(), env(&[("CRAIC_STORE", "redis")]));
        assert!(config.store_backend().is_err());
        assert_eq!(config.validate().len(), 1);
    }

    #[test]
    fn test_db_path_env_wins() {
        let toml = CraicToml::parse("[store]\npath = \"/from/file.db\"").unwrap();
        let config = CraicConfig::from_parts(toml.clone(), env(&[("CRAIC_DB_PATH", "/from/env.db")]));
        assert_eq!(config.db_path(), PathBuf::from("/from/env.db"));
        let config = CraicConfig::from_parts(toml, EnvOverrides::default());
        assert_eq!(config.db_path(), PathBuf::from("/from/file.db"));
    }

    #[test]
    fn test_places_client_requires_key() {
        let config = CraicConfig::from_parts(CraicToml::default(), EnvOverrides::default());
        let err = config.places_client().err().unwrap();
        assert!(err.to_string().contains("No places API key"));
    }

    #[test]
    fn test_open_store_firestore_requires_project() {
        let config = CraicConfig::from_parts(CraicToml::default(), EnvOverrides::default())
            .with_cli_store(Some(StoreBackend::Firestore));
        assert!(config.open_store().is_err());
    }

    #[test]
    fn test_open_store_sqlite_at_configured_path() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("checkins.db");
        let config = CraicConfig::from_parts(
            CraicToml::default(),
            env(&[("CRAIC_DB_PATH", db.to_str().unwrap())]),
        );
        let store = config.open_store().unwrap();
        assert_eq!(store.backend_name(), "sqlite");
        assert!(db.exists());
    }

    #[test]
    fn test_load_explicit_missing_file_errors() {
        let dir = tempdir().unwrap();
        let err = CraicConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
