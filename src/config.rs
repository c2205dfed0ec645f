use crate::geocode::RetryPolicy;
use crate::types::{builtin_regions, Region, StyleChoice, TileStyle, DEFAULT_REGION};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_OUTPUT: &str = "carte_interactive.html";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    #[serde(default)]
    pub styles: HashMap<String, StyleChoice>, // keyed by sheet name
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub workbook: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub html: PathBuf,
    pub geojson: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            html: PathBuf::from(DEFAULT_OUTPUT),
            geojson: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub region: String,
    pub tiles: Option<TileStyle>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            tiles: Some(TileStyle::OpenStreetMap),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeocoderConfig {
    pub endpoint: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://nominatim.openstreetmap.org/search".to_string(),
            user_agent: "MonAppCarte_Geocoding".to_string(),
            timeout_secs: 10,
            max_attempts: 3,
            retry_delay_secs: 2,
        }
    }
}

impl GeocoderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            delay: Duration::from_secs(self.retry_delay_secs),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .with_context(|| "Failed to parse TOML configuration")?;
        if config.geocoder.max_attempts == 0 {
            return Err(anyhow!("geocoder.max_attempts must be at least 1"));
        }
        Ok(config)
    }

    /// Built-in regions followed by configured ones; a configured region
    /// replaces a built-in one of the same name.
    pub fn region_catalog(&self) -> Vec<Region> {
        let mut catalog = builtin_regions();
        for region in &self.regions {
            match catalog.iter_mut().find(|r| r.name == region.name) {
                Some(existing) => *existing = region.clone(),
                None => catalog.push(region.clone()),
            }
        }
        catalog
    }

    /// Case-insensitive lookup, accents included.
    pub fn region(&self, name: &str) -> Result<Region> {
        let wanted = name.trim().to_lowercase();
        self.region_catalog()
            .into_iter()
            .find(|r| r.name.to_lowercase() == wanted)
            .ok_or_else(|| anyhow!("Unknown region: {}", name))
    }
}
