//! Display preferences persisted in the `settings` slot

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::history::{Coordinates, ResultType};
use crate::storage::{KeyValueStore, SETTINGS_KEY};
use crate::units::{self, UnitSystem};

/// Default radius in meters
pub const DEFAULT_RADIUS: f64 = 3000.0;

/// Map link providers and their URL templates
pub const MAP_LINK_PROVIDERS: [(&str, &str); 3] = [
    ("google", "https://www.google.com/maps/@{lat},{lng},15z"),
    ("openstreetmap", "https://www.openstreetmap.org/#map=18/{lat}/{lng}"),
    ("apple", "https://maps.apple.com/?ll={lat},{lng}"),
];

/// Format a map link for `provider` pointing at `coords`
pub fn map_link(provider: &str, coords: Coordinates) -> Result<String> {
    let template = MAP_LINK_PROVIDERS
        .iter()
        .find(|(name, _)| *name == provider)
        .map(|(_, template)| *template)
        .ok_or_else(|| Error::Config(format!("Unknown map link provider: {}", provider)))?;
    Ok(template
        .replace("{lat}", &coords.lat.to_string())
        .replace("{lng}", &coords.lng.to_string()))
}

fn default_radius() -> f64 {
    DEFAULT_RADIUS
}

fn default_backend() -> String {
    "pseudo".to_string()
}

fn default_provider() -> String {
    "google".to_string()
}

/// User-facing display preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(default)]
    pub units: UnitSystem,
    /// Meters
    #[serde(default = "default_radius")]
    pub default_radius: f64,
    #[serde(default = "default_backend")]
    pub default_backend: String,
    #[serde(default = "default_provider")]
    pub map_link_provider: String,
    #[serde(default)]
    pub default_type: ResultType,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            units: UnitSystem::default(),
            default_radius: default_radius(),
            default_backend: default_backend(),
            map_link_provider: default_provider(),
            default_type: ResultType::default(),
        }
    }
}

impl DisplaySettings {
    pub const KEYS: [&'static str; 5] = [
        "units",
        "default_radius",
        "default_backend",
        "map_link_provider",
        "default_type",
    ];

    /// Load settings, returning defaults if missing or corrupt
    pub fn load(kv: &dyn KeyValueStore) -> Self {
        match kv.get(SETTINGS_KEY) {
            Ok(Some(blob)) => serde_json::from_str(&blob).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Stored display settings are corrupt, using defaults");
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read display settings, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, kv: &dyn KeyValueStore) -> Result<()> {
        kv.set(SETTINGS_KEY, &serde_json::to_string(self)?)
    }

    /// Current value of `key` as text. Radii are reported in meters.
    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "units" => self.units.to_string(),
            "default_radius" => self.default_radius.to_string(),
            "default_backend" => self.default_backend.clone(),
            "map_link_provider" => self.map_link_provider.clone(),
            "default_type" => self.default_type.to_string(),
            _ => return Err(Error::Config(format!("Unknown setting: {}", key))),
        };
        Ok(value)
    }

    /// Update `key` from user input.
    ///
    /// `default_radius` accepts a unit suffix (`"2 mi"`) and is stored in
    /// meters.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "units" => {
                self.units = value
                    .parse()
                    .map_err(|_| Error::Config(format!("Invalid unit system: {}", value)))?;
            }
            "default_radius" => {
                let meters = units::parse_distance(value)?;
                if !meters.is_finite() || meters <= 0.0 {
                    return Err(Error::Config(format!("Radius must be positive: {}", value)));
                }
                self.default_radius = meters;
            }
            "default_backend" => {
                let backend = value.trim();
                if backend.is_empty() {
                    return Err(Error::Config("Backend cannot be empty".into()));
                }
                self.default_backend = backend.to_string();
            }
            "map_link_provider" => {
                let provider = value.trim().to_lowercase();
                if !MAP_LINK_PROVIDERS.iter().any(|(name, _)| *name == provider) {
                    return Err(Error::Config(format!(
                        "Unknown map link provider: {}",
                        value
                    )));
                }
                self.map_link_provider = provider;
            }
            "default_type" => self.default_type = value.parse()?,
            _ => return Err(Error::Config(format!("Unknown setting: {}", key))),
        }
        Ok(())
    }

    /// Every key with its current value
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        Self::KEYS
            .iter()
            .filter_map(|key| self.get(key).ok().map(|value| (*key, value)))
            .collect()
    }

    /// Link to `coords` using the preferred provider
    pub fn map_link(&self, coords: Coordinates) -> Result<String> {
        map_link(&self.map_link_provider, coords)
    }

    /// The default radius in the active unit system
    pub fn default_radius_display(&self) -> String {
        units::display_string(self.default_radius, self.units.radius_unit())
    }
}
