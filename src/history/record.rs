//! Generation request/response shapes and the stored history record

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Minimum radius in meters for flower power mode
pub const FLOWER_POWER_MIN_RADIUS: f64 = 3000.0;

/// Default number of points sampled per circle
pub const DEFAULT_POINTS: usize = 10_000;

/// A geographic coordinate (latitude, longitude)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Latitude in [-90, 90], longitude in [-180, 180]
    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(Error::InvalidRequest(format!(
                "Latitude {} is out of range [-90, 90]",
                self.lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(Error::InvalidRequest(format!(
                "Longitude {} is out of range [-180, 180]",
                self.lng
            )));
        }
        Ok(())
    }
}

/// A point with optional statistical metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub coords: Coordinates,

    /// Standard deviations from the expected density
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_score: Option<f64>,

    /// For power results: attractor (true) or void (false)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_attractor: Option<bool>,
}

impl Point {
    pub fn new(coords: Coordinates) -> Self {
        Self {
            coords,
            z_score: None,
            is_attractor: None,
        }
    }
}

/// Generation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Single circle around the center point
    #[default]
    Standard,
    /// Center circle plus six overlapping petals
    FlowerPower,
}

impl GenerationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::FlowerPower => "flower_power",
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "flower_power" | "flower-power" | "flowerpower" | "composite" => Ok(Self::FlowerPower),
            _ => Err(Error::Config(format!("Unknown generation mode: {}", s))),
        }
    }
}

/// Result-type classification a winner is chosen for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    /// Single random point, no analysis
    BlindSpot,
    /// Densest cluster
    #[default]
    Attractor,
    /// Emptiest region
    Void,
    /// Highest absolute z-score
    Power,
}

impl ResultType {
    pub const ALL: [ResultType; 4] = [
        ResultType::BlindSpot,
        ResultType::Attractor,
        ResultType::Void,
        ResultType::Power,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BlindSpot => "blind_spot",
            Self::Attractor => "attractor",
            Self::Void => "void",
            Self::Power => "power",
        }
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "blind_spot" | "blind-spot" | "blindspot" => Ok(Self::BlindSpot),
            "attractor" => Ok(Self::Attractor),
            "void" => Ok(Self::Void),
            "power" => Ok(Self::Power),
            _ => Err(Error::Config(format!("Unknown result type: {}", s))),
        }
    }
}

fn default_backend() -> String {
    "pseudo".to_string()
}

fn default_points() -> usize {
    DEFAULT_POINTS
}

/// Request parameters sent to the generation API.
///
/// `radius` is always in meters; display units never reach this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub lat: f64,
    pub lng: f64,
    pub radius: f64,
    #[serde(default = "default_points")]
    pub points: usize,
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default)]
    pub mode: GenerationMode,
    #[serde(default)]
    pub include_points: bool,
    /// Result type the user had selected when generating
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_type: Option<ResultType>,
}

impl GenerationRequest {
    pub fn new(center: Coordinates, radius: f64) -> Self {
        Self {
            lat: center.lat,
            lng: center.lng,
            radius,
            points: DEFAULT_POINTS,
            backend: default_backend(),
            mode: GenerationMode::Standard,
            include_points: false,
            result_type: None,
        }
    }

    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }

    pub fn with_result_type(mut self, result_type: ResultType) -> Self {
        self.result_type = Some(result_type);
        self
    }

    pub fn center(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }

    pub fn validate(&self) -> Result<()> {
        self.center().validate()?;
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(Error::InvalidRequest(format!(
                "Radius must be a positive number of meters, got {}",
                self.radius
            )));
        }
        if self.mode == GenerationMode::FlowerPower && self.radius < FLOWER_POWER_MIN_RADIUS {
            return Err(Error::InvalidRequest(format!(
                "Flower power mode needs a radius of at least {}m",
                FLOWER_POWER_MIN_RADIUS
            )));
        }
        Ok(())
    }
}

/// Winner for one result type, pointing at the circle it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinnerResult {
    pub circle_id: String,
    pub result: Point,
}

/// One analysed circle of a generation (auxiliary geometry)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// "center", "petal_0", ...
    pub id: String,
    pub center: Coordinates,
    pub radius: f64,
    #[serde(default)]
    pub anomalies: BTreeMap<ResultType, Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Coordinates>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// RFC 3339 timestamp
    pub timestamp: String,
}

/// Full response from the generation API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub id: String,
    pub request: GenerationRequest,
    #[serde(default)]
    pub circles: Vec<Circle>,
    #[serde(default)]
    pub winners: BTreeMap<ResultType, WinnerResult>,
    pub metadata: GenerationMetadata,
}

/// A past generation kept in the history store.
///
/// Records are immutable once built; the store replaces them by id instead
/// of editing them. `name`, `notes` and `favorite` are user annotations the
/// server keeps alongside a generation.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    id: String,
    timestamp: DateTime<Utc>,
    request: GenerationRequest,
    winners: BTreeMap<ResultType, WinnerResult>,
    name: Option<String>,
    notes: Option<String>,
    favorite: bool,
}

impl HistoryRecord {
    pub fn new(
        id: impl Into<String>,
        timestamp: DateTime<Utc>,
        request: GenerationRequest,
        winners: BTreeMap<ResultType, WinnerResult>,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp,
            request,
            winners,
            name: None,
            notes: None,
            favorite: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }

    /// Keep the persisted parts of a generation response, dropping circles
    pub fn from_response(response: &GenerationResponse) -> Result<Self> {
        if response.id.is_empty() {
            return Err(Error::MalformedRecord("response has an empty id".into()));
        }
        let timestamp = DateTime::parse_from_rfc3339(&response.metadata.timestamp)
            .map_err(|e| {
                Error::MalformedRecord(format!(
                    "invalid timestamp {:?}: {}",
                    response.metadata.timestamp, e
                ))
            })?
            .with_timezone(&Utc);
        Ok(Self::new(
            response.id.clone(),
            timestamp,
            response.request.clone(),
            response.winners.clone(),
        ))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }

    pub fn winners(&self) -> &BTreeMap<ResultType, WinnerResult> {
        &self.winners
    }

    pub fn winner(&self, result_type: ResultType) -> Option<&WinnerResult> {
        self.winners.get(&result_type)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn is_favorite(&self) -> bool {
        self.favorite
    }

    /// Name if set, otherwise `"(unnamed)"`
    pub fn display_name(&self) -> &str {
        self.name().unwrap_or("(unnamed)")
    }
}
