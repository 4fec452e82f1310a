//! Record and generation-response fixtures

use std::collections::BTreeMap;

use qexplore::history::{
    Coordinates, GenerationMode, GenerationRequest, HistoryRecord, Point, ResultType,
    WinnerResult,
};
use serde_json::{json, Value};

use super::determinism::minutes_after;

/// Paris, used as the default generation center
pub const CENTER: Coordinates = Coordinates {
    lat: 48.8566,
    lng: 2.3522,
};

/// A standard-mode record with an attractor winner, `minutes` after the
/// fixed test time
pub fn record_at(id: impl Into<String>, minutes: i64) -> HistoryRecord {
    let mut winners = BTreeMap::new();
    winners.insert(
        ResultType::Attractor,
        WinnerResult {
            circle_id: "center".into(),
            result: Point {
                coords: Coordinates::new(48.8601, 2.3488),
                z_score: Some(3.2),
                is_attractor: None,
            },
        },
    );
    HistoryRecord::new(
        id,
        minutes_after(minutes),
        GenerationRequest::new(CENTER, 3000.0),
        winners,
    )
}

/// Full flower-power generation response as the server returns it
pub fn response_json(id: &str, minutes: i64, result_type: ResultType) -> Value {
    let request = GenerationRequest::new(CENTER, 4000.0)
        .with_mode(GenerationMode::FlowerPower)
        .with_backend("anu")
        .with_result_type(result_type);
    json!({
        "id": id,
        "request": request,
        "circles": [
            {"id": "center", "center": {"lat": CENTER.lat, "lng": CENTER.lng}, "radius": 2000.0},
            {"id": "petal_0", "center": {"lat": 48.8746, "lng": 2.3522}, "radius": 2000.0}
        ],
        "winners": {
            "void": {"circle_id": "petal_0", "result": {"coords": {"lat": 48.871, "lng": 2.36}, "z_score": -2.9}},
            "attractor": {"circle_id": "center", "result": {"coords": {"lat": 48.85, "lng": 2.34}, "z_score": 3.5}}
        },
        "metadata": {"timestamp": minutes_after(minutes).to_rfc3339()}
    })
}
