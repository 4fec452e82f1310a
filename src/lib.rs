pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod remote;
pub mod replay;
pub mod storage;
pub mod units;
pub mod util;

pub use config::{Config, DisplaySettings};
pub use error::{Error, Result};
pub use history::{HistoryRecord, HistoryStore, ImportReport, MAX_HISTORY_ENTRIES};
pub use remote::{HistorySource, HttpHistorySource};
pub use replay::{MapRenderer, ReplayEngine, ReplayState};
pub use storage::{Database, KeyValueStore, MemoryStore, SqliteStore};
pub use units::{MeasurementUnit, UnitSystem};
