//! Exploration history: record types, their serialized form, and the store

pub mod codec;
pub mod record;
mod store;

pub use codec::{decode, decode_batch, encode, encode_all, DecodeBatch};
pub use record::{
    Circle, Coordinates, GenerationMetadata, GenerationMode, GenerationRequest,
    GenerationResponse, HistoryRecord, Point, ResultType, WinnerResult,
};
pub use store::{HistoryStore, ImportReport, MAX_HISTORY_ENTRIES};
