// Tally - Record Aggregation & Ranking Engine
// Keyed records with numeric ledgers, aggregates on demand, stable top-N views

pub mod error;
pub mod config;
pub mod aggregate;
pub mod ledger;
pub mod entities;
pub mod ranking;

// Re-export commonly used types
pub use error::{EngineError, EngineResult};
pub use config::EngineConfig;
pub use aggregate::{
    average, count, grand_total, line_total, max, min, sum, summarize, Summary,
};
pub use ledger::{Flavor, Ledger, LineItem};
pub use entities::{Entity, EntityId, EntityRef, RecordStore};
pub use ranking::{rank, top_n, Metric, MetricFn, Ranked};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
