//! Storage, downstream delivery, export and HTTP wiring around the engine.

pub mod export;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use export::{csv_header, write_csv, ExportError};
pub use memory::{InMemoryBoostPublisher, InMemoryBoostRepository};
pub use repository::{
    BoostMessage, BoostPublisher, BoostRepository, PublishError, RecordLookup, RepositoryError,
    StoredBoostFactors,
};
pub use router::boost_router;
pub use service::{BatchFailure, BatchSummary, BoostPipelineService, PipelineError};
