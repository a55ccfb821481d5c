//! Relevance boost scoring for bibliographic records.
//!
//! [`boost::BoostEngine`] turns one record plus a [`config::RankingConfig`] into
//! per-discipline boost factors. The [`pipeline`] module wires the engine to
//! storage, downstream publishing, CSV export and HTTP.

pub mod boost;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod telemetry;
