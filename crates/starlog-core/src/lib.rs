//! Engine core for the Starlog journal engine.
//!
//! This crate wires the file layer to the state layer:
//!
//! - [`bus`] -- the typed publish/subscribe hub that fans journal events
//!   and companion snapshot updates out to subscribers
//! - [`reducer`] -- the pure transition table folding events into
//!   [`starlog_types::GameState`]
//! - [`manager`] -- the [`manager::GameStateManager`] owning the single
//!   state instance and serving point-in-time snapshot reads
//! - [`config`] -- YAML engine configuration
//! - [`runner`] -- the ingestion loop driving
//!   `Starting -> Replaying -> Tailing <-> Degraded -> Stopped`
//!
//! Folding is strictly sequential: the runner reads lines one at a time
//! and bus dispatch is synchronous, which is what makes reconstruction
//! deterministic and replay-safe.

pub mod bus;
pub mod config;
pub mod manager;
pub mod reducer;
pub mod runner;

pub use bus::{EventBus, SubscriberError, SubscriptionId};
pub use config::{ConfigError, EngineConfig};
pub use manager::GameStateManager;
pub use runner::{EngineControl, IngestStatus, IngestionReport, run_ingestion};
