//! # regen-sync
//!
//! Checksum-gated synchronization of generated sources.
//!
//! [`run`] prunes orphans, renders every template into a scratch directory on
//! a worker pool and copies changed outputs into place atomically. [`verify`]
//! does the same into a throwaway tree and reports how the committed tree
//! diverges from it.

pub mod checksum;
pub mod error;
pub mod generator;
pub mod orchestrator;
pub mod plan;
pub mod pruner;
pub mod synchronizer;
pub mod verifier;

pub use error::{GenerateError, SyncError};
pub use generator::{generate, GeneratedFile};
pub use orchestrator::{run, RunOptions, RunResult, RunState, UnitOutcome, UnitReport};
pub use plan::{plan, Plan};
pub use pruner::{prune, PruneReport, PruneTarget, PruneWarning};
pub use synchronizer::{sync, SyncOutcome};
pub use verifier::{verify, Divergence, DivergenceKind, VerifyReport};
