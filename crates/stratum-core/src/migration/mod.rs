//! Versioned, resumable migrations for workspace data.
//!
//! Each module owns an ordered list of named steps. For every workspace the
//! engine guarantees that steps run in declared order, that a completed step is
//! recorded exactly once, and that a failed run can simply be retried.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │              MigrateOperation (one per module)            │
//! │  migrate(client, mode)          upgrade(states, client)   │
//! └───────────────────────────────────────────────────────────┘
//!          │                                  │
//!          V                                  │ (not state-tracked)
//!   try_migrate(mode, client, module, steps)  │
//!          │                                  │
//!          V                                  V
//!   MigrationStep::apply ──► migrate_space ──► MigrationClient
//!          │                                  ▲
//!          └── get/set_migration_state ───────┘
//! ```
//!
//! # Idempotence
//!
//! Applying a step and recording its completion are two separate durable
//! writes. A crash between them re-runs the step on the next attempt, so every
//! step must tolerate being applied to data it has already transformed.

mod client;
mod mode;
mod operation;
mod runner;
mod space;
mod state;
mod step;

pub use client::{DocumentStream, MigrationClient};
pub use mode::{MigrationMode, StepPolicy};
pub use operation::MigrateOperation;
pub use runner::{MigrationOutcome, try_migrate};
pub use space::{SpaceMoveReport, migrate_space};
pub use state::{CompletedSet, MIGRATION_STATE_CLASS, MigrationStateRecord, MigrationStates};
pub use step::{FnStep, MigrationRegistry, MigrationStep, ensure_unique_names};
