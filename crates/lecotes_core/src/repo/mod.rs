//! Persistence adapters for annotation working sets.
//!
//! # Responsibility
//! - Define the storage contract the service layer depends on.
//! - Keep SQL details out of the engine and service layers.
//!
//! # Invariants
//! - Repositories record what the engine decided; they do not re-run
//!   authorization or vote rules.
//! - Semantic errors (`NotFound`, `InvalidData`) are reported alongside DB
//!   transport errors.

pub mod annotation_repo;
