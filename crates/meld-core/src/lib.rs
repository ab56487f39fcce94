//! # MELD Core Library
//!
//! Restraint handling for MELD (Modeling Employing Limited Data) simulations: restraint
//! definitions, their registration with a force engine, and the per-step updates that
//! follow the annealing coefficient alpha and the timestep.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Immutable restraint definitions (`Restraint`,
//!   `RestraintGroup`, `SelectivelyActiveCollection`), their scaler and ramp schedules,
//!   the sampled-parameter registry, and restraint-file loading.
//!
//! - **[`engine`]: The Logic Core.** The stateful `MeldRestraintTransformer`, which
//!   registers every restraint, group and collection with a force engine exactly once and
//!   then keeps their parameters synchronized every step. The force engine itself is an
//!   external collaborator described by the `RestraintForce` and `ForceSystem` traits; an
//!   in-memory implementation is included.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures such as a dry run that
//!   loads a restraint file and replays an alpha/timestep schedule against the in-memory
//!   engine.

pub mod core;
pub mod engine;
pub mod workflows;
