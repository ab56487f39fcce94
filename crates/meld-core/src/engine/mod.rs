//! # Engine Module
//!
//! The stateful layer that turns restraint definitions into force-engine state and keeps
//! that state current as alpha and the timestep advance.
//!
//! ## Overview
//!
//! At setup the [`transformer::MeldRestraintTransformer`] claims the restraints and
//! collections it can handle, registers each of them with a force object exactly once,
//! and remembers the engine's creation order in a [`tracker::RestraintTracker`]. Every
//! step it recomputes the scaled parameters of each tracked restraint, re-resolves the
//! `num_active` selectors of the groups and collections that can change, and asks the
//! force to refresh the simulation context.
//!
//! ## Architecture
//!
//! - **Engine Boundary** ([`force`]) - Traits the external force engine implements and
//!   the flat parameter lists passed across it
//! - **Serialization** ([`serializer`], [`precision`]) - Per-kind parameter builders
//!   shared by create and update calls
//! - **Bookkeeping** ([`tracker`]) - Append-only, order-preserving records of what was
//!   registered, with fixed slots for entities that never change
//! - **Selection** ([`active`]) - Resolution of literal and sampled `num_active` values
//! - **Orchestration** ([`transformer`], [`pipeline`]) - The transformer state machine
//!   and sequential composition of transformers
//! - **Reference Engine** ([`memory`]) - An in-memory force engine for dry runs and tests
//! - **Configuration** ([`config`]) - Dry-run schedules
//! - **Progress Monitoring** ([`progress`]) - Progress events for front ends
//! - **Error Handling** ([`error`]) - Engine-level error types

pub mod active;
pub mod config;
pub mod error;
pub mod force;
pub mod memory;
pub mod pipeline;
pub mod precision;
pub mod progress;
pub mod serializer;
pub mod state;
pub mod tracker;
pub mod transformer;
