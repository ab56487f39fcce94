//! # Core Module
//!
//! The stateless foundation of the library: what restraints are, how they are bundled,
//! which sampled parameters exist, and how all of it is read from disk.
//!
//! ## Architecture
//!
//! - **Restraint Definitions** ([`restraints`]) - Restraint kinds, schedules, spline and
//!   Gaussian mixture data, groups and collections
//! - **Sampled Parameters** ([`sampling`]) - The parameter registry and per-replica state
//! - **File I/O** ([`io`]) - TOML restraint files
//!
//! Nothing in this module talks to a force engine; see [`crate::engine`] for that.

pub mod io;
pub mod restraints;
pub mod sampling;
