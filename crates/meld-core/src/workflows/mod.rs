//! # Workflows Module
//!
//! High-level entry points that tie restraint files, the transformer and a force engine
//! together.
//!
//! ## Overview
//!
//! - **Dry Run** ([`dry_run`]) - Loads a restraint set into the in-memory engine and
//!   replays an alpha/timestep schedule, reporting what was registered and how often
//!   each kind of entity was updated. Useful for checking a restraint file before a
//!   production run.

pub mod dry_run;
