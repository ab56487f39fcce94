//! # Sampling Module
//!
//! Sampled parameters let quantities that are normally constants, such as the number of
//! active restraints in a group, be explored by replica exchange alongside the
//! coordinates. This module holds the parameter registry and the per-replica parameter
//! state; the Monte Carlo moves that update the state live with the simulation driver.
//!
//! ## Key Components
//!
//! - [`parameters::ParameterManager`] - Registry of discrete and continuous parameters
//! - [`parameters::ParameterState`] - Current values for one replica
//! - [`parameters::ParameterSampler`] - The lookup used by the restraint transformer

pub mod parameters;
