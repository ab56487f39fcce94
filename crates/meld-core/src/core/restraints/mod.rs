//! # Restraints Module
//!
//! The restraint definition model: what a restraint is, how its strength follows the
//! annealing schedule, and how restraints are bundled into groups and collections.
//!
//! ## Overview
//!
//! A restraint set is made of individual restraints (distances, torsions, profiles,
//! Gaussian mixtures, and a few position restraints handled elsewhere), each carrying a
//! [`schedule::Scaler`] over alpha and a [`schedule::Ramp`] over the timestep. Selectable
//! restraints can be grouped; a [`groups::RestraintGroup`] enforces at most `num_active`
//! of its members and a [`groups::SelectivelyActiveCollection`] does the same for groups.
//!
//! ## Key Components
//!
//! - [`kinds`] - The restraint variants and the selectable/non-selectable split
//! - [`schedule`] - Scalers, ramps and positioners
//! - [`spline`] - Column-wise spline coefficients for profile restraints
//! - [`gmm`] - Gaussian mixture distance restraints
//! - [`groups`] - Groups, collections and `num_active` selectors
//! - [`error`] - Validation errors raised on construction

pub mod error;
pub mod gmm;
pub mod groups;
pub mod kinds;
pub mod schedule;
pub mod spline;
