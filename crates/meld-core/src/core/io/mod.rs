//! Reading restraint definitions from disk.
//!
//! Restraint files are TOML documents with kebab-case keys. They declare the sampled
//! parameters of a run, the restraints that are always enforced, and the selectively
//! active collections of groups. Every restraint passes the same validation as when it is
//! built in code.

pub mod restraint_file;
