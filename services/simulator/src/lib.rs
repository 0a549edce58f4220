//! Classroom Simulator Service
//!
//! Configuration, seed-data loading and oracle wiring for the `simulate`
//! binary. The turn-taking engine itself lives in `classroom-core`; the binary
//! is a thin wrapper around this library.

pub mod classroom;
pub mod config;
pub mod oracle;
