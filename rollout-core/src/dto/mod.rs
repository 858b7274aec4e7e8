//! Data Transfer Objects for dispatcher calls
//!
//! Each procedure takes one input value. These are the inputs that are not
//! plain domain types; they serialize identically whether the call stays in
//! process or crosses to a remote worker.

pub mod cluster;
pub mod images;
pub mod jobs;
