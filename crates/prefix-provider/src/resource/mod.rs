//! Managed resources
//!
//! Handles: the available-prefix resource lifecycle

pub mod available_prefix;
#[cfg(test)]
mod available_prefix_test;
