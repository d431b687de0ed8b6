//! Shared helpers: configuration loading and XML plumbing.

/// TOML configuration for the binary.
pub mod load_config;
/// XML tree, comparison and writer helpers.
pub mod xml;
