//! Shared data models for the voxclean pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Measured audio features and noise regimes
//! - Processing profiles
//! - Declarative filter specs and filter-chain configuration
//! - Output validation reports

pub mod chain;
pub mod error;
pub mod features;
pub mod filter;
pub mod profile;
pub mod validation;

// Re-export common types
pub use chain::FilterChainConfig;
pub use error::{ModelError, ModelResult};
pub use features::{AudioFeatures, NoiseRegime};
pub use filter::{FilterArgs, FilterSpec, FilterValue};
pub use profile::Profile;
pub use validation::ValidationReport;
