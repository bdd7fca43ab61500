//! # Configuration Modules
//!
//! Layered configuration for the clinic API clients.

/// VitalDoc endpoint, credentials and retry settings.
pub mod config_vitaldoc;
