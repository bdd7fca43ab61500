//! # Clinic Scheduling APIs Module
//!
//! Clients for third-party clinic scheduling services. Each provider lives in
//! its own submodule with the same split: an `apicall` layer that knows the
//! endpoint and credentials, and higher-level lookups on top of it.
//!
//! ## Contained Modules:
//!
//! - **`vitaldoc`**: Attendance history lookups against the VitalDoc admin
//!   API, with previous-day fallback and fixed-delay retries.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Client and attendance lookup for the VitalDoc API.
pub mod vitaldoc;
