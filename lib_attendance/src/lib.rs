//! # lib_attendance
//!
//! Clinic attendance retrieval for the `rsdev` ecosystem. Each top-level
//! folder is gated behind a cargo feature of the same name; `full` enables
//! everything.
//!
//! The entry point most callers want is
//! [`clinics::vitaldoc::fetcher::AttendanceFetcher`].

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

#[cfg(feature = "clinics")]
pub mod clinics;
#[cfg(feature = "configs")]
pub mod configs;
#[cfg(feature = "loggers")]
pub mod loggers;
#[cfg(feature = "retrieve")]
pub mod retrieve;
#[cfg(feature = "utils")]
pub mod utils;

// Re-export the pieces a binary needs to wire a fetcher together.
#[cfg(feature = "clinics")]
pub use clinics::vitaldoc::attendance::{AttendanceQuery, AttendanceRecord, AttendanceResponse};
#[cfg(feature = "clinics")]
pub use clinics::vitaldoc::fetcher::{AttendanceFetcher, find_attendance_in_record};
#[cfg(feature = "configs")]
pub use configs::config_vitaldoc::VitalDocConfig;
#[cfg(feature = "loggers")]
pub use loggers::{LogSink, loggerlocal::LoggerLocal, logrecord::LogLevel};
#[cfg(feature = "retrieve")]
pub use retrieve::{ky_http::FetchError, retry::RetryPolicy};
