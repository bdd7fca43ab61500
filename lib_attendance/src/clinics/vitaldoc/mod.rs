//! # VitalDoc Integration Module
//!
//! - **`attendance`**: Query and response models, the not-found predicate and
//!   the patient lookup inside a response.
//! - **`apicall`**: Request construction (URL, bearer header) and a single
//!   decoded GET.
//! - **`fetcher`**: `AttendanceFetcher`, which combines one lookup, the
//!   previous-day fallback and the retry policy.

/// Attendance query and response models.
pub mod attendance;
/// Authenticated requests to the attendance history endpoint.
pub mod apicall;
/// Retrying attendance lookup with previous-day fallback.
pub mod fetcher;
