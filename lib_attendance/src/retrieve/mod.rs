//! # Data Retrieval Module
//!
//! Generic retrieval plumbing shared by the clinic API clients.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: The `HttpTransport` seam, its `reqwest`-backed
//!   implementation `ApiClient`, and the `FetchError` taxonomy.
//!
//! - **`retry`**: `RetryPolicy`, a fixed-delay, attempt-bounded loop that
//!   retries on a *result* predicate and lets errors through untouched.
//!
//! Clients built on top of this module only deal with URLs, decoded JSON and
//! their own notion of "no data yet".

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// HTTP transport trait, `reqwest` client and error types.
pub mod ky_http;
/// Result-predicate retry policy with fixed backoff.
pub mod retry;
