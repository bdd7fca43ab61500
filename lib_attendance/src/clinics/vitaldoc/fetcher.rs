//! # VitalDoc Attendance Fetcher
//!
//! One attempt is: ask for the requested day; if it has no attendances, warn
//! and ask for the previous day instead, returning that answer whatever it
//! holds. The retry policy repeats the whole attempt, always starting again
//! from the requested day, while the attempt's answer is still empty.
//!
//! The previous-day answer is returned even when it is empty too. Callers that
//! need to tell the two days apart should inspect the records' own dates.

use crate::clinics::vitaldoc::apicall::VitalDocApi;
use crate::clinics::vitaldoc::attendance::{AttendanceQuery, AttendanceRecord, AttendanceResponse};
use crate::configs::config_vitaldoc::VitalDocConfig;
use crate::loggers::LogSink;
use crate::retrieve::ky_http::{ApiClient, FetchError, HttpTransport};
use crate::retrieve::retry::{Attempt, RetryPolicy};
use crate::utils::iso_date;
use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;

/// First record in `response`, in API order, whose patient id is `subject_id`.
///
/// `None` when no record matches, including when `data` is empty.
pub fn find_attendance_in_record<'a>(
    response: &'a AttendanceResponse,
    subject_id: &str,
) -> Option<&'a AttendanceRecord> {
    response.find_patient(subject_id)
}

/// Looks up a subject's attendance for a day, with fallback and retries.
pub struct AttendanceFetcher<T> {
    api: VitalDocApi<T>,
    policy: RetryPolicy,
    logger: Arc<dyn LogSink>,
}

impl<T: HttpTransport> AttendanceFetcher<T> {
    /// Creates a fetcher over `api`, repeating attempts according to `policy`.
    pub fn new(api: VitalDocApi<T>, policy: RetryPolicy, logger: Arc<dyn LogSink>) -> Self {
        Self { api, policy, logger }
    }

    /// The retry policy in use.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetches attendances of `subject_id` on `attendance_date`.
    ///
    /// Returns the decoded body of the last request issued: the requested
    /// day's answer if it had records, otherwise the previous day's answer
    /// from the final attempt. An empty `data` after all attempts is a normal
    /// result, not an error.
    ///
    /// # Errors
    /// Transport, status and decoding failures are returned as soon as they
    /// happen; they are never retried.
    pub async fn execute(&self, subject_id: &str, attendance_date: NaiveDate) -> Result<AttendanceResponse, FetchError> {
        if subject_id.trim().is_empty() {
            return Err(FetchError::EmptySubject);
        }

        let query = AttendanceQuery::new(attendance_date, subject_id);
        let query = &query;

        self.policy
            .run(
                |_| self.attempt(query),
                AttendanceResponse::is_not_found,
                |attempt| self.log_attempt(query, attempt),
            )
            .await
    }

    async fn attempt(&self, query: &AttendanceQuery) -> Result<AttendanceResponse, FetchError> {
        let response = self.api.send_request(query).await?;
        if !response.is_not_found() {
            return Ok(response);
        }

        self.logger.warn(
            &format!(
                "No attendances found for {}. Trying the previous day.",
                iso_date(query.attendance_date)
            ),
            Some(json!({
                "attendance_date": iso_date(query.attendance_date),
                "subject_id": query.subject_id,
            })),
        );

        self.try_yesterday(query).await
    }

    async fn try_yesterday(&self, query: &AttendanceQuery) -> Result<AttendanceResponse, FetchError> {
        let yesterday = query.previous_day()?;
        self.api.send_request(&yesterday).await
    }

    fn log_attempt(&self, query: &AttendanceQuery, attempt: &Attempt<'_, AttendanceResponse, FetchError>) {
        let outcome = match attempt.outcome {
            Ok(response) if response.is_not_found() => "not_found".to_string(),
            Ok(_) => "found".to_string(),
            Err(e) => format!("failed: {e}"),
        };
        let records = attempt.outcome.as_ref().map(|r| r.data.len()).unwrap_or(0);

        self.logger.info(
            &format!(
                "Attendance lookup attempt {}/{} finished: {}",
                attempt.number,
                self.policy.max_attempts(),
                outcome
            ),
            Some(json!({
                "attendance_date": iso_date(query.attendance_date),
                "subject_id": query.subject_id,
                "attempt": attempt.number,
                "elapsed_ms": u64::try_from(attempt.elapsed.as_millis()).unwrap_or(u64::MAX),
                "records": records,
                "will_retry_if_allowed": attempt.wants_retry,
            })),
        );
    }
}

impl AttendanceFetcher<ApiClient> {
    /// A `reqwest`-backed fetcher with the configured endpoint, token and retry policy.
    pub fn from_config(config: &VitalDocConfig, logger: Arc<dyn LogSink>) -> anyhow::Result<Self> {
        let api = VitalDocApi::from_config(config)?;
        Ok(Self::new(api, config.retry.policy(), logger))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loggers::MemorySink;
    use crate::loggers::logrecord::LogLevel;
    use reqwest::header::{AUTHORIZATION, HeaderMap};
    use serde_json::Value;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;
    use url::Url;

    type Responder = Box<dyn Fn(&AttendanceQuery, usize) -> Result<Value, FetchError> + Send + Sync>;

    /// Answers from a closure and remembers every request it saw.
    struct ScriptedTransport {
        respond: Responder,
        seen: Mutex<Vec<(AttendanceQuery, HeaderMap)>>,
    }

    impl ScriptedTransport {
        fn new(respond: impl Fn(&AttendanceQuery, usize) -> Result<Value, FetchError> + Send + Sync + 'static) -> Self {
            Self {
                respond: Box::new(respond),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpTransport for Arc<ScriptedTransport> {
        async fn get_json(&self, url: Url, headers: HeaderMap) -> Result<Value, FetchError> {
            let query = AttendanceQuery::from_url(&url).expect("fetcher built a history URL");
            let call = {
                let mut seen = self.seen.lock().unwrap();
                seen.push((query.clone(), headers));
                seen.len()
            };
            (self.respond)(&query, call)
        }
    }

    const SUBJECT: &str = "1ce09866-c945-4f25-ba7a-f6bed5335b51";

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn found(subject: &str) -> Result<Value, FetchError> {
        Ok(json!({"data": [{"id": 1, "patient": {"id": subject}}]}))
    }

    fn empty() -> Result<Value, FetchError> {
        Ok(json!({"data": []}))
    }

    fn fetcher(
        transport: &Arc<ScriptedTransport>,
        logger: &Arc<MemorySink>,
    ) -> AttendanceFetcher<Arc<ScriptedTransport>> {
        let api = VitalDocApi::new(
            transport.clone(),
            Url::parse("https://h-mj.vitaldoc.com.br/admin/v1/attendance").unwrap(),
            "token-123",
        );
        AttendanceFetcher::new(api, RetryPolicy::default(), logger.clone())
    }

    fn dates_requested(transport: &ScriptedTransport) -> Vec<NaiveDate> {
        transport.seen.lock().unwrap().iter().map(|(q, _)| q.attendance_date).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn found_on_first_request_returns_immediately() {
        let transport = Arc::new(ScriptedTransport::new(|q, _| found(&q.subject_id)));
        let logger = Arc::new(MemorySink::new());

        let response = fetcher(&transport, &logger).execute(SUBJECT, day(2024, 3, 1)).await.unwrap();

        assert_eq!(response.data.len(), 1);
        assert_eq!(dates_requested(&transport), vec![day(2024, 3, 1)]);
        assert!(logger.at(LogLevel::Warn).is_empty());
        assert_eq!(logger.at(LogLevel::Info).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_day_falls_back_once_and_stops_when_fallback_finds_data() {
        let requested = day(2024, 3, 1);
        let transport = Arc::new(ScriptedTransport::new(move |q, _| {
            if q.attendance_date == requested { empty() } else { found(&q.subject_id) }
        }));
        let logger = Arc::new(MemorySink::new());
        let started = Instant::now();

        let response = fetcher(&transport, &logger).execute(SUBJECT, requested).await.unwrap();

        assert_eq!(response.find_patient(SUBJECT).and_then(|r| r.patient_id()), Some(SUBJECT));
        assert_eq!(dates_requested(&transport), vec![day(2024, 3, 1), day(2024, 2, 29)]);
        assert_eq!(started.elapsed(), Duration::ZERO);

        let warnings = logger.at(LogLevel::Warn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("2024-03-01"));
        assert_eq!(
            warnings[0].extras,
            Some(json!({"attendance_date": "2024-03-01", "subject_id": SUBJECT}))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn always_empty_exhausts_six_attempts_of_two_requests() {
        let transport = Arc::new(ScriptedTransport::new(|_, _| empty()));
        let logger = Arc::new(MemorySink::new());
        let started = Instant::now();

        let response = fetcher(&transport, &logger).execute(SUBJECT, day(2024, 3, 1)).await.unwrap();

        assert!(response.is_not_found());
        let dates = dates_requested(&transport);
        assert_eq!(dates.len(), 12);
        // Every attempt restarts from the requested day, never drifting further back.
        for pair in dates.chunks(2) {
            assert_eq!(pair, [day(2024, 3, 1), day(2024, 2, 29)]);
        }
        assert_eq!(started.elapsed(), Duration::from_secs(25));
        assert_eq!(logger.at(LogLevel::Warn).len(), 6);

        let infos = logger.at(LogLevel::Info);
        assert_eq!(infos.len(), 6);
        assert!(infos[5].message.starts_with("Attendance lookup attempt 6/6"));
    }

    #[tokio::test(start_paused = true)]
    async fn data_appearing_on_a_later_attempt_ends_the_retries() {
        let requested = day(2024, 6, 10);
        // Calls 1-2 form the first attempt; call 3 is the second attempt's first request.
        let transport = Arc::new(ScriptedTransport::new(move |q, call| {
            if call >= 3 && q.attendance_date == requested { found(&q.subject_id) } else { empty() }
        }));
        let logger = Arc::new(MemorySink::new());
        let started = Instant::now();

        let response = fetcher(&transport, &logger).execute(SUBJECT, requested).await.unwrap();

        assert!(!response.is_not_found());
        assert_eq!(dates_requested(&transport), vec![requested, day(2024, 6, 9), requested]);
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn transport_error_on_first_request_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::new(|_, _| {
            Err(FetchError::Status {
                status: 503,
                url: "https://h-mj.vitaldoc.com.br".to_string(),
                body: String::new(),
            })
        }));
        let logger = Arc::new(MemorySink::new());

        let err = fetcher(&transport, &logger).execute(SUBJECT, day(2024, 3, 1)).await.unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 503, .. }));
        assert_eq!(dates_requested(&transport).len(), 1);
        assert!(logger.at(LogLevel::Warn).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn error_during_fallback_propagates() {
        let requested = day(2024, 3, 1);
        let transport = Arc::new(ScriptedTransport::new(move |q, _| {
            if q.attendance_date == requested {
                empty()
            } else {
                Err(FetchError::Status {
                    status: 500,
                    url: String::new(),
                    body: String::new(),
                })
            }
        }));
        let logger = Arc::new(MemorySink::new());

        let err = fetcher(&transport, &logger).execute(SUBJECT, requested).await.unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 500, .. }));
        assert_eq!(dates_requested(&transport).len(), 2);
        assert_eq!(logger.at(LogLevel::Warn).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn body_without_data_is_a_decode_error() {
        let transport = Arc::new(ScriptedTransport::new(|_, _| Ok(json!({"message": "Unauthorized"}))));
        let logger = Arc::new(MemorySink::new());

        let err = fetcher(&transport, &logger).execute(SUBJECT, day(2024, 3, 1)).await.unwrap_err();

        assert!(matches!(err, FetchError::Decode(_)));
        assert_eq!(dates_requested(&transport).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn every_request_carries_the_bearer_token() {
        let transport = Arc::new(ScriptedTransport::new(|_, _| empty()));
        let logger = Arc::new(MemorySink::new());
        let api = VitalDocApi::new(
            transport.clone(),
            Url::parse("https://h-mj.vitaldoc.com.br/admin/v1/attendance").unwrap(),
            "token-123",
        );
        let fetcher = AttendanceFetcher::new(api, RetryPolicy::new(Duration::from_secs(5), 2), logger.clone());

        fetcher.execute(SUBJECT, day(2024, 3, 1)).await.unwrap();

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        for (query, headers) in seen.iter() {
            assert_eq!(query.subject_id, SUBJECT);
            assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer token-123");
        }
    }

    #[tokio::test]
    async fn blank_subject_is_rejected_without_a_request() {
        let transport = Arc::new(ScriptedTransport::new(|_, _| empty()));
        let logger = Arc::new(MemorySink::new());

        let err = fetcher(&transport, &logger).execute("  ", day(2024, 3, 1)).await.unwrap_err();

        assert!(matches!(err, FetchError::EmptySubject));
        assert!(dates_requested(&transport).is_empty());
    }

    #[test]
    fn find_attendance_in_record_matches_first_patient() {
        let response: AttendanceResponse = serde_json::from_value(json!({
            "data": [
                {"seq": 1, "patient": {"id": "a"}},
                {"seq": 2, "patient": {"id": SUBJECT}},
                {"seq": 3, "patient": {"id": SUBJECT}}
            ]
        }))
        .unwrap();

        let record = find_attendance_in_record(&response, SUBJECT).unwrap();
        assert_eq!(record.get("seq"), Some(&json!(2)));
        assert!(find_attendance_in_record(&response, "missing").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn unrelated_malformed_records_do_not_fail_the_lookup() {
        let transport = Arc::new(ScriptedTransport::new(|q, _| {
            Ok(json!({"data": [
                {"seq": 1, "patient": {"id": 42}},
                {"seq": 2, "patient": null},
                {"seq": 3},
                {"seq": 4, "patient": {"id": q.subject_id}}
            ]}))
        }));
        let logger = Arc::new(MemorySink::new());

        let response = fetcher(&transport, &logger).execute(SUBJECT, day(2024, 3, 1)).await.unwrap();

        assert_eq!(response.data.len(), 4);
        assert_eq!(dates_requested(&transport), vec![day(2024, 3, 1)]);
        let record = find_attendance_in_record(&response, SUBJECT).unwrap();
        assert_eq!(record.get("seq"), Some(&json!(4)));
        assert!(find_attendance_in_record(&response, "42").is_none());
    }
}
