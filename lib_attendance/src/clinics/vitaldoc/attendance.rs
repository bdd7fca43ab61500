//! # VitalDoc Attendance Models
//!
//! The history endpoint answers `{"data": [ {...record...}, ... ]}`. Only
//! `data` and each record's `patient.id` are interpreted; every other field is
//! carried through untouched so callers see exactly what the API sent.

use crate::retrieve::ky_http::FetchError;
use crate::utils::iso_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

/// Last path segment of the history endpoint, relative to the base URL.
pub const HISTORY_SEGMENT: &str = "history";
const START_PARAM: &str = "start";
const SPONSOR_PARAM: &str = "sponsorId";

/// One lookup: which subject, which day.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttendanceQuery {
    /// Calendar day to look up. No time zone is involved.
    pub attendance_date: NaiveDate,
    /// Patient/sponsor identifier, sent as `sponsorId`.
    pub subject_id: String,
}

impl AttendanceQuery {
    /// Creates a query.
    pub fn new(attendance_date: NaiveDate, subject_id: impl Into<String>) -> Self {
        Self {
            attendance_date,
            subject_id: subject_id.into(),
        }
    }

    /// The same subject, one calendar day earlier.
    pub fn previous_day(&self) -> Result<Self, FetchError> {
        let attendance_date = self
            .attendance_date
            .pred_opt()
            .ok_or(FetchError::DateOutOfRange(self.attendance_date))?;
        Ok(Self::new(attendance_date, self.subject_id.clone()))
    }

    /// `{base}/history?start=YYYY-MM-DD&sponsorId=ID`, with the subject percent-encoded.
    pub fn to_url(&self, base: &Url) -> Result<Url, FetchError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidBaseUrl(base.to_string()))?
            .pop_if_empty()
            .push(HISTORY_SEGMENT);
        url.query_pairs_mut()
            .clear()
            .append_pair(START_PARAM, &iso_date(self.attendance_date))
            .append_pair(SPONSOR_PARAM, &self.subject_id);
        Ok(url)
    }

    /// Recovers the query from a URL built by [`AttendanceQuery::to_url`].
    pub fn from_url(url: &Url) -> Option<Self> {
        if url.path_segments()?.next_back()? != HISTORY_SEGMENT {
            return None;
        }

        let mut start = None;
        let mut subject = None;
        for (key, value) in url.query_pairs() {
            match &*key {
                START_PARAM => start = Some(value.into_owned()),
                SPONSOR_PARAM => subject = Some(value.into_owned()),
                _ => {}
            }
        }

        let attendance_date = NaiveDate::parse_from_str(&start?, "%Y-%m-%d").ok()?;
        Some(Self::new(attendance_date, subject?))
    }
}

/// One entry of `data`, kept verbatim.
///
/// Records are not validated on decode; a record whose `patient.id` is
/// missing or not a string simply never matches a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttendanceRecord(Value);

impl AttendanceRecord {
    /// `patient.id` when it is present and a string.
    pub fn patient_id(&self) -> Option<&str> {
        self.0.get("patient")?.get("id")?.as_str()
    }

    /// Top-level field of the record.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The record as the API sent it.
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for AttendanceRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Decoded body of the history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceResponse {
    /// Records in the order the API returned them.
    pub data: Vec<AttendanceRecord>,
    /// Other top-level fields (paging and the like), verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AttendanceResponse {
    /// A response with no records and nothing else.
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            extra: Map::new(),
        }
    }

    /// The not-found predicate: true iff `data` is empty.
    pub fn is_not_found(&self) -> bool {
        self.data.is_empty()
    }

    /// First record, in API order, whose `patient.id` equals `subject_id`.
    pub fn find_patient(&self, subject_id: &str) -> Option<&AttendanceRecord> {
        self.data.iter().find(|record| record.patient_id() == Some(subject_id))
    }
}
