use crate::clinics::vitaldoc::attendance::{AttendanceQuery, AttendanceResponse};
use crate::configs::config_vitaldoc::VitalDocConfig;
use crate::retrieve::ky_http::{ApiClient, FetchError, HttpTransport};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use url::Url;

/// Authenticated access to the VitalDoc attendance history endpoint.
///
/// One call to [`VitalDocApi::send_request`] is exactly one GET; retries and
/// fallbacks live in the fetcher.
pub struct VitalDocApi<T> {
    transport: T,
    base_url: Url,
    token: String,
}

impl<T: HttpTransport> VitalDocApi<T> {
    /// Wraps `transport` for the API rooted at `base_url`.
    pub fn new(transport: T, base_url: Url, token: impl Into<String>) -> Self {
        Self {
            transport,
            base_url,
            token: token.into(),
        }
    }

    /// Root the `history` segment is appended to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `Authorization: Bearer <token>`, flagged sensitive so it never shows in debug output.
    pub fn create_headers(&self) -> Result<HeaderMap, FetchError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| FetchError::InvalidHeader("Authorization"))?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    /// Issues one GET for `query` and decodes the body.
    pub async fn send_request(&self, query: &AttendanceQuery) -> Result<AttendanceResponse, FetchError> {
        let url = query.to_url(&self.base_url)?;
        let headers = self.create_headers()?;
        let body = self.transport.get_json(url, headers).await?;
        Ok(serde_json::from_value(body)?)
    }
}

impl VitalDocApi<ApiClient> {
    /// Builds a `reqwest`-backed API from a validated configuration.
    pub fn from_config(config: &VitalDocConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let client = ApiClient::new(config.retry.timeout())?;
        Ok(Self::new(client, config.base_url()?, config.token.clone()))
    }
}
