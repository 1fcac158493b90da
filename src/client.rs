use crate::error::{ApiError, ReportError};
use crate::models::{
    ApiEnvelope, CommissionRecord, ErrorBody, ReportFilters, ReportWindow, SessionContext,
};
use log::{debug, info};
use reqwest::{Client as HttpClient, Method, RequestBuilder, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

pub const BASE_URL: &str = "https://api2.okanjo.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const SESSIONS_PATH: &str = "/accounts/sessions";
const COMMISSION_REPORT_PATH: &str = "/farm/reporting/commissions";

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Okanjo API client bound to one API key.
///
/// Every request identifies the key through HTTP basic auth; authenticated
/// routes add the session token as the password half.
#[derive(Clone)]
pub struct Client {
    api_key: String,
    http: HttpClient,
    base_url: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Client {
    /// Create a new client with the default base URL and timeout.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ReportError> {
        Self::with_timeout(api_key, DEFAULT_TIMEOUT)
    }

    /// Create a new client with a custom per-request timeout.
    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Result<Self, ReportError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ReportError::MissingCredential("API_KEY"));
        }

        let http = HttpClient::builder().timeout(timeout).build()?;

        info!("Initialized Okanjo API client with default base URL");
        Ok(Self {
            api_key,
            http,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Override the base URL (useful for tests or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        info!("Updated Okanjo API base URL to {}", self.base_url);
        self
    }

    /// Base URL every route is resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Log in with account credentials.
    pub async fn create_session(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionContext, ReportError> {
        debug!("Creating session for {}", email);
        let request = self
            .request(Method::POST, self.endpoint(SESSIONS_PATH)?, None)
            .json(&LoginRequest { email, password });
        let response = self.send(request).await.map_err(|err| match err {
            ReportError::Api(api) => ReportError::Authentication(api),
            other => other,
        })?;
        let context: SessionContext = Self::decode(response).await?;
        info!(
            "Logged in as account {} (session {})",
            context.account.id, context.session.id
        );
        Ok(context)
    }

    /// Fetch every commission inside `window`, in a single response.
    pub async fn fetch_commissions(
        &self,
        token: &str,
        window: &ReportWindow,
        filters: &ReportFilters,
    ) -> Result<Vec<CommissionRecord>, ReportError> {
        let mut params = vec![("start", window.start_iso()), ("end", window.end_iso())];
        params.extend(filters.query_pairs());
        let url = Url::parse_with_params(&self.url(COMMISSION_REPORT_PATH), &params)
            .map_err(|_| ReportError::InvalidParameter("base url is not a valid url"))?;

        debug!("Fetching commission report for {}", window);
        let response = self
            .send(self.request(Method::GET, url, Some(token)))
            .await?;
        let records: Vec<CommissionRecord> = Self::decode(response).await?;
        info!("Commission report returned {} records", records.len());
        Ok(records)
    }

    /// Revoke a session so it does not linger until expiry.
    pub async fn delete_session(
        &self,
        account_id: &str,
        session_id: &str,
        token: &str,
    ) -> Result<(), ReportError> {
        let path = format!("/accounts/{}/sessions/{}", account_id, session_id);
        let url = self.endpoint(&path)?;
        self.send(self.request(Method::DELETE, url, Some(token)))
            .await?;
        info!("Ended session {}", session_id);
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ReportError> {
        Url::parse(&self.url(path))
            .map_err(|_| ReportError::InvalidParameter("base url is not a valid url"))
    }

    fn request(&self, method: Method, url: Url, token: Option<&str>) -> RequestBuilder {
        debug!("{} request to {}", method, url);
        self.http.request(method, url).basic_auth(&self.api_key, token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ReportError> {
        let response = request.send().await?;
        let status = response.status();
        debug!("Received status {}", status);
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(ErrorBody::into_message)
            .unwrap_or(body);
        Err(ReportError::Api(ApiError::from_status(status, message)))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ReportError> {
        let body = response.text().await?;
        let envelope: ApiEnvelope<T> = serde_json::from_str(&body).map_err(|err| {
            debug!("Failed to decode response body: {}", err);
            ReportError::InvalidResponse
        })?;
        Ok(envelope.data)
    }
}
