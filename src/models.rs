use crate::error::ReportError;
use chrono::{DateTime, Days, NaiveDate, NaiveTime, SecondsFormat, Utc};
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Success wrapper used by every Okanjo route: `{ "statusCode": 200, "data": .. }`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    pub data: T,
}

/// Error body returned alongside non-success statuses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    pub(crate) fn into_message(self) -> String {
        match (self.error, self.message) {
            (_, Some(message)) if !message.is_empty() => message,
            (Some(error), _) => error,
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Clone, Deserialize)]
pub struct Session {
    pub id: String,
    pub token: String,
    #[serde(default, deserialize_with = "deserialize_datetime_opt")]
    pub expires: Option<DateTime<Utc>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("token", &"<token>")
            .field("expires", &self.expires)
            .finish()
    }
}

/// Payload of a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionContext {
    pub account: Account,
    pub session: Session,
}

/// One commission as reported by the farm reporting API.
///
/// The schema belongs to the server, so the record is kept as the raw JSON
/// object and serializes back exactly as it was received. Accessors pull out
/// the handful of fields the flat export needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommissionRecord(Map<String, Value>);

impl CommissionRecord {
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Scalar field rendered as text; `None` for missing, null or structured values.
    pub fn text(&self, key: &str) -> Option<String> {
        self.field(key).and_then(json_value_to_string)
    }

    pub fn id(&self) -> Option<String> {
        self.text("id")
    }

    pub fn offer_title(&self) -> Option<String> {
        self.text("offer_title")
    }

    pub fn geo(&self) -> Geo<'_> {
        Geo(self.field("geo").and_then(Value::as_object))
    }

    /// `transaction_commission` as an exact decimal, if it holds a number.
    pub fn commission_amount(&self) -> Option<Decimal> {
        self.field("transaction_commission").and_then(json_value_to_decimal)
    }
}

impl From<Map<String, Value>> for CommissionRecord {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

/// Borrowed view of a record's `geo` object.
#[derive(Debug, Clone, Copy)]
pub struct Geo<'a>(Option<&'a Map<String, Value>>);

impl Geo<'_> {
    fn get(&self, key: &str) -> Option<String> {
        self.0
            .and_then(|m| m.get(key))
            .and_then(json_value_to_string)
            .filter(|s| !s.is_empty())
    }

    pub fn city(&self) -> Option<String> {
        self.get("city")
    }

    /// State or province, preferring the short code.
    pub fn region(&self) -> Option<String> {
        self.get("sub_1_code")
            .or_else(|| self.get("sub_1"))
            .or_else(|| self.get("sub_2_code"))
    }

    pub fn country(&self) -> Option<String> {
        self.get("country")
    }
}

/// Half-open reporting range `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl ReportWindow {
    pub const DEFAULT_DAYS: u32 = 30;

    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ReportError> {
        if start >= end {
            return Err(ReportError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The `days` full days before `now`, excluding today.
    pub fn trailing_days(now: DateTime<Utc>, days: u32) -> Result<Self, ReportError> {
        if days == 0 {
            return Err(ReportError::InvalidParameter("days must be at least 1"));
        }
        let end = start_of_day(now.date_naive());
        let start = end
            .checked_sub_days(Days::new(days.into()))
            .ok_or(ReportError::InvalidParameter("days reaches before the supported range"))?;
        Self::new(start, end)
    }

    /// Midnight of `start` up to midnight of `end`.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self, ReportError> {
        Self::new(start_of_day(start), start_of_day(end))
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn start_iso(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn end_iso(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl fmt::Display for ReportWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start_iso(), self.end_iso())
    }
}

/// Optional narrowing of the commission report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilters {
    pub instance_ids: Vec<String>,
}

impl ReportFilters {
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if !self.instance_ids.is_empty() {
            pairs.push(("instance_ids", self.instance_ids.join(",")));
        }
        pairs
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn deserialize_datetime_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| match DateTime::parse_from_rfc3339(&s) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(_) => {
            debug!("Ignoring unparseable session expiry {s:?}");
            None
        }
    }))
}

fn json_value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn json_value_to_decimal(value: &Value) -> Option<Decimal> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample_record() -> CommissionRecord {
        serde_json::from_value(json!({
            "id": "c1",
            "transaction_date": "2024-01-01",
            "transaction_total": 10,
            "transaction_commission": 1.25,
            "offer_title": "A \"Deal\"",
            "placement_id": null,
            "geo": { "city": "Austin", "sub_1_code": "", "sub_1": "Texas", "country": "US" }
        }))
        .expect("record should parse")
    }

    #[test]
    fn reads_record_fields() {
        let record = sample_record();
        assert_eq!(record.id().as_deref(), Some("c1"));
        assert_eq!(record.text("transaction_total").as_deref(), Some("10"));
        assert_eq!(record.text("placement_id"), None);
        assert_eq!(record.text("geo"), None);
        assert_eq!(record.commission_amount(), Decimal::from_str("1.25").ok());
    }

    #[test]
    fn geo_region_skips_empty_codes() {
        let record = sample_record();
        let geo = record.geo();
        assert_eq!(geo.city().as_deref(), Some("Austin"));
        assert_eq!(geo.region().as_deref(), Some("Texas"));
        assert_eq!(geo.country().as_deref(), Some("US"));
    }

    #[test]
    fn missing_geo_yields_nothing() {
        let record = CommissionRecord::from(Map::new());
        assert_eq!(record.geo().city(), None);
        assert_eq!(record.geo().region(), None);
        assert_eq!(record.geo().country(), None);
    }

    #[test]
    fn record_serializes_verbatim() {
        let raw = json!({ "id": "c9", "nested": { "a": [1, 2, null] }, "flag": false });
        let record: CommissionRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&record).unwrap(), raw);
    }

    #[test]
    fn commission_amount_accepts_strings() {
        let record: CommissionRecord =
            serde_json::from_value(json!({ "transaction_commission": " 3.10 " })).unwrap();
        assert_eq!(record.commission_amount(), Decimal::from_str("3.10").ok());
    }

    #[test]
    fn trailing_window_truncates_to_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 17, 42, 5).unwrap();
        let window = ReportWindow::trailing_days(now, 30).unwrap();
        assert_eq!(window.start_iso(), "2024-02-14T00:00:00.000Z");
        assert_eq!(window.end_iso(), "2024-03-15T00:00:00.000Z");
    }

    #[test]
    fn rejects_empty_or_inverted_windows() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        assert!(matches!(
            ReportWindow::trailing_days(now, 0),
            Err(ReportError::InvalidParameter(_))
        ));
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert!(matches!(
            ReportWindow::from_dates(day, day),
            Err(ReportError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn parses_session_context() {
        let ctx: SessionContext = serde_json::from_value(json!({
            "account": { "id": "AC1", "email": "me@example.com", "name": "Me" },
            "session": { "id": "SS1", "token": "secret", "expires": "2024-01-15T00:00:00.000Z" }
        }))
        .unwrap();
        assert_eq!(ctx.account.id, "AC1");
        assert_eq!(ctx.session.id, "SS1");
        assert_eq!(
            ctx.session.expires,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap())
        );
        assert!(!format!("{:?}", ctx.session).contains("secret"));
    }

    #[test]
    fn malformed_expiry_is_ignored() {
        let session: Session =
            serde_json::from_value(json!({ "id": "S", "token": "t", "expires": "soon" })).unwrap();
        assert_eq!(session.expires, None);
    }

    #[test]
    fn filters_only_emit_non_empty_ids() {
        assert!(ReportFilters::default().query_pairs().is_empty());
        let filters = ReportFilters {
            instance_ids: vec!["i1".into(), "i2".into()],
        };
        assert_eq!(filters.query_pairs(), vec![("instance_ids", "i1,i2".to_string())]);
    }
}
