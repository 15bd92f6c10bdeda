//! The persisted token record.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// The flat key/value document a record is persisted as.
pub type TokenDocument = Map<String, Value>;

/// The single OAuth token pair this service runs on.
///
/// Provider fields other than the three required ones (`scope`,
/// `token_type`, `expires_in`, ...) are kept in [`TokenRecord::extra`] and
/// written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Short-lived bearer token for API calls.
    pub access_token: String,

    /// Long-lived token used to mint new access tokens.
    pub refresh_token: String,

    pub expires_at: ExpiresAt,

    /// Provider fields passed through untouched.
    #[serde(flatten)]
    pub extra: TokenDocument,
}

impl TokenRecord {
    /// Keys owned by the typed fields. Never present in `extra`.
    pub const REQUIRED_FIELDS: [&'static str; 3] =
        ["access_token", "refresh_token", "expires_at"];

    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at: ExpiresAt::from_secs(expires_at),
            extra: TokenDocument::new(),
        }
    }

    /// Adds a passthrough provider field. Required field names are ignored.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if !Self::REQUIRED_FIELDS.contains(&key.as_str()) {
            self.extra.insert(key, value.into());
        }
        self
    }

    /// Returns true if the access token expired strictly before `now`.
    ///
    /// A record expiring exactly at `now` is still usable.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_before(now)
    }

    /// Converts the record into its persisted document form.
    pub fn to_document(&self) -> serde_json::Result<TokenDocument> {
        match serde_json::to_value(self)? {
            Value::Object(document) => Ok(document),
            other => Err(de::Error::custom(format!(
                "token record serialized to a non-object: {other}"
            ))),
        }
    }

    /// Parses a persisted document.
    ///
    /// Fails when any of `access_token`, `refresh_token` or `expires_at` is
    /// missing or mistyped.
    pub fn from_document(document: TokenDocument) -> serde_json::Result<Self> {
        serde_json::from_value(Value::Object(document))
    }
}

/// Expiry instant in seconds since the Unix epoch.
///
/// Kept as the JSON number it was read as, so fractional timestamps written
/// by other tools survive a load/save cycle and compare at sub-second
/// precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpiresAt(Number);

impl ExpiresAt {
    pub fn from_secs(secs: i64) -> Self {
        Self(Number::from(secs))
    }

    /// Whole seconds, rounded down. Saturates for out-of-range values.
    pub fn secs(&self) -> i64 {
        match self.0.as_i64() {
            Some(secs) => secs,
            None => self.0.as_f64().map_or(i64::MAX, |secs| secs.floor() as i64),
        }
    }

    /// Strict less-than against `now`.
    ///
    /// Integer expiries compare against whole seconds; fractional ones
    /// against microseconds.
    pub fn is_before(&self, now: DateTime<Utc>) -> bool {
        if let Some(secs) = self.0.as_i64() {
            return secs < now.timestamp();
        }
        match self.0.as_f64() {
            Some(secs) => secs * 1_000_000.0 < now.timestamp_micros() as f64,
            None => false,
        }
    }
}

impl From<i64> for ExpiresAt {
    fn from(secs: i64) -> Self {
        Self::from_secs(secs)
    }
}

impl PartialEq<i64> for ExpiresAt {
    fn eq(&self, other: &i64) -> bool {
        self.0.as_i64() == Some(*other)
    }
}

impl fmt::Display for ExpiresAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn document(value: Value) -> TokenDocument {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn expiry_boundary_is_strict() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert!(!TokenRecord::new("a", "r", 1_700_000_000).is_expired_at(now));
        assert!(!TokenRecord::new("a", "r", 1_700_000_001).is_expired_at(now));
        assert!(TokenRecord::new("a", "r", 1_699_999_999).is_expired_at(now));
    }

    #[test]
    fn provider_fields_pass_through() {
        let doc = document(json!({
            "access_token": "A",
            "refresh_token": "R",
            "expires_at": 1_700_000_000,
            "scope": "user-library-read",
            "token_type": "Bearer",
            "expires_in": 3600,
        }));

        let record = TokenRecord::from_document(doc.clone()).unwrap();
        assert_eq!(record.access_token, "A");
        assert_eq!(record.extra.get("scope"), Some(&json!("user-library-read")));
        assert_eq!(record.extra.len(), 3);
        assert_eq!(record.to_document().unwrap(), doc);
    }

    #[test]
    fn fractional_expiry_keeps_precision() {
        let doc = document(json!({
            "access_token": "A",
            "refresh_token": "R",
            "expires_at": 1_700_000_000.75,
        }));
        let record = TokenRecord::from_document(doc.clone()).unwrap();

        assert_eq!(record.expires_at.secs(), 1_700_000_000);
        assert_eq!(record.to_document().unwrap(), doc);

        let before = Utc.timestamp_opt(1_700_000_000, 500_000_000).unwrap();
        let at = Utc.timestamp_opt(1_700_000_000, 750_000_000).unwrap();
        let after = Utc.timestamp_opt(1_700_000_000, 800_000_000).unwrap();
        assert!(!record.is_expired_at(before));
        assert!(!record.is_expired_at(at));
        assert!(record.is_expired_at(after));
    }

    #[test]
    fn integer_expiry_ignores_subsecond_now() {
        let record = TokenRecord::new("A", "R", 1_700_000_000);
        let now = Utc.timestamp_opt(1_700_000_000, 999_000_000).unwrap();
        assert!(!record.is_expired_at(now));
        assert_eq!(record.expires_at.to_string(), "1700000000");
    }

    #[test]
    fn partial_document_is_rejected() {
        let doc = document(json!({ "access_token": "x" }));
        assert!(TokenRecord::from_document(doc).is_err());

        let doc = document(json!({
            "access_token": "A",
            "refresh_token": "R",
            "expires_at": "tomorrow",
        }));
        assert!(TokenRecord::from_document(doc).is_err());
    }

    #[test]
    fn builder_adds_extra_fields() {
        let record = TokenRecord::new("A", "R", 10).with_extra("token_type", "Bearer");
        let doc = record.to_document().unwrap();
        assert_eq!(doc.get("token_type"), Some(&json!("Bearer")));
        assert_eq!(doc.get("expires_at"), Some(&json!(10)));
    }

    #[test]
    fn extra_cannot_shadow_required_fields() {
        let record = TokenRecord::new("A", "R", 10)
            .with_extra("access_token", "forged")
            .with_extra("expires_at", 99);
        assert!(record.extra.is_empty());

        let doc = record.to_document().unwrap();
        assert_eq!(doc.get("access_token"), Some(&json!("A")));
        assert_eq!(doc.get("expires_at"), Some(&json!(10)));
    }
}
