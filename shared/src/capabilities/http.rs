use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::{GeoPoint, Tool, ToolLocation, UserId};

pub use crux_http::protocol::{HttpRequest, HttpResponse, HttpResult};
pub use crux_http::Error as HttpError;

pub const MAX_URL_LENGTH: usize = 2048;

pub const HELLO_PATH: &str = "api/hello";
pub const TOOLS_PATH: &str = "tools";
pub const USERS_PATH: &str = "users";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("invalid backend url '{url}': {reason}")]
    Invalid { url: String, reason: String },
}

/// Backend origin every API call is issued against.
///
/// Unlike a generic request URL this is allowed to point at `localhost`: the
/// default backend for the demo runs there.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackendUrl(Url);

impl BackendUrl {
    pub fn parse(raw: &str) -> Result<Self, UrlError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Self::invalid(raw, "URL cannot be empty"));
        }

        if trimmed.len() > MAX_URL_LENGTH {
            return Err(Self::invalid(
                &trimmed.chars().take(64).collect::<String>(),
                &format!("URL exceeds maximum length of {MAX_URL_LENGTH} bytes"),
            ));
        }

        let mut parsed = Url::parse(trimmed).map_err(|e| Self::invalid(trimmed, &e.to_string()))?;

        let scheme = parsed.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(Self::invalid(
                trimmed,
                &format!("invalid scheme '{scheme}', only 'http' and 'https' are allowed"),
            ));
        }

        if parsed.host_str().is_none() {
            return Err(Self::invalid(trimmed, "URL must have a host"));
        }

        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(Self::invalid(trimmed, "URL must not carry a query or fragment"));
        }

        // `join` replaces the last path segment unless the base ends with '/'.
        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }

        Ok(Self(parsed))
    }

    fn invalid(url: &str, reason: &str) -> UrlError {
        UrlError::Invalid {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    fn endpoint(&self, path: &str) -> Url {
        // Paths are static and relative, so joining onto a validated base cannot fail.
        self.0.join(path).unwrap_or_else(|_| self.0.clone())
    }

    #[must_use]
    pub fn hello(&self) -> Url {
        self.endpoint(HELLO_PATH)
    }

    #[must_use]
    pub fn users(&self) -> Url {
        self.endpoint(USERS_PATH)
    }

    /// Tool listing endpoint, scoped to a search radius around `near` when a
    /// position is known. Without one the URL carries no query string.
    #[must_use]
    pub fn tools(&self, near: Option<GeoPoint>) -> Url {
        let mut url = self.endpoint(TOOLS_PATH);
        if let Some(point) = near {
            url.query_pairs_mut()
                .append_pair("lat", &point.lat().to_string())
                .append_pair("lng", &point.lng().to_string())
                .append_pair("radius_km", &crate::SEARCH_RADIUS_KM.to_string());
        }
        url
    }
}

impl std::fmt::Display for BackendUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str().trim_end_matches('/'))
    }
}

/// Body of `GET /api/hello`. Anything unparseable is treated as `{}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HelloResponse {
    #[serde(default)]
    pub message: Option<String>,
}

impl HelloResponse {
    #[must_use]
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    /// Status text for a probe that got an answer: the non-empty `message`,
    /// otherwise `fallback`.
    #[must_use]
    pub fn status_or(self, fallback: &str) -> String {
        self.message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolPage {
    #[serde(default, deserialize_with = "skip_malformed_tools")]
    pub items: Vec<Tool>,
}

/// One bad record must not cost the rest of the page.
fn skip_malformed_tools<'de, D>(deserializer: D) -> Result<Vec<Tool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Tool>(item) {
            Ok(tool) => Some(tool),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed tool record");
                None
            }
        })
        .collect())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub tokens: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateUserResponse {
    #[serde(default)]
    pub id: Option<String>,
}

impl CreateUserResponse {
    /// The id the backend assigned, ignoring a missing or empty one.
    #[must_use]
    pub fn user_id(self) -> Option<UserId> {
        self.id.filter(|id| !id.is_empty()).map(UserId::new)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateToolRequest {
    pub owner_id: UserId,
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<ToolLocation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> BackendUrl {
        BackendUrl::parse("http://localhost:8000").unwrap()
    }

    #[test]
    fn accepts_localhost_and_https() {
        assert!(BackendUrl::parse("http://localhost:8000").is_ok());
        assert!(BackendUrl::parse("https://api.example.com").is_ok());
        assert!(BackendUrl::parse("  https://api.example.com/  ").is_ok());
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(BackendUrl::parse("").is_err());
        assert!(BackendUrl::parse("   ").is_err());
        assert!(BackendUrl::parse("localhost:8000").is_err());
        assert!(BackendUrl::parse("ftp://files.example.com").is_err());
        assert!(BackendUrl::parse("https://api.example.com/?x=1").is_err());
        assert!(BackendUrl::parse(&format!("https://{}.com", "a".repeat(MAX_URL_LENGTH))).is_err());
    }

    #[test]
    fn endpoints_join_onto_base() {
        assert_eq!(base().hello().as_str(), "http://localhost:8000/api/hello");
        assert_eq!(base().users().as_str(), "http://localhost:8000/users");
        assert_eq!(base().tools(None).as_str(), "http://localhost:8000/tools");
    }

    #[test]
    fn endpoints_keep_base_path_prefix() {
        let base = BackendUrl::parse("https://example.com/backend").unwrap();
        assert_eq!(base.hello().as_str(), "https://example.com/backend/api/hello");
        assert_eq!(base.to_string(), "https://example.com/backend");
    }

    #[test]
    fn tools_url_carries_location_scope() {
        let near = GeoPoint::new(40.0, -73.0).unwrap();
        assert_eq!(
            base().tools(Some(near)).as_str(),
            "http://localhost:8000/tools?lat=40&lng=-73&radius_km=25"
        );
    }

    #[test]
    fn tools_url_keeps_zero_coordinates() {
        let near = GeoPoint::new(0.0, 0.0).unwrap();
        assert_eq!(
            base().tools(Some(near)).as_str(),
            "http://localhost:8000/tools?lat=0&lng=0&radius_km=25"
        );
    }

    #[test]
    fn hello_body_falls_back_to_empty_object() {
        assert_eq!(HelloResponse::from_body(b"<html>oops</html>"), HelloResponse::default());
        assert_eq!(
            HelloResponse::from_body(br#"{"message":"Hello from backend"}"#).message.as_deref(),
            Some("Hello from backend")
        );
    }

    #[test]
    fn hello_status_prefers_non_empty_message() {
        let connected = crate::CONNECTED_STATUS;
        assert_eq!(HelloResponse::from_body(br#"{"message":"Up"}"#).status_or(connected), "Up");
        assert_eq!(HelloResponse::from_body(br#"{"message":""}"#).status_or(connected), connected);
        assert_eq!(HelloResponse::from_body(b"").status_or(connected), connected);
    }

    #[test]
    fn tool_page_defaults_missing_items() {
        let page: ToolPage = serde_json::from_str("{}").unwrap();
        assert!(page.items.is_empty());
    }

    #[test]
    fn tool_page_skips_malformed_records() {
        let page: ToolPage = serde_json::from_str(
            r#"{"items":[{"id":"t1","title":"Ladder"},{"title":"no id"},{"id":7,"title":"numeric"},{"id":"t2"}]}"#,
        )
        .unwrap();
        let ids: Vec<_> = page.items.iter().map(|t| t.id.to_string()).collect();
        assert_eq!(ids, ["t1", "t2"]);
    }

    #[test]
    fn empty_user_id_is_ignored() {
        let response = CreateUserResponse { id: Some(String::new()) };
        assert_eq!(response.user_id(), None);
        let response = CreateUserResponse { id: Some("u1".into()) };
        assert_eq!(response.user_id(), Some(UserId::new("u1")));
    }

    #[test]
    fn create_tool_omits_unknown_location() {
        let request = CreateToolRequest {
            owner_id: UserId::new("u1"),
            title: "Drill".into(),
            description: String::new(),
            category: String::new(),
            location: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("location").is_none());
        assert_eq!(json["owner_id"], "u1");
    }
}
