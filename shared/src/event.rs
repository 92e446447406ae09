use serde::{Deserialize, Serialize};

use crate::capabilities::geolocation::GeolocationResult;
use crate::capabilities::http::{CreateUserResponse, ToolPage};

pub type BytesResponse = crux_http::Result<crux_http::Response<Vec<u8>>>;
pub type ToolPageResponse = crux_http::Result<crux_http::Response<ToolPage>>;
pub type CreateUserResult = crux_http::Result<crux_http::Response<CreateUserResponse>>;

/// Events sent by the shell, plus the internal capability responses (marked
/// `serde(skip)`, the shell never constructs those).
#[derive(Serialize, Deserialize, Debug)]
pub enum Event {
    // Lifecycle
    Started {
        backend_url: Option<String>,
        geolocation_available: bool,
    },

    // Forms
    UserNameChanged(String),
    UserEmailChanged(String),
    CreateUserSubmitted,

    ToolTitleChanged(String),
    ToolCategoryChanged(String),
    ToolDescriptionChanged(String),
    CreateToolSubmitted,

    // Listing
    RefreshRequested,

    NoticeDismissed,

    // Capability responses (boxed to keep enum size small)
    #[serde(skip)]
    HelloResponse(Box<BytesResponse>),
    #[serde(skip)]
    PositionResolved(Box<GeolocationResult>),
    #[serde(skip)]
    ToolsResponse {
        generation: u64,
        result: Box<ToolPageResponse>,
    },
    #[serde(skip)]
    UserCreated(Box<CreateUserResult>),
    #[serde(skip)]
    ToolCreated(Box<BytesResponse>),
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::UserNameChanged(_) => "user_name_changed",
            Self::UserEmailChanged(_) => "user_email_changed",
            Self::CreateUserSubmitted => "create_user_submitted",
            Self::ToolTitleChanged(_) => "tool_title_changed",
            Self::ToolCategoryChanged(_) => "tool_category_changed",
            Self::ToolDescriptionChanged(_) => "tool_description_changed",
            Self::CreateToolSubmitted => "create_tool_submitted",
            Self::RefreshRequested => "refresh_requested",
            Self::NoticeDismissed => "notice_dismissed",
            Self::HelloResponse(_) => "hello_response",
            Self::PositionResolved(_) => "position_resolved",
            Self::ToolsResponse { .. } => "tools_response",
            Self::UserCreated(_) => "user_created",
            Self::ToolCreated(_) => "tool_created",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::CreateUserSubmitted
                | Self::CreateToolSubmitted
                | Self::RefreshRequested
                | Self::NoticeDismissed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_events_round_trip_through_json() {
        let event: Event = serde_json::from_str(
            r#"{"Started":{"backend_url":"http://localhost:8000","geolocation_available":true}}"#,
        )
        .unwrap();
        assert_eq!(event.name(), "started");

        let event: Event = serde_json::from_str(r#"{"ToolTitleChanged":"Drill"}"#).unwrap();
        assert!(matches!(event, Event::ToolTitleChanged(ref t) if t == "Drill"));
    }

    #[test]
    fn internal_events_cannot_come_from_the_shell() {
        assert!(serde_json::from_str::<Event>(r#"{"UserCreated":null}"#).is_err());
    }

    #[test]
    fn submissions_are_user_initiated() {
        assert!(Event::CreateUserSubmitted.is_user_initiated());
        assert!(Event::RefreshRequested.is_user_initiated());
        assert!(!Event::UserNameChanged("a".into()).is_user_initiated());
    }

    #[test]
    fn event_size_is_reasonable() {
        let size = std::mem::size_of::<Event>();
        assert!(size <= 64, "Event enum is {size} bytes, box more variants");
    }
}
