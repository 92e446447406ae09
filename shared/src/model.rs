use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

use crate::capabilities::http::BackendUrl;

// --- Typed IDs ---

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(UserId);
typed_id!(ToolId);

// --- Coordinates ---

#[derive(Debug, Clone, Copy, Error, PartialEq)]
pub enum CoordinateError {
    #[error("Latitude {0} is out of valid range [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("Longitude {0} is out of valid range [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("Coordinate value is not finite (NaN or Infinity)")]
    NonFinite,
}

/// A fully known position. Both halves are set together or not at all, and
/// `0.0` is an ordinary value (equator / prime meridian), not "unknown".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateError::LongitudeOutOfRange(lng));
        }
        Ok(Self { lat, lng })
    }

    #[must_use]
    pub const fn lat(self) -> f64 {
        self.lat
    }

    #[must_use]
    pub const fn lng(self) -> f64 {
        self.lng
    }
}

impl TryFrom<(f64, f64)> for GeoPoint {
    type Error = CoordinateError;

    fn try_from((lat, lng): (f64, f64)) -> Result<Self, Self::Error> {
        Self::new(lat, lng)
    }
}

// --- Tool listing ---

/// Location as it travels over the wire. Records coming back from the
/// backend may omit either half.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolLocation {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

impl From<GeoPoint> for ToolLocation {
    fn from(point: GeoPoint) -> Self {
        Self {
            lat: Some(point.lat()),
            lng: Some(point.lng()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub id: ToolId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<ToolLocation>,
}

impl Tool {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: ToolId::new(id),
            title: title.into(),
            description: None,
            category: None,
            location: None,
        }
    }
}

// --- Form buffers ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserForm {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolForm {
    pub title: String,
    pub category: String,
    pub description: String,
}

impl ToolForm {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

// --- Notices ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub message: String,
    pub kind: NoticeKind,
}

impl Notice {
    pub fn new(message: impl Into<String>, kind: NoticeKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

// --- Model ---

/// Which mutation a response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationKind {
    CreateUser,
    CreateTool,
}

/// Everything the controller knows. Lives for one app session; nothing is
/// persisted.
#[derive(Debug, Clone)]
pub struct Model {
    pub backend_url: BackendUrl,
    pub bootstrapped: bool,

    status: String,
    coords: Option<GeoPoint>,
    tools: Vec<Tool>,
    user_id: Option<UserId>,

    pub user_form: UserForm,
    pub tool_form: ToolForm,

    mutations_in_flight: u32,
    listing_generation: u64,

    pub notice: Option<Notice>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            backend_url: crate::config::AppConfig::default().backend_url,
            bootstrapped: false,
            status: String::new(),
            coords: None,
            tools: Vec::new(),
            user_id: None,
            user_form: UserForm::default(),
            tool_form: ToolForm::default(),
            mutations_in_flight: 0,
            listing_generation: 0,
            notice: None,
        }
    }
}

impl Model {
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Records the health probe outcome. The status is written once per
    /// session; later writes are dropped. Returns whether it was applied.
    pub fn set_status(&mut self, status: impl Into<String>) -> bool {
        let status = status.into();
        if !self.status.is_empty() {
            warn!(current = %self.status, ignored = %status, "status already set");
            return false;
        }
        self.status = status;
        true
    }

    #[must_use]
    pub const fn coords(&self) -> Option<GeoPoint> {
        self.coords
    }

    /// Stores the first position fix. Returns `true` only on the
    /// unknown-to-known transition; a second fix is ignored.
    pub fn set_coords(&mut self, point: GeoPoint) -> bool {
        if self.coords.is_some() {
            debug!("position already known, ignoring new fix");
            return false;
        }
        self.coords = Some(point);
        true
    }

    #[must_use]
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn set_tools(&mut self, tools: Vec<Tool>) {
        self.tools = tools;
    }

    #[must_use]
    pub const fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn set_user_id(&mut self, user_id: UserId) {
        if let Some(previous) = &self.user_id {
            warn!(previous = %previous, replacement = %user_id, "replacing existing user id");
        }
        self.user_id = Some(user_id);
    }

    #[must_use]
    pub const fn creating(&self) -> bool {
        self.mutations_in_flight > 0
    }

    pub fn begin_mutation(&mut self, kind: MutationKind) {
        self.mutations_in_flight += 1;
        debug!(?kind, in_flight = self.mutations_in_flight, "mutation started");
    }

    pub fn settle_mutation(&mut self, kind: MutationKind) {
        self.mutations_in_flight = self.mutations_in_flight.saturating_sub(1);
        debug!(?kind, in_flight = self.mutations_in_flight, "mutation settled");
    }

    /// Stamps a new listing request. Only the response carrying the latest
    /// stamp may replace the listing.
    pub fn next_listing_generation(&mut self) -> u64 {
        self.listing_generation += 1;
        self.listing_generation
    }

    #[must_use]
    pub const fn is_current_listing(&self, generation: u64) -> bool {
        generation == self.listing_generation
    }

    pub fn show_notice(&mut self, message: impl Into<String>, kind: NoticeKind) {
        self.notice = Some(Notice::new(message, kind));
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }
}
