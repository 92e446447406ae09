// lib.rs - tool-sharing client core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod capabilities;
pub mod config;
pub mod event;
pub mod model;

use serde::{Deserialize, Serialize};

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::{AppConfig, ConfigError};
pub use crux_core::{render::Render, App as CruxApp};
pub use event::Event;
pub use model::{
    CoordinateError, GeoPoint, Model, MutationKind, Notice, NoticeKind, Tool, ToolForm, ToolId,
    ToolLocation, UserForm, UserId,
};

pub const SEARCH_RADIUS_KM: u32 = 25;
pub const INITIAL_TOKEN_GRANT: u32 = 10;

pub const CONNECTED_STATUS: &str = "Connected";
pub const UNREACHABLE_STATUS: &str = "Could not reach backend";
pub const PENDING_STATUS: &str = "...";

pub const NO_USER_NOTICE: &str = "Create/select a user first";
pub const LISTING_FAILED_NOTICE: &str = "Could not load tools";
pub const CREATE_USER_FAILED_NOTICE: &str = "Could not create user";
pub const CREATE_TOOL_FAILED_NOTICE: &str = "Could not add tool";

pub const LOCATION_READY_LABEL: &str = "Location ready";
pub const LOCATION_PENDING_LABEL: &str = "Waiting for location";
pub const EMPTY_LISTING_MESSAGE: &str = "No tools yet. Add one to get started.";
pub const NEEDS_USER_HINT: &str = "Create a user first";
pub const DEFAULT_CATEGORY_LABEL: &str = "Tool";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Server,
    Serialization,
    Deserialization,
    Validation,
    Configuration,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Server => "SERVER_ERROR",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::Configuration => "CONFIGURATION_ERROR",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub internal_message: Option<String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            internal_message: None,
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Classifies a transport failure. A status error still means the backend
    /// answered, so it is kept apart from plain network failures.
    #[must_use]
    pub fn from_http_error(error: &capabilities::HttpError) -> Self {
        use capabilities::HttpError;

        let kind = match error {
            HttpError::Http(_) => ErrorKind::Server,
            HttpError::Json(_) => ErrorKind::Deserialization,
            _ => ErrorKind::Network,
        };
        Self::new(kind, "Request failed").with_internal(error.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<CoordinateError> for AppError {
    fn from(e: CoordinateError) -> Self {
        AppError::new(ErrorKind::Validation, e.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::new(ErrorKind::Configuration, e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::new(ErrorKind::Serialization, "Could not encode request").with_internal(e.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolCard {
    pub id: String,
    pub category_label: String,
    pub title: String,
    pub description: Option<String>,
    pub location_text: Option<String>,
}

impl From<&Tool> for ToolCard {
    fn from(tool: &Tool) -> Self {
        let category_label = match tool.category.as_deref() {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => DEFAULT_CATEGORY_LABEL.to_string(),
        };

        let location_text = tool.location.map(|loc| {
            let fmt = |v: Option<f64>| v.map(|v| format!("{v:.4}")).unwrap_or_default();
            format!("loc: {}, {}", fmt(loc.lat), fmt(loc.lng))
        });

        Self {
            id: tool.id.0.clone(),
            category_label,
            title: tool.title.clone(),
            description: tool.description.clone().filter(|d| !d.is_empty()),
            location_text,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub backend_status: String,
    pub location_ready: bool,
    pub location_label: String,

    pub user_form: UserForm,
    pub user_id: Option<String>,
    pub create_user_label: String,
    pub can_create_user: bool,

    pub tool_form: ToolForm,
    pub add_tool_label: String,
    pub can_add_tool: bool,
    pub needs_user_hint: Option<String>,

    pub tools: Vec<ToolCard>,
    pub empty_listing_message: Option<String>,

    pub notice: Option<Notice>,
}

pub mod app {
    use tracing::{debug, info, warn};

    use super::*;
    use crate::capabilities::geolocation::GeolocationResult;
    use crate::capabilities::http::{
        CreateToolRequest, CreateUserRequest, CreateUserResponse, HelloResponse, HttpError,
        ToolPage,
    };
    use crate::event::{BytesResponse, CreateUserResult, ToolPageResponse};

    #[derive(Default)]
    pub struct App;

    impl App {
        fn send_hello(model: &Model, caps: &Capabilities) {
            let url = model.backend_url.hello();
            debug!(%url, "probing backend");
            caps.http
                .get(url.as_str())
                .send(|result| Event::HelloResponse(Box::new(result)));
        }

        fn send_refresh(model: &mut Model, caps: &Capabilities) {
            let generation = model.next_listing_generation();
            let url = model.backend_url.tools(model.coords());
            debug!(generation, %url, "refreshing tool listing");

            caps.http
                .get(url.as_str())
                .expect_json::<ToolPage>()
                .send(move |result| Event::ToolsResponse {
                    generation,
                    result: Box::new(result),
                });
        }

        fn send_create_user(model: &mut Model, caps: &Capabilities) -> AppResult<()> {
            let request = CreateUserRequest {
                name: model.user_form.name.clone(),
                email: model.user_form.email.clone(),
                tokens: INITIAL_TOKEN_GRANT,
            };
            let body = serde_json::to_vec(&request)?;

            model.begin_mutation(MutationKind::CreateUser);
            caps.http
                .post(model.backend_url.users().as_str())
                .header("Content-Type", "application/json")
                .body(body)
                .expect_json::<CreateUserResponse>()
                .send(|result| Event::UserCreated(Box::new(result)));
            Ok(())
        }

        fn send_create_tool(
            owner_id: UserId,
            model: &mut Model,
            caps: &Capabilities,
        ) -> AppResult<()> {
            let request = CreateToolRequest {
                owner_id,
                title: model.tool_form.title.clone(),
                description: model.tool_form.description.clone(),
                category: model.tool_form.category.clone(),
                location: model.coords().map(ToolLocation::from),
            };
            let body = serde_json::to_vec(&request)?;

            model.begin_mutation(MutationKind::CreateTool);
            caps.http
                .post(model.backend_url.tools(None).as_str())
                .header("Content-Type", "application/json")
                .body(body)
                .send(|result| Event::ToolCreated(Box::new(result)));
            Ok(())
        }

        fn handle_hello_response(result: BytesResponse, model: &mut Model) {
            let status = match result {
                Ok(response) => {
                    let body = response.body().map_or(&[][..], Vec::as_slice);
                    HelloResponse::from_body(body).status_or(CONNECTED_STATUS)
                }
                // The backend answered, just not with a 2xx; its body still counts.
                Err(HttpError::Http(error)) => {
                    debug!(code = %error.code, "health probe answered with an error status");
                    let body = error.body.as_deref().unwrap_or_default();
                    HelloResponse::from_body(body).status_or(CONNECTED_STATUS)
                }
                Err(e) => {
                    debug!(error = %e, "health probe failed");
                    UNREACHABLE_STATUS.to_string()
                }
            };

            info!(%status, "backend status");
            model.set_status(status);
        }

        /// Returns whether coordinates just became known.
        fn handle_position(result: GeolocationResult, model: &mut Model) -> bool {
            let position = match result {
                Ok(position) => position,
                Err(e) => {
                    debug!(error = %e, "no position fix");
                    return false;
                }
            };

            match GeoPoint::new(position.coords.latitude, position.coords.longitude) {
                Ok(point) => model.set_coords(point),
                Err(e) => {
                    debug!(error = %AppError::from(e), "ignoring invalid position fix");
                    false
                }
            }
        }

        fn handle_tools_response(generation: u64, result: ToolPageResponse, model: &mut Model) {
            if !model.is_current_listing(generation) {
                debug!(generation, "discarding stale tool listing");
                return;
            }

            match result {
                Ok(mut response) => {
                    let page = response.take_body().unwrap_or_default();
                    debug!(generation, count = page.items.len(), "tool listing received");
                    model.set_tools(page.items);
                }
                Err(e) => {
                    warn!(generation, error = %AppError::from_http_error(&e), "tool listing failed");
                    model.show_notice(LISTING_FAILED_NOTICE, NoticeKind::Error);
                }
            }
        }

        fn handle_user_created(result: CreateUserResult, model: &mut Model) {
            model.settle_mutation(MutationKind::CreateUser);

            match result {
                Ok(mut response) => {
                    match response.take_body().and_then(CreateUserResponse::user_id) {
                        Some(user_id) => {
                            info!(%user_id, "user created");
                            model.set_user_id(user_id);
                        }
                        None => warn!("user creation response carried no id"),
                    }
                }
                Err(e) => {
                    warn!(error = %AppError::from_http_error(&e), "user creation failed");
                    model.show_notice(CREATE_USER_FAILED_NOTICE, NoticeKind::Error);
                }
            }
        }

        fn handle_tool_created(result: &BytesResponse, model: &mut Model, caps: &Capabilities) {
            model.settle_mutation(MutationKind::CreateTool);

            match result {
                Ok(_) => info!("tool created"),
                Err(e) => {
                    warn!(error = %AppError::from_http_error(e), "tool creation failed");
                    model.show_notice(CREATE_TOOL_FAILED_NOTICE, NoticeKind::Error);
                }
            }

            // Cleared and refreshed whatever the outcome.
            model.tool_form.clear();
            Self::send_refresh(model, caps);
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            let event_name = event.name();
            debug!(event = event_name, "update");

            if event.is_user_initiated() {
                info!(event = event_name, "user action");
            }

            match event {
                Event::Started {
                    backend_url,
                    geolocation_available,
                } => {
                    if model.bootstrapped {
                        warn!("already started, ignoring");
                        return;
                    }
                    model.bootstrapped = true;

                    model.backend_url = match AppConfig::from_shell(backend_url.as_deref()) {
                        Ok(config) => config.backend_url,
                        Err(e) => {
                            warn!(error = %AppError::from(e), "falling back to default backend");
                            AppConfig::default().backend_url
                        }
                    };
                    info!(backend = %model.backend_url, geolocation_available, "starting");

                    Self::send_hello(model, caps);
                    if geolocation_available {
                        caps.geolocation
                            .get_current_position(|result| Event::PositionResolved(Box::new(result)));
                    }
                    Self::send_refresh(model, caps);

                    caps.render.render();
                }

                Event::UserNameChanged(name) => {
                    model.user_form.name = name;
                    caps.render.render();
                }

                Event::UserEmailChanged(email) => {
                    model.user_form.email = email;
                    caps.render.render();
                }

                Event::CreateUserSubmitted => {
                    if let Err(e) = Self::send_create_user(model, caps) {
                        warn!(error = %e, "could not submit user");
                        model.show_notice(CREATE_USER_FAILED_NOTICE, NoticeKind::Error);
                    }
                    caps.render.render();
                }

                Event::ToolTitleChanged(title) => {
                    model.tool_form.title = title;
                    caps.render.render();
                }

                Event::ToolCategoryChanged(category) => {
                    model.tool_form.category = category;
                    caps.render.render();
                }

                Event::ToolDescriptionChanged(description) => {
                    model.tool_form.description = description;
                    caps.render.render();
                }

                Event::CreateToolSubmitted => {
                    match model.user_id().cloned() {
                        Some(owner_id) => {
                            if let Err(e) = Self::send_create_tool(owner_id, model, caps) {
                                warn!(error = %e, "could not submit tool");
                                model.show_notice(CREATE_TOOL_FAILED_NOTICE, NoticeKind::Error);
                            }
                        }
                        None => {
                            info!("tool submitted without a user");
                            model.show_notice(NO_USER_NOTICE, NoticeKind::Warning);
                        }
                    }
                    caps.render.render();
                }

                Event::RefreshRequested => {
                    Self::send_refresh(model, caps);
                }

                Event::NoticeDismissed => {
                    model.clear_notice();
                    caps.render.render();
                }

                Event::HelloResponse(result) => {
                    Self::handle_hello_response(*result, model);
                    caps.render.render();
                }

                Event::PositionResolved(result) => {
                    if Self::handle_position(*result, model) {
                        Self::send_refresh(model, caps);
                    }
                    caps.render.render();
                }

                Event::ToolsResponse { generation, result } => {
                    Self::handle_tools_response(generation, *result, model);
                    caps.render.render();
                }

                Event::UserCreated(result) => {
                    Self::handle_user_created(*result, model);
                    caps.render.render();
                }

                Event::ToolCreated(result) => {
                    Self::handle_tool_created(&result, model, caps);
                    caps.render.render();
                }
            }
        }

        fn view(&self, model: &Model) -> ViewModel {
            let creating = model.creating();
            let has_user = model.user_id().is_some();
            let location_ready = model.coords().is_some();

            let backend_status = if model.status().is_empty() {
                PENDING_STATUS.to_string()
            } else {
                model.status().to_string()
            };

            let create_user_label = if has_user {
                "User Created"
            } else if creating {
                "Creating..."
            } else {
                "Create User"
            };

            let tools: Vec<ToolCard> = model.tools().iter().map(ToolCard::from).collect();
            let empty_listing_message = tools
                .is_empty()
                .then(|| EMPTY_LISTING_MESSAGE.to_string());

            ViewModel {
                backend_status,
                location_ready,
                location_label: if location_ready {
                    LOCATION_READY_LABEL
                } else {
                    LOCATION_PENDING_LABEL
                }
                .to_string(),
                user_form: model.user_form.clone(),
                user_id: model.user_id().map(|id| id.0.clone()),
                create_user_label: create_user_label.to_string(),
                can_create_user: !creating && !has_user,
                tool_form: model.tool_form.clone(),
                add_tool_label: if creating { "Adding..." } else { "Add Tool" }.to_string(),
                can_add_tool: !creating && has_user,
                needs_user_hint: (!has_user).then(|| NEEDS_USER_HINT.to_string()),
                tools,
                empty_listing_message,
                notice: model.notice.clone(),
            }
        }
    }
}
