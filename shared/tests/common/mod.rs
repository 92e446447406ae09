#![allow(dead_code)]

use crux_core::testing::{AppTester, Update};
use crux_core::Request;
use crux_http::protocol::{HttpRequest, HttpResult};
use toolshare_shared::capabilities::{GeolocationOperation, GeolocationResult};
use toolshare_shared::{App, Effect, Event, Model};

pub const BASE: &str = "http://localhost:8000";

pub type Tester = AppTester<App, Effect>;

/// Effects produced by an event and by every event it led to.
#[derive(Default)]
pub struct Effects {
    pub http: Vec<Request<HttpRequest>>,
    pub geolocation: Vec<Request<GeolocationOperation>>,
    pub renders: usize,
}

impl Effects {
    fn absorb(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Http(request) => self.http.push(request),
                Effect::Geolocation(request) => self.geolocation.push(request),
                Effect::Render(_) => self.renders += 1,
            }
        }
    }

    fn merge(&mut self, other: Effects) {
        self.http.extend(other.http);
        self.geolocation.extend(other.geolocation);
        self.renders += other.renders;
    }

    /// Removes the pending HTTP request for `method` + `url`.
    pub fn take_http(&mut self, method: &str, url: &str) -> Request<HttpRequest> {
        let index = self
            .http
            .iter()
            .position(|r| r.operation.method == method && r.operation.url == url)
            .unwrap_or_else(|| {
                let pending: Vec<_> = self
                    .http
                    .iter()
                    .map(|r| format!("{} {}", r.operation.method, r.operation.url))
                    .collect();
                panic!("no {method} {url} request, pending: {pending:?}")
            });
        self.http.remove(index)
    }
}

pub fn new_app() -> (Tester, Model) {
    (Tester::default(), Model::default())
}

pub fn send(app: &Tester, model: &mut Model, event: Event) -> Effects {
    let update = app.update(event, model);
    drain(app, model, update)
}

pub fn resolve_http(
    app: &Tester,
    model: &mut Model,
    request: &mut Request<HttpRequest>,
    result: HttpResult,
) -> Effects {
    let update = app.resolve(request, result).expect("http request should resolve");
    drain(app, model, update)
}

pub fn resolve_position(
    app: &Tester,
    model: &mut Model,
    request: &mut Request<GeolocationOperation>,
    result: GeolocationResult,
) -> Effects {
    let update = app
        .resolve(request, result)
        .expect("position request should resolve");
    drain(app, model, update)
}

fn drain(app: &Tester, model: &mut Model, update: Update<Effect, Event>) -> Effects {
    let mut effects = Effects::default();
    effects.absorb(update.effects);
    for event in update.events {
        let nested = send(app, model, event);
        effects.merge(nested);
    }
    effects
}

pub fn started(geolocation_available: bool) -> Event {
    Event::Started {
        backend_url: None,
        geolocation_available,
    }
}

pub fn json_body(request: &Request<HttpRequest>) -> serde_json::Value {
    serde_json::from_slice(&request.operation.body).expect("request body should be JSON")
}
