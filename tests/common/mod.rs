//! Common test utilities
//!
//! [`FakeBackend`] mounts a small stateful imitation of the Scrapi API on a
//! wiremock server: registration, login, the actor registry, private
//! actors and runs that finish after a few polls.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use scrapi_probe::client::ApiClient;
use scrapi_probe::config::{Config, PollSettings};
use scrapi_probe::suites::SuiteContext;

pub const REGISTER_TOKEN: &str = "tok-register";
pub const LOGIN_TOKEN: &str = "tok-login";
pub const USER_ID: &str = "64f0c0ffee0000000000beef";

pub const REGISTRY: &[&str] = &[
    "google-maps",
    "amazon",
    "instagram",
    "website",
    "tiktok",
    "twitter",
    "facebook",
    "linkedin",
];

/// Millisecond polling so suites finish quickly
pub fn fast_polling() -> PollSettings {
    PollSettings {
        interval_ms: 5,
        max_wait_ms: 100,
        progress_every_ms: 10,
    }
}

/// Configuration pointed at a mock server
pub fn test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.backend.base_url = base_url.to_string();
    config.backend.request_timeout_secs = 5;
    config.polling.maps = fast_polling();
    config.polling.enhanced_maps = fast_polling();
    config.polling.run_check = fast_polling();
    config
}

/// Fresh suite context against a mock server
pub fn context_for(server: &MockServer) -> SuiteContext {
    let config = test_config(&server.uri());
    let client = ApiClient::new(&config).unwrap();
    SuiteContext::new(config, client)
}

/// A place as emitted by the enhanced scraper, with 50+ fields
pub fn enhanced_place() -> Value {
    let mut place = json!({
        "title": "Joe's Pizza Broadway",
        "address": "1435 Broadway, New York, NY 10018",
        "phone": "(212) 555-0100",
        "phoneUnformatted": "+12125550100",
        "website": "https://joespizzanyc.com",
        "location": {"lat": 40.7549, "lng": -73.9866},
        "totalScore": 4.6,
        "reviewsCount": 12874,
        "categoryName": "Pizza restaurant",
        "categories": ["Pizza restaurant", "Italian restaurant", "Takeout"],
        "street": "1435 Broadway",
        "city": "New York",
        "state": "New York",
        "postalCode": "10018",
        "countryCode": "US",
        "neighborhood": "Midtown",
        "placeId": "ChIJ8Q2WSpJZwokRQz-bYYgEskM",
        "cid": "4878012317421338435",
        "fid": "0x89c25990",
        "price": "$",
        "permanentlyClosed": false,
        "temporarilyClosed": false,
        "claimThisBusiness": false,
        "openingHours": [
            {"day": "Monday", "hours": "10 AM to 2 AM"},
            {"day": "Tuesday", "hours": "10 AM to 2 AM"}
        ],
        "imagesCount": 5421,
        "imageUrl": "https://lh5.googleusercontent.com/p/joes.jpg",
        "imageCategories": ["All", "Menu", "Food & drink"],
        "reviewsTags": [{"title": "slice", "count": 1200}],
        "peopleAlsoSearch": [{"title": "Prince Street Pizza"}],
        "placesTags": [{"title": "Cheap eats"}],
        "additionalInfo": {
            "Service options": [{"Dine-in": true}, {"Takeout": true}],
            "Highlights": [{"Fast service": true}],
            "Offerings": [{"Vegetarian options": true}],
            "Amenities": [{"Restroom": true}],
            "Payments": [{"Credit cards": true}]
        },
        "socialMedia": {"instagram": "https://instagram.com/joespizzanyc", "facebook": null},
        "url": "https://www.google.com/maps/place/joes",
        "searchPageUrl": "https://www.google.com/maps/search/restaurant",
        "rank": 1,
        "isAdvertisement": false,
        "scrapedAt": "2026-10-19T12:00:00Z",
        "kgmid": "/g/1tdfmy4x"
    });

    let map = place.as_object_mut().unwrap();
    for i in 0..14 {
        map.insert(format!("extra{i:02}"), json!(i));
    }
    place
}

/// A place in the `[{results: [...]}]` envelope of the Google Maps actor
pub fn maps_place() -> Value {
    json!({
        "name": "Joe's Pizza",
        "fullAddress": "1435 Broadway, New York, NY 10018",
        "phone": "(212) 555-0100",
        "website": "https://joespizzanyc.com",
        "location": {"lat": 40.7549, "lng": -73.9866},
        "rating": 4.6,
        "reviewsCount": 12874,
        "mainCategory": "Pizza restaurant",
        "openingHours": {"Monday": "10AM-2AM", "Tuesday": "10AM-2AM", "Sunday": ""},
        "photos": ["https://lh5.googleusercontent.com/p/1.jpg"],
        "social": {"instagram": "https://instagram.com/joespizzanyc"},
        "emails": ["hello@joespizzanyc.com"],
        "categories": ["Pizza", "Italian", "Takeout"],
        "placeId": "ChIJ8Q2WSpJZwokRQz-bYYgEskM"
    })
}

pub fn registry_actor(id: &str) -> Value {
    json!({
        "actorId": id,
        "name": format!("{id} Scraper"),
        "title": format!("{id} Scraper"),
        "description": format!("Extract data from {id}"),
        "isPublic": true,
        "userId": null
    })
}

// ============================================================================
// Fake backend
// ============================================================================

#[derive(Debug, Default)]
struct State {
    username: Option<String>,
    private_actors: Vec<Value>,
    runs: Vec<Value>,
    polls: usize,
}

/// How runs created on the fake backend end
#[derive(Debug, Clone)]
pub enum RunScript {
    /// `running` for `polls` checks, then `succeeded` with this output
    Succeed { polls: usize, output: Vec<Value> },
    /// `running` for `polls` checks, then `failed` with this error
    Fail { polls: usize, error: Option<String> },
    /// Never leaves `running`
    Hang,
}

/// Stateful imitation of the backend mounted on a [`MockServer`]
#[derive(Clone)]
pub struct FakeBackend {
    state: Arc<Mutex<State>>,
    script: RunScript,
    registry: Vec<Value>,
}

impl FakeBackend {
    pub fn new(script: RunScript) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            script,
            registry: REGISTRY.iter().map(|id| registry_actor(id)).collect(),
        }
    }

    pub fn with_registry(mut self, registry: Vec<Value>) -> Self {
        self.registry = registry;
        self
    }

    pub fn runs_created(&self) -> usize {
        self.state.lock().unwrap().runs.len()
    }

    pub async fn start(self) -> MockServer {
        let server = MockServer::start().await;
        self.mount(&server).await;
        server
    }

    pub async fn mount(&self, server: &MockServer) {
        let state = self.state.clone();
        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .respond_with(move |req: &Request| {
                let body: Value = req.body_json().unwrap();
                let username = body["username"].as_str().unwrap().to_string();
                state.lock().unwrap().username = Some(username.clone());
                ResponseTemplate::new(201).set_body_json(json!({
                    "message": "User registered successfully",
                    "token": REGISTER_TOKEN,
                    "user": {
                        "id": USER_ID,
                        "username": username,
                        "email": body["email"],
                        "fullName": body["fullName"]
                    }
                }))
            })
            .mount(server)
            .await;

        let state = self.state.clone();
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(move |_: &Request| {
                let username = state.lock().unwrap().username.clone();
                ResponseTemplate::new(200).set_body_json(json!({
                    "message": "Login successful",
                    "token": LOGIN_TOKEN,
                    "user": {"id": USER_ID, "username": username}
                }))
            })
            .mount(server)
            .await;

        let state = self.state.clone();
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(move |req: &Request| {
                if !authorized(req) {
                    return unauthorized();
                }
                let username = state.lock().unwrap().username.clone();
                ResponseTemplate::new(200).set_body_json(json!({
                    "user": {"_id": USER_ID, "username": username}
                }))
            })
            .mount(server)
            .await;

        let state = self.state.clone();
        let registry = self.registry.clone();
        Mock::given(method("GET"))
            .and(path("/actors"))
            .respond_with(move |req: &Request| {
                if !authorized(req) {
                    return unauthorized();
                }
                let mine = req
                    .url
                    .query_pairs()
                    .any(|(k, v)| k == "myActors" && v == "true");
                if mine {
                    let actors = state.lock().unwrap().private_actors.clone();
                    ResponseTemplate::new(200).set_body_json(actors)
                } else {
                    ResponseTemplate::new(200).set_body_json(&registry)
                }
            })
            .mount(server)
            .await;

        let state = self.state.clone();
        Mock::given(method("POST"))
            .and(path("/actors"))
            .respond_with(move |req: &Request| {
                if !authorized(req) {
                    return unauthorized();
                }
                let mut actor: Value = req.body_json().unwrap();
                actor["userId"] = json!(USER_ID);
                actor["isPublic"] = json!(false);
                state.lock().unwrap().private_actors.push(actor.clone());
                ResponseTemplate::new(201).set_body_json(actor)
            })
            .mount(server)
            .await;

        let registry = self.registry.clone();
        Mock::given(method("GET"))
            .and(path_regex(r"^/actors/[^/]+$"))
            .respond_with(move |req: &Request| {
                if !authorized(req) {
                    return unauthorized();
                }
                let id = last_segment(req);
                match registry.iter().find(|a| a["actorId"] == id.as_str()) {
                    Some(actor) => ResponseTemplate::new(200).set_body_json(actor),
                    None => not_found("Actor not found"),
                }
            })
            .mount(server)
            .await;

        let state = self.state.clone();
        Mock::given(method("GET"))
            .and(path("/runs"))
            .respond_with(move |req: &Request| {
                if !authorized(req) {
                    return unauthorized();
                }
                let runs = state.lock().unwrap().runs.clone();
                let total = runs.len();
                ResponseTemplate::new(200).set_body_json(json!({
                    "runs": runs,
                    "pagination": {"page": 1, "limit": 20, "total": total, "pages": 1}
                }))
            })
            .mount(server)
            .await;

        let state = self.state.clone();
        Mock::given(method("POST"))
            .and(path("/runs"))
            .respond_with(move |req: &Request| {
                if !authorized(req) {
                    return unauthorized();
                }
                let body: Value = req.body_json().unwrap();
                let mut state = state.lock().unwrap();
                let run = json!({
                    "runId": format!("run-{}", state.runs.len() + 1),
                    "actorId": body["actorId"],
                    "userId": USER_ID,
                    "status": "running",
                    "input": body["input"],
                    "output": []
                });
                state.runs.push(run.clone());
                ResponseTemplate::new(201).set_body_json(run)
            })
            .mount(server)
            .await;

        let state = self.state.clone();
        let script = self.script.clone();
        Mock::given(method("GET"))
            .and(path_regex(r"^/runs/[^/]+$"))
            .respond_with(move |req: &Request| {
                if !authorized(req) {
                    return unauthorized();
                }
                let id = last_segment(req);
                let mut state = state.lock().unwrap();
                let Some(mut run) = state.runs.iter().find(|r| r["runId"] == id.as_str()).cloned()
                else {
                    return not_found("Run not found");
                };

                state.polls += 1;
                match &script {
                    RunScript::Succeed { polls, output } if state.polls > *polls => {
                        run["status"] = json!("succeeded");
                        run["output"] = json!(output);
                    }
                    RunScript::Fail { polls, error } if state.polls > *polls => {
                        run["status"] = json!("failed");
                        run["error"] = json!(error);
                    }
                    _ => {}
                }
                ResponseTemplate::new(200).set_body_json(run)
            })
            .mount(server)
            .await;
    }
}

fn authorized(req: &Request) -> bool {
    req.headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {REGISTER_TOKEN}") || v == format!("Bearer {LOGIN_TOKEN}"))
}

fn unauthorized() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({"error": "Access denied. No token provided."}))
}

fn not_found(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({"error": message}))
}

fn last_segment(req: &Request) -> String {
    req.url
        .path_segments()
        .and_then(|mut s| s.next_back())
        .unwrap_or_default()
        .to_string()
}
