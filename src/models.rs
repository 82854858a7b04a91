// Wire types for the Scrapi backend API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Payload for `POST /auth/register`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
}

impl RegisterRequest {
    /// Build a throwaway account whose username and email carry the current unix time
    ///
    /// `username_prefix` becomes `<prefix>_<ts>`, the email `<email_prefix>_<ts>@<domain>`.
    pub fn unique(
        username_prefix: &str,
        email_prefix: &str,
        email_domain: &str,
        password: &str,
        full_name: &str,
    ) -> Self {
        let ts = chrono::Utc::now().timestamp();
        Self {
            username: format!("{username_prefix}_{ts}"),
            email: format!("{email_prefix}_{ts}@{email_domain}"),
            password: password.to_string(),
            full_name: full_name.to_string(),
        }
    }
}

/// Payload for `POST /auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response of register and login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
    #[serde(default)]
    pub message: Option<String>,
}

/// User as returned by the auth endpoints
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Register returns `id`, raw documents carry `_id`
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Actor document from `/actors`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub actor_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    /// `null` for registry actors, the owner's id for private ones
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Actor {
    /// Registry actors are public and unowned
    pub fn is_registry_actor(&self) -> bool {
        self.is_public == Some(true) && self.user_id.is_none()
    }
}

/// Usage counters attached to an actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorStats {
    pub runs: u64,
    pub rating: f64,
    pub reviews: u64,
}

/// Payload for `POST /actors`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActor {
    pub actor_id: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub author: String,
    pub slug: String,
    pub category: String,
    pub icon: String,
    pub pricing_model: String,
    pub stats: ActorStats,
}

impl NewActor {
    /// A private actor with timestamped id and slug
    pub fn private_test_actor(author: &str) -> Self {
        let ts = chrono::Utc::now().timestamp();
        Self {
            actor_id: format!("user-actor-{ts}"),
            name: "Test Private Actor".to_string(),
            title: "User's Private Test Actor".to_string(),
            description: "A private actor created by user for testing".to_string(),
            author: author.to_string(),
            slug: format!("{author}/private-actor-{ts}"),
            category: "Testing".to_string(),
            icon: "🧪".to_string(),
            pricing_model: "Free".to_string(),
            stats: ActorStats {
                runs: 0,
                rating: 5.0,
                reviews: 0,
            },
        }
    }
}

/// Payload for `POST /runs`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRunRequest {
    pub actor_id: String,
    pub input: Value,
}

impl CreateRunRequest {
    pub fn new(actor_id: impl Into<String>, input: Value) -> Self {
        Self {
            actor_id: actor_id.into(),
            input,
        }
    }
}

/// Lifecycle state of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed,
    /// Anything the backend adds later; treated as still in flight
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Whether polling can stop
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }
}

impl Default for RunStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run document from `/runs`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub run_id: String,
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub status: RunStatus,
    /// Scraper output; kept untyped because every actor emits its own shape
    #[serde(default)]
    pub output: Vec<Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `GET /runs`; the paging block is not consulted
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunList {
    #[serde(default)]
    pub runs: Vec<Run>,
}

/// Pull a user id out of a raw user object, accepting either `id` or `_id`
pub fn user_id_of(user: &Value) -> Option<&str> {
    user.get("id")
        .and_then(Value::as_str)
        .or_else(|| user.get("_id").and_then(Value::as_str))
}
