use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User entity
///
/// `id` is absent until the store assigns one on first save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = 1)]
    pub id: Option<i64>,
    #[schema(example = "Ada")]
    pub name: String,
    #[schema(example = "ada@x.io")]
    pub email: String,
}

impl User {
    /// A user that has not been saved yet
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

/// Result of a create request, already resolved to the HTTP outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateUserOutcome {
    /// Saved; carries the stored user with its id
    Created(User),
    /// Email already in use; nothing was persisted
    Conflict,
    /// Any other failure
    Failed,
}
