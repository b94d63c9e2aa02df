//! Repository layer
//!
//! Data access traits and their SQLx implementations. Each repository
//! supports both SQLite and PostgreSQL through the `DatabasePool`
//! abstraction.

pub mod forum;
pub mod post;
pub mod profile;
pub mod resource;
pub mod session;
pub mod tool;
pub mod topic;
pub mod user;

pub use forum::{ForumRepository, SqlxForumRepository};
pub use post::{PostRepository, SqlxPostRepository};
pub use profile::{ProfileRepository, SqlxProfileRepository};
pub use resource::{ResourceRepository, SqlxResourceRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use tool::{SqlxToolRepository, ToolRepository};
pub use topic::{SqlxTopicRepository, TopicRepository};
pub use user::{SqlxUserRepository, UserRepository};

/// Parse a JSON text column holding a string array.
///
/// Malformed or empty column values decode to an empty list rather than
/// failing the whole row.
pub(crate) fn parse_string_list(text: &str) -> Vec<String> {
    serde_json::from_str(text).unwrap_or_default()
}

/// Parse a JSON text column holding an object, falling back to `{}`.
pub(crate) fn parse_json_object(text: &str) -> serde_json::Value {
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::json!({}))
}

/// Serialize a string list into its JSON text column form.
pub(crate) fn to_json_text(list: &[String]) -> String {
    serde_json::to_string(list).unwrap_or_else(|_| "[]".to_string())
}

/// Escape LIKE metacharacters in user-supplied text.
///
/// `%` and `_` are wildcards inside a LIKE pattern; callers interpolate the
/// result into a pattern paired with an `ESCAPE '\'` clause so the input
/// only ever matches literally.
pub(crate) fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
