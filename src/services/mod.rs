//! Services layer - Business logic
//!
//! This module contains all business logic services for FocusHub.
//! Services are responsible for:
//! - Implementing business rules and validation
//! - Coordinating repositories
//! - Mapping failures to typed errors

pub mod forum;
pub mod markdown;
pub mod password;
pub mod profile;
pub mod resource;
pub mod tool;
pub mod user;

pub use forum::{ForumService, ForumServiceError, TopicWithPosts};
pub use markdown::MarkdownRenderer;
pub use password::{hash_password, verify_password};
pub use profile::{ProfileService, ProfileServiceError};
pub use resource::{ResourceService, ResourceServiceError};
pub use tool::{ToolService, ToolServiceError};
pub use user::{LoginInput, RegisterInput, UserService, UserServiceError};
