//! Data models
//!
//! This module contains all data structures used throughout FocusHub.
//! Models represent:
//! - Database entities (User, Session, UserProfile, Resource, Tool,
//!   ToolReview, Forum, ForumTopic, ForumPost)
//! - API input types
//! - Internal data transfer objects

mod forum;
mod profile;
mod resource;
mod session;
mod tool;
mod user;

pub use forum::{
    CreatePostInput, CreateTopicInput, Forum, ForumPost, ForumSummary, ForumTopic, TopicSummary,
};
pub use profile::{Accessibility, Preferences, Theme, UpdateProfileInput, UserProfile};
pub use resource::{
    CreateResourceInput, ListParams, PagedResult, Resource, ResourceKind, ResourceStatus,
    UpdateResourceInput,
};
pub use session::Session;
pub use tool::{
    CreateReviewInput, CreateToolInput, Tool, ToolReview, ToolStatus, UpdateToolInput,
};
pub use user::{CreateUserInput, UpdateUserInput, User};
