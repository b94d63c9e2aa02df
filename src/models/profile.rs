//! User profile model
//!
//! Profiles are created on demand the first time they are requested, with
//! a default preference blob. The preference shape is stable JSON so the
//! front end can round-trip it unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-user profile with display information and preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Owning user ID (primary key)
    pub user_id: i64,
    /// Display name shown across the site
    pub display_name: String,
    /// Short bio (optional)
    pub bio: Option<String>,
    /// Avatar URL (optional)
    pub avatar_url: Option<String>,
    /// Preference blob
    pub preferences: Preferences,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// User preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Whether the user wants notification prompts
    #[serde(default = "default_notifications")]
    pub notifications: bool,
    /// Color theme
    #[serde(default)]
    pub theme: Theme,
    /// Accessibility toggles
    #[serde(default)]
    pub accessibility: Accessibility,
}

fn default_notifications() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            notifications: true,
            theme: Theme::System,
            accessibility: Accessibility::default(),
        }
    }
}

/// Color theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    /// Convert theme to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }

    /// Parse theme from its string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            "system" => Some(Theme::System),
            _ => None,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Accessibility preference toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Accessibility {
    /// Reduce motion in UI animations
    #[serde(default)]
    pub reduced_motion: bool,
    /// High-contrast rendering
    #[serde(default)]
    pub high_contrast: bool,
}

/// Input for updating a profile (all fields optional)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileInput {
    /// New display name (optional)
    pub display_name: Option<String>,
    /// New bio (optional)
    pub bio: Option<String>,
    /// New avatar URL (optional)
    pub avatar_url: Option<String>,
    /// Replacement preference blob (optional, replaces the whole object)
    pub preferences: Option<Preferences>,
}

impl UpdateProfileInput {
    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.display_name.is_some()
            || self.bio.is_some()
            || self.avatar_url.is_some()
            || self.preferences.is_some()
    }
}
