//! Dashboard API endpoint
//!
//! GET /api/v1/dashboard - the caller's submissions and recent forum activity

use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{ForumTopic, Resource, ResourceStatus, Tool, ToolStatus};

/// Number of recent items shown per section
const RECENT_LIMIT: usize = 5;

/// Dashboard payload
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub resources: ResourceSummary,
    pub tools: ToolSummary,
    pub recent_topics: Vec<ForumTopic>,
}

/// The caller's resource submissions
#[derive(Debug, Serialize)]
pub struct ResourceSummary {
    pub total: usize,
    pub counts: ResourceStatusCounts,
    pub recent: Vec<Resource>,
}

/// Per-status resource counts
#[derive(Debug, Default, Serialize)]
pub struct ResourceStatusCounts {
    pub draft: usize,
    pub published: usize,
    pub archived: usize,
}

/// The caller's tool submissions
#[derive(Debug, Serialize)]
pub struct ToolSummary {
    pub total: usize,
    pub counts: ToolStatusCounts,
    pub recent: Vec<Tool>,
}

/// Per-status tool counts
#[derive(Debug, Default, Serialize)]
pub struct ToolStatusCounts {
    pub active: usize,
    pub inactive: usize,
    pub deprecated: usize,
}

/// GET /api/v1/dashboard - The caller's submissions and recent topics
///
/// Requires authentication.
pub async fn get_dashboard(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<DashboardResponse>, ApiError> {
    let resources = state.resource_service.list_by_author(user.0.id).await?;
    let tools = state.tool_service.list_by_author(user.0.id).await?;
    let recent_topics = state
        .forum_service
        .recent_topics_by_author(user.0.id, RECENT_LIMIT as i64)
        .await?;

    Ok(Json(DashboardResponse {
        resources: summarize_resources(resources),
        tools: summarize_tools(tools),
        recent_topics,
    }))
}

fn summarize_resources(resources: Vec<Resource>) -> ResourceSummary {
    let mut counts = ResourceStatusCounts::default();
    for resource in &resources {
        match resource.status {
            ResourceStatus::Draft => counts.draft += 1,
            ResourceStatus::Published => counts.published += 1,
            ResourceStatus::Archived => counts.archived += 1,
        }
    }

    ResourceSummary {
        total: resources.len(),
        counts,
        recent: resources.into_iter().take(RECENT_LIMIT).collect(),
    }
}

fn summarize_tools(tools: Vec<Tool>) -> ToolSummary {
    let mut counts = ToolStatusCounts::default();
    for tool in &tools {
        match tool.status {
            ToolStatus::Active => counts.active += 1,
            ToolStatus::Inactive => counts.inactive += 1,
            ToolStatus::Deprecated => counts.deprecated += 1,
        }
    }

    ToolSummary {
        total: tools.len(),
        counts,
        recent: tools.into_iter().take(RECENT_LIMIT).collect(),
    }
}
