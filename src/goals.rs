use crate::auth::UserId;
use crate::dates::{now, parse_timestamp};
use crate::errors::AppError;
use crate::models::{
    Goal, GoalCategory, GoalProgress, GoalStatus, GoalTarget, GoalType, Milestone, Priority,
};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

const DEFAULT_COLOR: &str = "#10B981";

/// The goal progress calculator: maps (current, target) to a clamped
/// percentage and a derived status. A non-positive target leaves the
/// percentage as it was instead of dividing by zero, and a manually
/// paused goal keeps its status.
pub fn recalculate(current: f64, target: f64, previous: &GoalProgress, status: GoalStatus) -> (u8, GoalStatus) {
    let percentage = if target > 0.0 {
        ((current / target * 100.0).round() as i64).clamp(0, 100) as u8
    } else {
        previous.percentage
    };

    let status = if status == GoalStatus::Paused {
        GoalStatus::Paused
    } else if percentage >= 100 {
        GoalStatus::Completed
    } else if percentage > 0 {
        GoalStatus::InProgress
    } else {
        GoalStatus::NotStarted
    };

    (percentage, status)
}

#[derive(Debug, Deserialize)]
pub struct GoalFilter {
    pub category: Option<GoalCategory>,
    pub status: Option<GoalStatus>,
    #[serde(rename = "type")]
    pub goal_type: Option<GoalType>,
}

pub async fn list_goals(
    State(state): State<AppState>,
    user: UserId,
    Query(filter): Query<GoalFilter>,
) -> Result<Json<Value>, AppError> {
    let data = state.data.lock().await;
    let mut goals: Vec<&Goal> = data
        .goals
        .values()
        .filter(|goal| goal.user == user.0)
        .filter(|goal| filter.category.is_none_or(|c| goal.category == c))
        .filter(|goal| filter.status.is_none_or(|s| goal.status == s))
        .filter(|goal| filter.goal_type.is_none_or(|t| goal.goal_type == t))
        .collect();
    goals.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(json!({ "goals": goals })))
}

#[derive(Debug, Deserialize)]
pub struct NewGoalTarget {
    pub value: f64,
    pub unit: String,
    pub deadline: String,
}

#[derive(Debug, Deserialize)]
pub struct NewGoal {
    pub title: String,
    pub description: Option<String>,
    pub category: GoalCategory,
    #[serde(rename = "type")]
    pub goal_type: GoalType,
    pub target: NewGoalTarget,
    pub priority: Option<Priority>,
    pub color: Option<String>,
}

pub async fn create_goal(
    State(state): State<AppState>,
    user: UserId,
    Json(payload): Json<NewGoal>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::validation("Goal title is required"));
    }
    if !payload.target.value.is_finite() {
        return Err(AppError::validation("Target value must be a number"));
    }
    let unit = payload.target.unit.trim();
    if unit.is_empty() {
        return Err(AppError::validation("Target unit is required"));
    }
    let deadline = parse_timestamp(&payload.target.deadline)?;

    let timestamp = now();
    let goal = Goal {
        id: Uuid::new_v4().to_string(),
        user: user.0,
        title: title.to_string(),
        description: payload.description.map(|d| d.trim().to_string()),
        category: payload.category,
        goal_type: payload.goal_type,
        target: GoalTarget {
            value: payload.target.value,
            unit: unit.to_string(),
            deadline,
        },
        progress: GoalProgress::default(),
        status: GoalStatus::NotStarted,
        priority: payload.priority.unwrap_or(Priority::Medium),
        milestones: Vec::new(),
        color: payload.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
        is_active: true,
        created_at: timestamp,
        updated_at: timestamp,
    };

    let mut data = state.data.lock().await;
    let mut next = data.clone();
    next.goals.insert(goal.id.clone(), goal.clone());
    state.commit(&mut data, next).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Goal created successfully", "goal": goal })),
    ))
}

pub async fn get_goal(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let data = state.data.lock().await;
    let goal = data
        .goal_for(&user.0, &id)
        .ok_or(AppError::NotFound("Goal"))?;

    Ok(Json(json!({ "goal": goal })))
}

#[derive(Debug, Deserialize)]
pub struct GoalTargetUpdate {
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub deadline: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GoalUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<GoalCategory>,
    #[serde(rename = "type")]
    pub goal_type: Option<GoalType>,
    pub target: Option<GoalTargetUpdate>,
    pub priority: Option<Priority>,
    pub status: Option<GoalStatus>,
    pub color: Option<String>,
}

pub async fn update_goal(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
    Json(payload): Json<GoalUpdate>,
) -> Result<Json<Value>, AppError> {
    let mut data = state.data.lock().await;
    data.goal_for(&user.0, &id)
        .ok_or(AppError::NotFound("Goal"))?;

    let mut next = data.clone();
    let goal = next.goals.get_mut(&id).ok_or(AppError::NotFound("Goal"))?;

    if let Some(title) = payload.title {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::validation("Goal title cannot be empty"));
        }
        goal.title = title;
    }
    if let Some(description) = payload.description {
        goal.description = Some(description.trim().to_string());
    }
    if let Some(category) = payload.category {
        goal.category = category;
    }
    if let Some(goal_type) = payload.goal_type {
        goal.goal_type = goal_type;
    }
    if let Some(target) = payload.target {
        if let Some(value) = target.value {
            if !value.is_finite() {
                return Err(AppError::validation("Target value must be a number"));
            }
            goal.target.value = value;
        }
        if let Some(unit) = target.unit {
            let unit = unit.trim().to_string();
            if unit.is_empty() {
                return Err(AppError::validation("Target unit cannot be empty"));
            }
            goal.target.unit = unit;
        }
        if let Some(deadline) = target.deadline {
            goal.target.deadline = parse_timestamp(&deadline)?;
        }
    }
    if let Some(priority) = payload.priority {
        goal.priority = priority;
    }
    if let Some(status) = payload.status {
        goal.status = status;
    }
    if let Some(color) = payload.color {
        goal.color = color;
    }
    goal.updated_at = now();

    let updated = goal.clone();
    state.commit(&mut data, next).await?;

    Ok(Json(json!({ "message": "Goal updated successfully", "goal": updated })))
}

pub async fn delete_goal(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let mut data = state.data.lock().await;
    data.goal_for(&user.0, &id)
        .ok_or(AppError::NotFound("Goal"))?;

    let mut next = data.clone();
    next.goals.remove(&id);
    state.commit(&mut data, next).await?;

    Ok(Json(json!({ "message": "Goal deleted successfully" })))
}

#[derive(Debug, Deserialize)]
pub struct GoalProgressUpdate {
    pub current: f64,
}

pub async fn update_goal_progress(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
    Json(payload): Json<GoalProgressUpdate>,
) -> Result<Json<Value>, AppError> {
    if !payload.current.is_finite() {
        return Err(AppError::validation("Progress value must be a number"));
    }

    let mut data = state.data.lock().await;
    data.goal_for(&user.0, &id)
        .ok_or(AppError::NotFound("Goal"))?;

    let mut next = data.clone();
    let goal = next.goals.get_mut(&id).ok_or(AppError::NotFound("Goal"))?;

    let (percentage, status) =
        recalculate(payload.current, goal.target.value, &goal.progress, goal.status);
    goal.progress.current = payload.current;
    goal.progress.percentage = percentage;
    goal.status = status;
    goal.updated_at = now();

    let updated = goal.clone();
    state.commit(&mut data, next).await?;

    Ok(Json(json!({ "message": "Goal progress updated successfully", "goal": updated })))
}

#[derive(Debug, Deserialize)]
pub struct NewMilestone {
    pub title: String,
    pub description: Option<String>,
    pub target_value: Option<f64>,
}

pub async fn add_milestone(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
    Json(payload): Json<NewMilestone>,
) -> Result<Json<Value>, AppError> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::validation("Milestone title is required"));
    }

    let mut data = state.data.lock().await;
    data.goal_for(&user.0, &id)
        .ok_or(AppError::NotFound("Goal"))?;

    let mut next = data.clone();
    let goal = next.goals.get_mut(&id).ok_or(AppError::NotFound("Goal"))?;
    goal.milestones.push(Milestone {
        id: Uuid::new_v4().to_string(),
        title: title.to_string(),
        description: payload.description.map(|d| d.trim().to_string()),
        target_value: payload.target_value,
        completed: false,
        completed_at: None,
    });
    goal.updated_at = now();

    let updated = goal.clone();
    state.commit(&mut data, next).await?;

    Ok(Json(json!({ "message": "Milestone added successfully", "goal": updated })))
}

/// Flips a milestone's completion and stamps or clears `completed_at`.
/// Deliberately independent of the percentage/status computation.
pub async fn toggle_milestone(
    State(state): State<AppState>,
    user: UserId,
    Path((id, milestone_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let mut data = state.data.lock().await;
    data.goal_for(&user.0, &id)
        .ok_or(AppError::NotFound("Goal"))?;

    let mut next = data.clone();
    let goal = next.goals.get_mut(&id).ok_or(AppError::NotFound("Goal"))?;
    let milestone = goal
        .milestones
        .iter_mut()
        .find(|m| m.id == milestone_id)
        .ok_or(AppError::NotFound("Milestone"))?;

    milestone.completed = !milestone.completed;
    milestone.completed_at = milestone.completed.then(now);
    goal.updated_at = now();

    let updated = goal.clone();
    state.commit(&mut data, next).await?;

    Ok(Json(json!({ "message": "Milestone updated successfully", "goal": updated })))
}
