use crate::auth::UserId;
use crate::errors::AppError;
use crate::models::{GoalStatus, Preferences, Role};
use crate::progress::days_logged;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub async fn get_profile(
    State(state): State<AppState>,
    user: UserId,
) -> Result<Json<Value>, AppError> {
    let data = state.data.lock().await;
    let profile = data.profiles.get(&user.0).cloned().unwrap_or_default();

    Ok(Json(json!({ "user": profile })))
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub preferences: Option<Preferences>,
}

pub async fn update_profile(
    State(state): State<AppState>,
    user: UserId,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<Value>, AppError> {
    let mut data = state.data.lock().await;
    let mut next = data.clone();
    let profile = next.profiles.entry(user.0.clone()).or_default();

    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("Name cannot be empty"));
        }
        profile.name = name;
    }
    if let Some(role) = payload.role {
        profile.role = role;
    }
    if let Some(preferences) = payload.preferences {
        profile.preferences = preferences;
    }

    let updated = profile.clone();
    state.commit(&mut data, next).await?;

    Ok(Json(json!({ "message": "Profile updated successfully", "user": updated })))
}

#[derive(Debug, Serialize)]
struct UserStats {
    total_habits: usize,
    active_habits: usize,
    completed_goals: usize,
    current_streak: u32,
    total_days: usize,
}

/// Dashboard aggregates over the caller's habits, goals and entries.
pub async fn get_stats(
    State(state): State<AppState>,
    user: UserId,
) -> Result<Json<Value>, AppError> {
    let data = state.data.lock().await;

    let habits: Vec<_> = data
        .habits
        .values()
        .filter(|habit| habit.user == user.0)
        .collect();
    let total_habits = habits.len();
    let active_habits = habits.iter().filter(|habit| habit.is_active).count();
    let current_streak = habits
        .iter()
        .map(|habit| habit.streak.current)
        .max()
        .unwrap_or(0);

    let completed_goals = data
        .goals
        .values()
        .filter(|goal| goal.user == user.0)
        .filter(|goal| goal.status == GoalStatus::Completed)
        .count();

    let stats = UserStats {
        total_habits,
        active_habits,
        completed_goals,
        current_streak,
        total_days: days_logged(&data, &user.0),
    };

    Ok(Json(json!({ "stats": stats })))
}
