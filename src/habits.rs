use crate::auth::UserId;
use crate::dates::now;
use crate::errors::AppError;
use crate::models::{
    Frequency, Habit, HabitCategory, Streak, Target, TargetUnit,
};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

const DEFAULT_COLOR: &str = "#3B82F6";
const DEFAULT_ICON: &str = "📝";

#[derive(Debug, Deserialize)]
pub struct HabitFilter {
    pub category: Option<HabitCategory>,
    pub is_active: Option<bool>,
}

pub async fn list_habits(
    State(state): State<AppState>,
    user: UserId,
    Query(filter): Query<HabitFilter>,
) -> Result<Json<Value>, AppError> {
    let data = state.data.lock().await;
    let mut habits: Vec<&Habit> = data
        .habits
        .values()
        .filter(|habit| habit.user == user.0)
        .filter(|habit| filter.category.is_none_or(|c| habit.category == c))
        .filter(|habit| filter.is_active.is_none_or(|a| habit.is_active == a))
        .collect();
    habits.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(json!({ "habits": habits })))
}

#[derive(Debug, Deserialize)]
pub struct NewTarget {
    pub value: f64,
    pub unit: TargetUnit,
    pub frequency: Option<Frequency>,
}

#[derive(Debug, Deserialize)]
pub struct NewHabit {
    pub name: String,
    pub category: HabitCategory,
    pub description: Option<String>,
    pub target: NewTarget,
    pub color: Option<String>,
    pub icon: Option<String>,
}

pub async fn create_habit(
    State(state): State<AppState>,
    user: UserId,
    Json(payload): Json<NewHabit>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Habit name is required"));
    }
    if !payload.target.value.is_finite() || payload.target.value < 0.0 {
        return Err(AppError::validation("Target value must be a non-negative number"));
    }

    let timestamp = now();
    let habit = Habit {
        id: Uuid::new_v4().to_string(),
        user: user.0,
        name: name.to_string(),
        category: payload.category,
        description: payload.description.map(|d| d.trim().to_string()),
        target: Target {
            value: payload.target.value,
            unit: payload.target.unit,
            frequency: payload.target.frequency.unwrap_or(Frequency::Daily),
        },
        color: payload.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
        icon: payload.icon.unwrap_or_else(|| DEFAULT_ICON.to_string()),
        is_active: true,
        streak: Streak::default(),
        created_at: timestamp,
        updated_at: timestamp,
    };

    let mut data = state.data.lock().await;
    let mut next = data.clone();
    next.habits.insert(habit.id.clone(), habit.clone());
    state.commit(&mut data, next).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Habit created successfully", "habit": habit })),
    ))
}

pub async fn get_habit(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let data = state.data.lock().await;
    let habit = data
        .habit_for(&user.0, &id)
        .ok_or(AppError::NotFound("Habit"))?;

    Ok(Json(json!({ "habit": habit })))
}

#[derive(Debug, Deserialize)]
pub struct TargetUpdate {
    pub value: Option<f64>,
    pub unit: Option<TargetUnit>,
    pub frequency: Option<Frequency>,
}

#[derive(Debug, Deserialize)]
pub struct HabitUpdate {
    pub name: Option<String>,
    pub category: Option<HabitCategory>,
    pub description: Option<String>,
    pub target: Option<TargetUpdate>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

pub async fn update_habit(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
    Json(payload): Json<HabitUpdate>,
) -> Result<Json<Value>, AppError> {
    let mut data = state.data.lock().await;
    data.habit_for(&user.0, &id)
        .ok_or(AppError::NotFound("Habit"))?;

    let mut next = data.clone();
    let habit = next.habits.get_mut(&id).ok_or(AppError::NotFound("Habit"))?;

    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("Habit name cannot be empty"));
        }
        habit.name = name;
    }
    if let Some(category) = payload.category {
        habit.category = category;
    }
    if let Some(description) = payload.description {
        habit.description = Some(description.trim().to_string());
    }
    if let Some(target) = payload.target {
        if let Some(value) = target.value {
            if !value.is_finite() || value < 0.0 {
                return Err(AppError::validation("Target value must be a non-negative number"));
            }
            habit.target.value = value;
        }
        if let Some(unit) = target.unit {
            habit.target.unit = unit;
        }
        if let Some(frequency) = target.frequency {
            habit.target.frequency = frequency;
        }
    }
    if let Some(color) = payload.color {
        habit.color = color;
    }
    if let Some(icon) = payload.icon {
        habit.icon = icon;
    }
    habit.updated_at = now();

    let updated = habit.clone();
    state.commit(&mut data, next).await?;

    Ok(Json(json!({ "message": "Habit updated successfully", "habit": updated })))
}

pub async fn delete_habit(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let mut data = state.data.lock().await;
    data.habit_for(&user.0, &id)
        .ok_or(AppError::NotFound("Habit"))?;

    let mut next = data.clone();
    next.remove_habit_cascade(&id);
    state.commit(&mut data, next).await?;

    Ok(Json(json!({ "message": "Habit deleted successfully" })))
}

pub async fn toggle_habit(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let mut data = state.data.lock().await;
    data.habit_for(&user.0, &id)
        .ok_or(AppError::NotFound("Habit"))?;

    let mut next = data.clone();
    let habit = next.habits.get_mut(&id).ok_or(AppError::NotFound("Habit"))?;
    habit.is_active = !habit.is_active;
    habit.updated_at = now();

    let updated = habit.clone();
    state.commit(&mut data, next).await?;

    let verb = if updated.is_active { "activated" } else { "deactivated" };
    Ok(Json(json!({
        "message": format!("Habit {verb} successfully"),
        "habit": updated,
    })))
}

#[derive(Debug, Deserialize)]
pub struct DateRange {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub async fn habit_progress(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
    Query(range): Query<DateRange>,
) -> Result<Json<Value>, AppError> {
    let data = state.data.lock().await;
    data.habit_for(&user.0, &id)
        .ok_or(AppError::NotFound("Habit"))?;

    let mut entries: Vec<_> = data
        .progress
        .values()
        .filter(|entry| entry.user == user.0 && entry.habit == id)
        .filter(|entry| range.start_date.is_none_or(|start| entry.day() >= start))
        .filter(|entry| range.end_date.is_none_or(|end| entry.day() <= end))
        .collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date));

    Ok(Json(json!({ "progress": entries })))
}
