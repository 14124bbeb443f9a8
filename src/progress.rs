use crate::auth::UserId;
use crate::dates::{now, parse_timestamp};
use crate::errors::AppError;
use crate::models::{
    Difficulty, Habit, HabitCategory, Mood, ProgressEntry, Target,
};
use crate::state::AppState;
use crate::storage::AppData;
use crate::streak;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

const DEFAULT_LIST_LIMIT: usize = 50;

/// Entry denormalized with the owning habit for display, mirroring what
/// clients need to render a log row without a second fetch.
#[derive(Debug, Serialize)]
pub struct ProgressView {
    pub id: String,
    pub user: String,
    pub habit: HabitRef,
    pub date: chrono::NaiveDateTime,
    pub value: f64,
    pub unit: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub mood: Mood,
    pub difficulty: Difficulty,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub tags: Vec<String>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct HabitRef {
    pub id: String,
    pub name: String,
    pub category: HabitCategory,
    pub target: Target,
}

impl ProgressView {
    fn new(entry: &ProgressEntry, habit: &Habit) -> Self {
        Self {
            id: entry.id.clone(),
            user: entry.user.clone(),
            habit: HabitRef {
                id: habit.id.clone(),
                name: habit.name.clone(),
                category: habit.category,
                target: habit.target.clone(),
            },
            date: entry.date,
            value: entry.value,
            unit: entry.unit.clone(),
            completed: entry.completed,
            notes: entry.notes.clone(),
            mood: entry.mood,
            difficulty: entry.difficulty,
            time_spent: entry.time_spent,
            location: entry.location.clone(),
            tags: entry.tags.clone(),
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

fn view(data: &AppData, entry: &ProgressEntry) -> Result<ProgressView, AppError> {
    let habit = data
        .habits
        .get(&entry.habit)
        .ok_or(AppError::NotFound("Habit"))?;
    Ok(ProgressView::new(entry, habit))
}

#[derive(Debug, Deserialize)]
pub struct ProgressFilter {
    pub habit: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<usize>,
}

pub async fn list_progress(
    State(state): State<AppState>,
    user: UserId,
    Query(filter): Query<ProgressFilter>,
) -> Result<Json<Value>, AppError> {
    let data = state.data.lock().await;
    let mut entries: Vec<&ProgressEntry> = data
        .progress
        .values()
        .filter(|entry| entry.user == user.0)
        .filter(|entry| filter.habit.as_deref().is_none_or(|h| entry.habit == h))
        .filter(|entry| filter.start_date.is_none_or(|start| entry.day() >= start))
        .filter(|entry| filter.end_date.is_none_or(|end| entry.day() <= end))
        .collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    entries.truncate(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT));

    let views = entries
        .into_iter()
        .map(|entry| view(&data, entry))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(json!({ "progress": views })))
}

#[derive(Debug, Deserialize)]
pub struct LogProgress {
    pub habit: String,
    pub value: f64,
    pub unit: String,
    pub date: Option<String>,
    pub notes: Option<String>,
    pub mood: Option<Mood>,
    pub difficulty: Option<Difficulty>,
    pub time_spent: Option<f64>,
    pub location: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// The progress recorder: day-uniqueness check, completion derivation and
/// the streak update all commit in one write or not at all.
pub async fn log_progress(
    State(state): State<AppState>,
    user: UserId,
    Json(payload): Json<LogProgress>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if !payload.value.is_finite() || payload.value < 0.0 {
        return Err(AppError::validation("Progress value must be a non-negative number"));
    }
    let unit = payload.unit.trim();
    if unit.is_empty() {
        return Err(AppError::validation("Unit is required"));
    }
    if let Some(spent) = payload.time_spent {
        if !spent.is_finite() || spent < 0.0 {
            return Err(AppError::validation("Time spent must be a non-negative number"));
        }
    }

    let date = match payload.date.as_deref() {
        Some(raw) => parse_timestamp(raw)?,
        None => now(),
    };
    let day = date.date();

    let mut data = state.data.lock().await;
    let habit = data
        .habit_for(&user.0, &payload.habit)
        .ok_or(AppError::NotFound("Habit"))?
        .clone();

    let timestamp = now();
    let completed = habit.target_met(payload.value);
    let entry = ProgressEntry {
        id: Uuid::new_v4().to_string(),
        user: user.0.clone(),
        habit: habit.id.clone(),
        date,
        value: payload.value,
        unit: unit.to_string(),
        completed,
        notes: payload.notes.map(|n| n.trim().to_string()),
        mood: payload.mood.unwrap_or(Mood::Good),
        difficulty: payload.difficulty.unwrap_or(Difficulty::Moderate),
        time_spent: payload.time_spent,
        location: payload.location.map(|l| l.trim().to_string()),
        tags: payload.tags.unwrap_or_default(),
        created_at: timestamp,
        updated_at: timestamp,
    };

    let mut next = data.clone();
    next.insert_entry(entry.clone())?;

    if completed {
        let yesterday_done =
            next.completed_on(&user.0, &habit.id, streak::previous_day(day));
        let updated = next
            .habits
            .get_mut(&habit.id)
            .ok_or(AppError::NotFound("Habit"))?;
        updated.streak = streak::advance(&updated.streak, day, yesterday_done);
        updated.updated_at = timestamp;
    }

    let saved = view(&next, &entry)?;
    state.commit(&mut data, next).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Progress logged successfully", "progress": saved })),
    ))
}

pub async fn get_progress(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let data = state.data.lock().await;
    let entry = data
        .entry_for(&user.0, &id)
        .ok_or(AppError::NotFound("Progress entry"))?;

    Ok(Json(json!({ "progress": view(&data, entry)? })))
}

#[derive(Debug, Deserialize)]
pub struct ProgressUpdate {
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub notes: Option<String>,
    pub mood: Option<Mood>,
    pub difficulty: Option<Difficulty>,
    pub time_spent: Option<f64>,
    pub location: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Editing `value` re-derives `completed` against the habit target. The
/// streak is a write-time side effect of logging and is not replayed here.
pub async fn update_progress(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
    Json(payload): Json<ProgressUpdate>,
) -> Result<Json<Value>, AppError> {
    let mut data = state.data.lock().await;
    data.entry_for(&user.0, &id)
        .ok_or(AppError::NotFound("Progress entry"))?;

    let mut next = data.clone();
    let entry = next
        .progress
        .get_mut(&id)
        .ok_or(AppError::NotFound("Progress entry"))?;
    let habit_id = entry.habit.clone();

    if let Some(unit) = payload.unit {
        let unit = unit.trim().to_string();
        if unit.is_empty() {
            return Err(AppError::validation("Unit cannot be empty"));
        }
        entry.unit = unit;
    }
    if let Some(notes) = payload.notes {
        entry.notes = Some(notes.trim().to_string());
    }
    if let Some(mood) = payload.mood {
        entry.mood = mood;
    }
    if let Some(difficulty) = payload.difficulty {
        entry.difficulty = difficulty;
    }
    if let Some(spent) = payload.time_spent {
        if !spent.is_finite() || spent < 0.0 {
            return Err(AppError::validation("Time spent must be a non-negative number"));
        }
        entry.time_spent = Some(spent);
    }
    if let Some(location) = payload.location {
        entry.location = Some(location.trim().to_string());
    }
    if let Some(tags) = payload.tags {
        entry.tags = tags;
    }
    if let Some(value) = payload.value {
        if !value.is_finite() || value < 0.0 {
            return Err(AppError::validation("Progress value must be a non-negative number"));
        }
        entry.value = value;
    }
    entry.updated_at = now();

    if payload.value.is_some() {
        let target = next
            .habits
            .get(&habit_id)
            .ok_or(AppError::NotFound("Habit"))?
            .target
            .value;
        let entry = next
            .progress
            .get_mut(&id)
            .ok_or(AppError::NotFound("Progress entry"))?;
        entry.completed = entry.value >= target;
    }

    let entry = next
        .progress
        .get(&id)
        .ok_or(AppError::NotFound("Progress entry"))?
        .clone();
    let saved = view(&next, &entry)?;
    state.commit(&mut data, next).await?;

    Ok(Json(json!({ "message": "Progress updated successfully", "progress": saved })))
}

pub async fn delete_progress(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let mut data = state.data.lock().await;
    data.entry_for(&user.0, &id)
        .ok_or(AppError::NotFound("Progress entry"))?;

    let mut next = data.clone();
    next.progress.remove(&id);
    state.commit(&mut data, next).await?;

    Ok(Json(json!({ "message": "Progress entry deleted successfully" })))
}

#[derive(Debug, Deserialize)]
pub struct SummaryRange {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct Summary {
    total_entries: usize,
    completed_entries: usize,
    completion_rate: f64,
    average_value: f64,
}

#[derive(Debug, Serialize)]
struct MoodCount {
    mood: Mood,
    count: usize,
}

#[derive(Debug, Serialize)]
struct DifficultyCount {
    difficulty: Difficulty,
    count: usize,
}

pub async fn progress_summary(
    State(state): State<AppState>,
    user: UserId,
    Query(range): Query<SummaryRange>,
) -> Result<Json<Value>, AppError> {
    let data = state.data.lock().await;
    let entries: Vec<&ProgressEntry> = data
        .progress
        .values()
        .filter(|entry| entry.user == user.0)
        .filter(|entry| range.start_date.is_none_or(|start| entry.day() >= start))
        .filter(|entry| range.end_date.is_none_or(|end| entry.day() <= end))
        .collect();

    let total_entries = entries.len();
    let completed_entries = entries.iter().filter(|entry| entry.completed).count();
    let completion_rate = if total_entries > 0 {
        let rate = completed_entries as f64 / total_entries as f64 * 100.0;
        (rate * 100.0).round() / 100.0
    } else {
        0.0
    };
    let average_value = if total_entries > 0 {
        entries.iter().map(|entry| entry.value).sum::<f64>() / total_entries as f64
    } else {
        0.0
    };

    let mut moods: HashMap<Mood, usize> = HashMap::new();
    let mut difficulties: HashMap<Difficulty, usize> = HashMap::new();
    for entry in &entries {
        *moods.entry(entry.mood).or_default() += 1;
        *difficulties.entry(entry.difficulty).or_default() += 1;
    }

    let mut mood_stats: Vec<MoodCount> = moods
        .into_iter()
        .map(|(mood, count)| MoodCount { mood, count })
        .collect();
    mood_stats.sort_by(|a, b| b.count.cmp(&a.count));

    let mut difficulty_stats: Vec<DifficultyCount> = difficulties
        .into_iter()
        .map(|(difficulty, count)| DifficultyCount { difficulty, count })
        .collect();
    difficulty_stats.sort_by(|a, b| b.count.cmp(&a.count));

    Ok(Json(json!({
        "summary": Summary {
            total_entries,
            completed_entries,
            completion_rate,
            average_value,
        },
        "mood_stats": mood_stats,
        "difficulty_stats": difficulty_stats,
    })))
}

/// Distinct calendar days with at least one logged entry for a user.
pub fn days_logged(data: &AppData, user: &str) -> usize {
    data.progress
        .values()
        .filter(|entry| entry.user == user)
        .map(ProgressEntry::day)
        .collect::<BTreeSet<NaiveDate>>()
        .len()
}
