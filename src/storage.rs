use crate::errors::AppError;
use crate::models::{Goal, Habit, ProgressEntry, UserProfile};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    env,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::error;

/// The whole document store: one JSON file, collections keyed by id.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub habits: BTreeMap<String, Habit>,
    #[serde(default)]
    pub progress: BTreeMap<String, ProgressEntry>,
    #[serde(default)]
    pub goals: BTreeMap<String, Goal>,
    #[serde(default)]
    pub profiles: BTreeMap<String, UserProfile>,
}

impl AppData {
    pub fn habit_for(&self, user: &str, id: &str) -> Option<&Habit> {
        self.habits.get(id).filter(|habit| habit.user == user)
    }

    pub fn goal_for(&self, user: &str, id: &str) -> Option<&Goal> {
        self.goals.get(id).filter(|goal| goal.user == user)
    }

    pub fn entry_for(&self, user: &str, id: &str) -> Option<&ProgressEntry> {
        self.progress.get(id).filter(|entry| entry.user == user)
    }

    pub fn entry_on_day(&self, user: &str, habit: &str, day: NaiveDate) -> Option<&ProgressEntry> {
        self.progress
            .values()
            .find(|entry| entry.user == user && entry.habit == habit && entry.day() == day)
    }

    pub fn completed_on(&self, user: &str, habit: &str, day: NaiveDate) -> bool {
        self.entry_on_day(user, habit, day)
            .is_some_and(|entry| entry.completed)
    }

    /// Storage-level uniqueness constraint: one entry per (user, habit, day).
    pub fn insert_entry(&mut self, entry: ProgressEntry) -> Result<(), AppError> {
        if self
            .entry_on_day(&entry.user, &entry.habit, entry.day())
            .is_some()
        {
            return Err(AppError::DuplicateEntry);
        }
        self.progress.insert(entry.id.clone(), entry);
        Ok(())
    }

    /// Removes a habit and all of its progress entries. Returns the number
    /// of entries deleted alongside the habit.
    pub fn remove_habit_cascade(&mut self, id: &str) -> usize {
        self.habits.remove(id);
        let before = self.progress.len();
        self.progress.retain(|_, entry| entry.habit != id);
        before - self.progress.len()
    }
}

pub fn resolve_data_path() -> Result<PathBuf, std::io::Error> {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return Ok(PathBuf::from(path));
    }

    Ok(PathBuf::from("data/tracker.json"))
}

pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            AppData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data)?;
    fs::write(path, payload).await?;
    Ok(())
}
