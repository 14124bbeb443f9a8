use crate::state::AppState;
use crate::{goals, habits, progress, ui, users};
use axum::{
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ui::index))
        .route("/api/health", get(health))
        .route("/api/habits", get(habits::list_habits).post(habits::create_habit))
        .route(
            "/api/habits/:id",
            get(habits::get_habit)
                .put(habits::update_habit)
                .delete(habits::delete_habit),
        )
        .route("/api/habits/:id/toggle", post(habits::toggle_habit))
        .route("/api/habits/:id/progress", get(habits::habit_progress))
        .route(
            "/api/progress",
            get(progress::list_progress).post(progress::log_progress),
        )
        .route(
            "/api/progress/:id",
            get(progress::get_progress)
                .put(progress::update_progress)
                .delete(progress::delete_progress),
        )
        .route("/api/progress/stats/summary", get(progress::progress_summary))
        .route("/api/goals", get(goals::list_goals).post(goals::create_goal))
        .route(
            "/api/goals/:id",
            get(goals::get_goal)
                .put(goals::update_goal)
                .delete(goals::delete_goal),
        )
        .route("/api/goals/:id/progress", put(goals::update_goal_progress))
        .route("/api/goals/:id/milestones", post(goals::add_milestone))
        .route(
            "/api/goals/:id/milestones/:milestone_id",
            put(goals::toggle_milestone),
        )
        .route(
            "/api/users/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/api/users/stats", get(users::get_stats))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "OK", "message": "Wellness Tracker API is running" }))
}
