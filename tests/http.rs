use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "wellness_tracker_http_{}_{}.json",
        std::process::id(),
        nanos
    ));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/health")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_wellness_tracker"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

// Tests share one server; each uses its own user id so state never bleeds.

async fn post_json(client: &Client, url: &str, user: &str, body: Value) -> reqwest::Response {
    client
        .post(url)
        .header("x-user-id", user)
        .json(&body)
        .send()
        .await
        .unwrap()
}

async fn put_json(client: &Client, url: &str, user: &str, body: Value) -> reqwest::Response {
    client
        .put(url)
        .header("x-user-id", user)
        .json(&body)
        .send()
        .await
        .unwrap()
}

async fn get(client: &Client, url: &str, user: &str) -> reqwest::Response {
    client
        .get(url)
        .header("x-user-id", user)
        .send()
        .await
        .unwrap()
}

async fn create_habit(client: &Client, base: &str, user: &str, name: &str, target: f64) -> Value {
    let resp = post_json(
        client,
        &format!("{base}/api/habits"),
        user,
        json!({
            "name": name,
            "category": "water",
            "target": { "value": target, "unit": "glasses", "frequency": "daily" }
        }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json::<Value>().await.unwrap()["habit"].clone()
}

async fn log_progress(
    client: &Client,
    base: &str,
    user: &str,
    habit: &str,
    value: f64,
    date: &str,
) -> reqwest::Response {
    post_json(
        client,
        &format!("{base}/api/progress"),
        user,
        json!({ "habit": habit, "value": value, "unit": "glasses", "date": date }),
    )
    .await
}

#[tokio::test]
async fn health_and_missing_identity() {
    let server = shared_server().await;
    let client = Client::new();

    let health = client
        .get(format!("{}/api/health", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(health.status().is_success());

    let unauthorized = client
        .get(format!("{}/api/habits", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn completion_derived_from_target() {
    let server = shared_server().await;
    let client = Client::new();
    let user = "completion-user";
    let habit = create_habit(&client, &server.base_url, user, "Water", 8.0).await;
    let habit_id = habit["id"].as_str().unwrap();

    let below = log_progress(&client, &server.base_url, user, habit_id, 5.0, "2026-01-05").await;
    assert_eq!(below.status(), StatusCode::CREATED);
    let body: Value = below.json().await.unwrap();
    assert_eq!(body["progress"]["completed"], json!(false));
    let entry_id = body["progress"]["id"].as_str().unwrap().to_string();

    // A below-target day leaves the streak untouched.
    let fetched = get(
        &client,
        &format!("{}/api/habits/{habit_id}", server.base_url),
        user,
    )
    .await
    .json::<Value>()
    .await
    .unwrap();
    assert_eq!(fetched["habit"]["streak"]["current"], json!(0));

    // Editing the value past the target re-derives completed.
    let edited = put_json(
        &client,
        &format!("{}/api/progress/{entry_id}", server.base_url),
        user,
        json!({ "value": 9.0 }),
    )
    .await;
    assert_eq!(edited.status(), StatusCode::OK);
    let body: Value = edited.json().await.unwrap();
    assert_eq!(body["progress"]["completed"], json!(true));

    // But the edit never replays the streak engine.
    let fetched = get(
        &client,
        &format!("{}/api/habits/{habit_id}", server.base_url),
        user,
    )
    .await
    .json::<Value>()
    .await
    .unwrap();
    assert_eq!(fetched["habit"]["streak"]["current"], json!(0));
}

#[tokio::test]
async fn duplicate_day_is_rejected() {
    let server = shared_server().await;
    let client = Client::new();
    let user = "duplicate-user";
    let habit = create_habit(&client, &server.base_url, user, "Water", 8.0).await;
    let habit_id = habit["id"].as_str().unwrap();

    let first = log_progress(
        &client,
        &server.base_url,
        user,
        habit_id,
        8.0,
        "2026-02-03T08:00:00",
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    // Same calendar day, different time of day.
    let second = log_progress(
        &client,
        &server.base_url,
        user,
        habit_id,
        3.0,
        "2026-02-03T21:30:00",
    )
    .await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    let body: Value = second.json().await.unwrap();
    assert_eq!(body["message"], json!("Progress already logged for this date"));
}

#[tokio::test]
async fn concurrent_same_day_submissions_yield_one_insert() {
    let server = shared_server().await;
    let client = Client::new();
    let user = "race-user";
    let habit = create_habit(&client, &server.base_url, user, "Water", 8.0).await;
    let habit_id = habit["id"].as_str().unwrap();

    let (a, b) = tokio::join!(
        log_progress(&client, &server.base_url, user, habit_id, 8.0, "2026-02-10"),
        log_progress(&client, &server.base_url, user, habit_id, 8.0, "2026-02-10"),
    );

    let statuses = [a.status(), b.status()];
    assert!(statuses.contains(&StatusCode::CREATED));
    assert!(statuses.contains(&StatusCode::BAD_REQUEST));
}

#[tokio::test]
async fn streak_increments_resets_and_tracks_longest() {
    let server = shared_server().await;
    let client = Client::new();
    let user = "streak-user";
    let habit = create_habit(&client, &server.base_url, user, "Water", 8.0).await;
    let habit_id = habit["id"].as_str().unwrap();

    for (date, expected_current) in [
        ("2026-03-10", 1),
        ("2026-03-11", 2),
        ("2026-03-12", 3),
    ] {
        let resp = log_progress(&client, &server.base_url, user, habit_id, 8.0, date).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let fetched = get(
            &client,
            &format!("{}/api/habits/{habit_id}", server.base_url),
            user,
        )
        .await
        .json::<Value>()
        .await
        .unwrap();
        assert_eq!(fetched["habit"]["streak"]["current"], json!(expected_current));
        assert_eq!(fetched["habit"]["streak"]["longest"], json!(expected_current));
    }

    // Gap: day 13 missed, day 15 completed. Current resets, longest stays.
    let resp = log_progress(&client, &server.base_url, user, habit_id, 8.0, "2026-03-15").await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let fetched = get(
        &client,
        &format!("{}/api/habits/{habit_id}", server.base_url),
        user,
    )
    .await
    .json::<Value>()
    .await
    .unwrap();
    assert_eq!(fetched["habit"]["streak"]["current"], json!(1));
    assert_eq!(fetched["habit"]["streak"]["longest"], json!(3));
    assert_eq!(
        fetched["habit"]["streak"]["last_completed"],
        json!("2026-03-15")
    );
}

#[tokio::test]
async fn deleting_habit_cascades_to_progress() {
    let server = shared_server().await;
    let client = Client::new();
    let user = "cascade-user";
    let habit = create_habit(&client, &server.base_url, user, "Water", 8.0).await;
    let habit_id = habit["id"].as_str().unwrap().to_string();

    for date in ["2026-04-01", "2026-04-02", "2026-04-03"] {
        let resp = log_progress(&client, &server.base_url, user, &habit_id, 8.0, date).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let deleted = client
        .delete(format!("{}/api/habits/{habit_id}", server.base_url))
        .header("x-user-id", user)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::OK);

    let remaining = get(
        &client,
        &format!("{}/api/progress?habit={habit_id}", server.base_url),
        user,
    )
    .await
    .json::<Value>()
    .await
    .unwrap();
    assert_eq!(remaining["progress"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn habits_are_scoped_to_their_owner() {
    let server = shared_server().await;
    let client = Client::new();
    let habit = create_habit(&client, &server.base_url, "owner-user", "Water", 8.0).await;
    let habit_id = habit["id"].as_str().unwrap();

    let other = get(
        &client,
        &format!("{}/api/habits/{habit_id}", server.base_url),
        "other-user",
    )
    .await;
    assert_eq!(other.status(), StatusCode::NOT_FOUND);

    let logged = log_progress(
        &client,
        &server.base_url,
        "other-user",
        habit_id,
        8.0,
        "2026-05-01",
    )
    .await;
    assert_eq!(logged.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn goal_progress_recompute_and_milestones() {
    let server = shared_server().await;
    let client = Client::new();
    let user = "goal-user";

    let created = post_json(
        &client,
        &format!("{}/api/goals", server.base_url),
        user,
        json!({
            "title": "Read 50 pages",
            "category": "academic",
            "type": "short-term",
            "target": { "value": 50, "unit": "pages", "deadline": "2026-12-31" }
        }),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let goal: Value = created.json().await.unwrap();
    let goal_id = goal["goal"]["id"].as_str().unwrap().to_string();
    assert_eq!(goal["goal"]["status"], json!("not-started"));

    // Overshoot clamps to 100 and completes the goal.
    let updated = put_json(
        &client,
        &format!("{}/api/goals/{goal_id}/progress", server.base_url),
        user,
        json!({ "current": 75 }),
    )
    .await
    .json::<Value>()
    .await
    .unwrap();
    assert_eq!(updated["goal"]["progress"]["percentage"], json!(100));
    assert_eq!(updated["goal"]["status"], json!("completed"));

    // Halfway is in-progress.
    let updated = put_json(
        &client,
        &format!("{}/api/goals/{goal_id}/progress", server.base_url),
        user,
        json!({ "current": 25 }),
    )
    .await
    .json::<Value>()
    .await
    .unwrap();
    assert_eq!(updated["goal"]["progress"]["percentage"], json!(50));
    assert_eq!(updated["goal"]["status"], json!("in-progress"));

    // Paused sticks through a recompute.
    put_json(
        &client,
        &format!("{}/api/goals/{goal_id}", server.base_url),
        user,
        json!({ "status": "paused" }),
    )
    .await;
    let updated = put_json(
        &client,
        &format!("{}/api/goals/{goal_id}/progress", server.base_url),
        user,
        json!({ "current": 40 }),
    )
    .await
    .json::<Value>()
    .await
    .unwrap();
    assert_eq!(updated["goal"]["progress"]["percentage"], json!(80));
    assert_eq!(updated["goal"]["status"], json!("paused"));

    // Milestone toggle is independent of percentage/status.
    let with_milestone = post_json(
        &client,
        &format!("{}/api/goals/{goal_id}/milestones", server.base_url),
        user,
        json!({ "title": "First chapter" }),
    )
    .await
    .json::<Value>()
    .await
    .unwrap();
    let milestone_id = with_milestone["goal"]["milestones"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let toggled = put_json(
        &client,
        &format!(
            "{}/api/goals/{goal_id}/milestones/{milestone_id}",
            server.base_url
        ),
        user,
        json!({}),
    )
    .await
    .json::<Value>()
    .await
    .unwrap();
    assert_eq!(toggled["goal"]["milestones"][0]["completed"], json!(true));
    assert!(toggled["goal"]["milestones"][0]["completed_at"].is_string());
    assert_eq!(toggled["goal"]["progress"]["percentage"], json!(80));

    let toggled_off = put_json(
        &client,
        &format!(
            "{}/api/goals/{goal_id}/milestones/{milestone_id}",
            server.base_url
        ),
        user,
        json!({}),
    )
    .await
    .json::<Value>()
    .await
    .unwrap();
    assert_eq!(toggled_off["goal"]["milestones"][0]["completed"], json!(false));
    assert!(toggled_off["goal"]["milestones"][0].get("completed_at").is_none());
}

#[tokio::test]
async fn zero_target_goal_leaves_percentage_unchanged() {
    let server = shared_server().await;
    let client = Client::new();
    let user = "zero-target-user";

    let created = post_json(
        &client,
        &format!("{}/api/goals", server.base_url),
        user,
        json!({
            "title": "Placeholder goal",
            "category": "personal",
            "type": "long-term",
            "target": { "value": 0, "unit": "times", "deadline": "2027-01-01" }
        }),
    )
    .await
    .json::<Value>()
    .await
    .unwrap();
    let goal_id = created["goal"]["id"].as_str().unwrap();

    let updated = put_json(
        &client,
        &format!("{}/api/goals/{goal_id}/progress", server.base_url),
        user,
        json!({ "current": 10 }),
    )
    .await;
    assert_eq!(updated.status(), StatusCode::OK);
    let body: Value = updated.json().await.unwrap();
    assert_eq!(body["goal"]["progress"]["percentage"], json!(0));
    assert_eq!(body["goal"]["progress"]["current"], json!(10.0));
}

#[tokio::test]
async fn user_stats_aggregate_habits_goals_and_days() {
    let server = shared_server().await;
    let client = Client::new();
    let user = "stats-user";

    let habit = create_habit(&client, &server.base_url, user, "Water", 8.0).await;
    let habit_id = habit["id"].as_str().unwrap();
    for date in ["2026-06-01", "2026-06-02"] {
        let resp = log_progress(&client, &server.base_url, user, habit_id, 8.0, date).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let stats = get(
        &client,
        &format!("{}/api/users/stats", server.base_url),
        user,
    )
    .await
    .json::<Value>()
    .await
    .unwrap();
    assert_eq!(stats["stats"]["total_habits"], json!(1));
    assert_eq!(stats["stats"]["active_habits"], json!(1));
    assert_eq!(stats["stats"]["current_streak"], json!(2));
    assert_eq!(stats["stats"]["total_days"], json!(2));
}

#[tokio::test]
async fn progress_summary_counts_completions() {
    let server = shared_server().await;
    let client = Client::new();
    let user = "summary-user";

    let habit = create_habit(&client, &server.base_url, user, "Water", 8.0).await;
    let habit_id = habit["id"].as_str().unwrap();
    let resp = log_progress(&client, &server.base_url, user, habit_id, 8.0, "2026-07-01").await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let resp = log_progress(&client, &server.base_url, user, habit_id, 2.0, "2026-07-02").await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let summary = get(
        &client,
        &format!("{}/api/progress/stats/summary", server.base_url),
        user,
    )
    .await
    .json::<Value>()
    .await
    .unwrap();
    assert_eq!(summary["summary"]["total_entries"], json!(2));
    assert_eq!(summary["summary"]["completed_entries"], json!(1));
    assert_eq!(summary["summary"]["completion_rate"], json!(50.0));
    assert_eq!(summary["summary"]["average_value"], json!(5.0));
}
