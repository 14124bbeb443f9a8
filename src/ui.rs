use axum::response::Html;

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Wellness Tracker</title>
  <style>
    :root {
      --bg: #f6f7fb;
      --ink: #1f2933;
      --accent: #3b82f6;
      --good: #10b981;
      --muted: #6b7280;
      --card: #ffffff;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Segoe UI", "Helvetica Neue", sans-serif;
      padding: 32px 18px 48px;
      display: grid;
      justify-items: center;
    }

    .app {
      width: min(900px, 100%);
      display: grid;
      gap: 20px;
    }

    h1 {
      margin: 0;
      font-size: 1.8rem;
    }

    .subtitle {
      margin: 4px 0 0;
      color: var(--muted);
    }

    .card {
      background: var(--card);
      border-radius: 14px;
      border: 1px solid rgba(31, 41, 51, 0.08);
      padding: 18px;
    }

    .row {
      display: flex;
      flex-wrap: wrap;
      gap: 10px;
      align-items: center;
    }

    input, select {
      padding: 8px 10px;
      border-radius: 8px;
      border: 1px solid rgba(31, 41, 51, 0.2);
      font-size: 0.95rem;
    }

    button {
      padding: 8px 16px;
      border: none;
      border-radius: 8px;
      background: var(--accent);
      color: white;
      font-weight: 600;
      cursor: pointer;
    }

    button.good {
      background: var(--good);
    }

    .stats {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(140px, 1fr));
      gap: 12px;
    }

    .stat .label {
      display: block;
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.08em;
      color: var(--muted);
    }

    .stat .value {
      font-size: 1.5rem;
      font-weight: 600;
    }

    ul {
      list-style: none;
      margin: 10px 0 0;
      padding: 0;
      display: grid;
      gap: 8px;
    }

    li {
      padding: 10px 12px;
      border-radius: 10px;
      background: rgba(59, 130, 246, 0.06);
      display: flex;
      justify-content: space-between;
      gap: 10px;
      flex-wrap: wrap;
    }

    .streak {
      color: var(--good);
      font-weight: 600;
    }

    .status {
      color: var(--muted);
      min-height: 1.2em;
      font-size: 0.9rem;
    }

    .status[data-type="error"] {
      color: #c0392b;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Wellness Tracker</h1>
      <p class="subtitle">Habits, goals and daily progress.</p>
    </header>

    <section class="card row">
      <label for="user">User</label>
      <input id="user" placeholder="user id" />
      <button id="load-btn" type="button">Load</button>
      <span class="status" id="status"></span>
    </section>

    <section class="card">
      <h2>Overview</h2>
      <div class="stats">
        <div class="stat"><span class="label">Habits</span><span class="value" id="stat-habits">-</span></div>
        <div class="stat"><span class="label">Active</span><span class="value" id="stat-active">-</span></div>
        <div class="stat"><span class="label">Goals done</span><span class="value" id="stat-goals">-</span></div>
        <div class="stat"><span class="label">Best streak</span><span class="value" id="stat-streak">-</span></div>
        <div class="stat"><span class="label">Days logged</span><span class="value" id="stat-days">-</span></div>
      </div>
    </section>

    <section class="card">
      <h2>Habits</h2>
      <ul id="habit-list"></ul>
      <div class="row" style="margin-top: 12px;">
        <select id="log-habit"></select>
        <input id="log-value" type="number" min="0" step="any" placeholder="value" />
        <button class="good" id="log-btn" type="button">Log today</button>
      </div>
    </section>

    <section class="card">
      <h2>Goals</h2>
      <ul id="goal-list"></ul>
    </section>
  </main>

  <script>
    const statusEl = document.getElementById('status');
    const userEl = document.getElementById('user');
    userEl.value = localStorage.getItem('wellness_user') || '';

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const api = async (path, options = {}) => {
      const user = userEl.value.trim();
      if (!user) {
        throw new Error('Enter a user id first');
      }
      const res = await fetch(path, {
        ...options,
        headers: {
          'content-type': 'application/json',
          'x-user-id': user,
          ...(options.headers || {})
        }
      });
      const body = await res.json().catch(() => ({}));
      if (!res.ok) {
        throw new Error(body.message || 'Request failed');
      }
      return body;
    };

    const renderHabits = (habits) => {
      const list = document.getElementById('habit-list');
      const picker = document.getElementById('log-habit');
      list.innerHTML = '';
      picker.innerHTML = '';
      habits.forEach((habit) => {
        const li = document.createElement('li');
        li.innerHTML = `<span>${habit.icon} ${habit.name} · ${habit.target.value} ${habit.target.unit}/${habit.target.frequency}</span>` +
          `<span class="streak">streak ${habit.streak.current} (best ${habit.streak.longest})</span>`;
        list.appendChild(li);

        const option = document.createElement('option');
        option.value = habit.id;
        option.textContent = habit.name;
        picker.appendChild(option);
      });
    };

    const renderGoals = (goals) => {
      const list = document.getElementById('goal-list');
      list.innerHTML = '';
      goals.forEach((goal) => {
        const li = document.createElement('li');
        li.innerHTML = `<span>${goal.title}</span>` +
          `<span>${goal.progress.percentage}% · ${goal.status}</span>`;
        list.appendChild(li);
      });
    };

    const refresh = async () => {
      localStorage.setItem('wellness_user', userEl.value.trim());
      const [habits, goals, stats] = await Promise.all([
        api('/api/habits'),
        api('/api/goals'),
        api('/api/users/stats')
      ]);
      renderHabits(habits.habits);
      renderGoals(goals.goals);
      document.getElementById('stat-habits').textContent = stats.stats.total_habits;
      document.getElementById('stat-active').textContent = stats.stats.active_habits;
      document.getElementById('stat-goals').textContent = stats.stats.completed_goals;
      document.getElementById('stat-streak').textContent = stats.stats.current_streak;
      document.getElementById('stat-days').textContent = stats.stats.total_days;
      setStatus('Loaded', 'ok');
    };

    document.getElementById('load-btn').addEventListener('click', () => {
      refresh().catch((err) => setStatus(err.message, 'error'));
    });

    document.getElementById('log-btn').addEventListener('click', async () => {
      try {
        const habit = document.getElementById('log-habit').value;
        const value = Number(document.getElementById('log-value').value);
        const habits = await api('/api/habits');
        const picked = habits.habits.find((h) => h.id === habit);
        await api('/api/progress', {
          method: 'POST',
          body: JSON.stringify({ habit, value, unit: picked ? picked.target.unit : 'times' })
        });
        setStatus('Logged', 'ok');
        await refresh();
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });

    if (userEl.value) {
      refresh().catch(() => setStatus('', ''));
    }
  </script>
</body>
</html>
"#;
