use crate::application::bootstrap::bootstrap_workspace;
use crate::application::ticker::TickerHandle;
use crate::domain::models::{DailyActivity, Task};
use crate::domain::timer::{FocusTimer, Phase, TickOutcome};
use crate::infrastructure::alert::{AlertSink, SilentAlertSink};
use crate::infrastructure::config::{load_timer_settings, save_timer_settings, TimerSettings};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::kv_store::{KeyValueStore, SqliteKeyValueStore};
use chrono::Utc;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

const TASKS_KEY: &str = "tasks";

static LAST_TASK_ID: AtomicI64 = AtomicI64::new(0);

/// Millisecond-timestamp task id, bumped past the previous one so rapid
/// successive creation within the same millisecond still yields unique,
/// strictly increasing ids.
fn next_task_id() -> i64 {
    let now = Utc::now().timestamp_millis();
    let previous = LAST_TASK_ID
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |last| {
            Some(last.max(now - 1) + 1)
        })
        .unwrap_or(now - 1);
    previous.max(now - 1) + 1
}

type PersistObserver = Box<dyn Fn(&InfraError) + Send + Sync>;

pub struct AppState {
    config_dir: PathBuf,
    logs_dir: PathBuf,
    store: Arc<dyn KeyValueStore>,
    alert: Arc<dyn AlertSink>,
    runtime: Mutex<RuntimeState>,
    ticker: Mutex<Option<TickerHandle>>,
    log_guard: Mutex<()>,
    persist_observer: Mutex<Option<PersistObserver>>,
}

impl AppState {
    pub fn new(workspace_root: PathBuf) -> Result<Self, InfraError> {
        let database_path = workspace_root.join("state").join("tareas.sqlite");
        let store = Arc::new(SqliteKeyValueStore::new(&database_path));
        Self::with_components(workspace_root, store, Arc::new(SilentAlertSink))
    }

    pub fn with_components(
        workspace_root: PathBuf,
        store: Arc<dyn KeyValueStore>,
        alert: Arc<dyn AlertSink>,
    ) -> Result<Self, InfraError> {
        bootstrap_workspace(&workspace_root)?;
        let config_dir = workspace_root.join("config");
        let logs_dir = workspace_root.join("logs");
        let settings = load_timer_settings(&config_dir);

        let state = Self {
            config_dir,
            logs_dir,
            store,
            alert,
            runtime: Mutex::new(RuntimeState {
                tasks: Vec::new(),
                current_task_id: None,
                timer: FocusTimer::new(settings.work_minutes, settings.break_minutes),
            }),
            ticker: Mutex::new(None),
            log_guard: Mutex::new(()),
            persist_observer: Mutex::new(None),
        };

        // A snapshot that cannot be read back whole is discarded, not
        // surfaced: the application starts with an empty collection.
        match load_snapshot(state.store.as_ref()) {
            Ok(tasks) => {
                let mut runtime = lock_runtime(&state)?;
                runtime.tasks = tasks;
            }
            Err(error) => {
                state.log_error("load_tasks", &format!("discarding snapshot: {error}"));
            }
        }

        Ok(state)
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Called with every failed snapshot write. Observation only; no
    /// control flow depends on persistence success.
    pub fn set_persist_observer(&self, observer: PersistObserver) {
        if let Ok(mut slot) = self.persist_observer.lock() {
            *slot = Some(observer);
        }
    }

    pub fn command_error(&self, command: &str, error: &InfraError) -> String {
        self.log_error(command, &error.to_string());
        error.to_string()
    }

    pub fn log_info(&self, command: &str, message: &str) {
        self.append_log("info", command, message);
    }

    pub fn log_error(&self, command: &str, message: &str) {
        self.append_log("error", command, message);
    }

    fn append_log(&self, level: &str, command: &str, message: &str) {
        let Ok(_guard) = self.log_guard.lock() else {
            return;
        };
        let path = self.logs_dir.join("commands.log");
        let payload = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "command": command,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", payload);
        }
    }

    fn notify_persist_failure(&self, error: &InfraError) {
        if let Ok(slot) = self.persist_observer.lock() {
            if let Some(observer) = slot.as_ref() {
                observer(error);
            }
        }
    }
}

#[derive(Debug)]
struct RuntimeState {
    tasks: Vec<Task>,
    current_task_id: Option<i64>,
    timer: FocusTimer,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TimerStateResponse {
    pub phase: String,
    pub remaining_seconds: u32,
    pub running: bool,
    pub finishing: bool,
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub current_task_id: Option<i64>,
}

pub fn list_tasks_impl(state: &AppState) -> Result<Vec<Task>, InfraError> {
    let runtime = lock_runtime(state)?;
    Ok(runtime.tasks.clone())
}

/// Appends a task with zeroed statistics. Blank text is rejected as a
/// no-op rather than an error.
pub fn add_task_impl(state: &AppState, text: String) -> Result<Option<Task>, InfraError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let task = Task::new(next_task_id(), text);
    {
        let mut runtime = lock_runtime(state)?;
        runtime.tasks.push(task.clone());
        persist_tasks(state, &runtime.tasks);
    }

    state.log_info("add_task", &format!("created task_id={}", task.id()));
    Ok(Some(task))
}

/// Flips `completed` on the matching task. Unknown ids are silent no-ops:
/// the task may have been deleted by another UI action in the meantime.
pub fn toggle_task_impl(state: &AppState, task_id: i64) -> Result<bool, InfraError> {
    let mut runtime = lock_runtime(state)?;
    let Some(task) = runtime.tasks.iter_mut().find(|task| task.id() == task_id) else {
        return Ok(false);
    };
    task.toggle_completed();
    persist_tasks(state, &runtime.tasks);
    drop(runtime);

    state.log_info("toggle_task", &format!("toggled task_id={task_id}"));
    Ok(true)
}

/// Removes the task and all its sessions irrecoverably. Clears the focus
/// when the deleted task was the focused one.
pub fn delete_task_impl(state: &AppState, task_id: i64) -> Result<bool, InfraError> {
    let mut runtime = lock_runtime(state)?;
    let before = runtime.tasks.len();
    runtime.tasks.retain(|task| task.id() != task_id);
    if runtime.tasks.len() == before {
        return Ok(false);
    }
    if runtime.current_task_id == Some(task_id) {
        runtime.current_task_id = None;
    }
    persist_tasks(state, &runtime.tasks);
    drop(runtime);

    state.log_info("delete_task", &format!("deleted task_id={task_id}"));
    Ok(true)
}

/// Selects the task that receives the next completed pomodoro, or clears
/// the selection. Unknown ids keep the existing focus untouched.
pub fn set_current_task_impl(
    state: &AppState,
    task_id: Option<i64>,
) -> Result<Option<i64>, InfraError> {
    let mut runtime = lock_runtime(state)?;
    match task_id {
        None => runtime.current_task_id = None,
        Some(id) => {
            if runtime.tasks.iter().any(|task| task.id() == id) {
                runtime.current_task_id = Some(id);
            }
        }
    }
    Ok(runtime.current_task_id)
}

/// Records one completed work interval of `duration_minutes` against the
/// matching task, dated today. Unknown ids are silent no-ops.
pub fn log_pomodoro_impl(
    state: &AppState,
    task_id: i64,
    duration_minutes: u32,
) -> Result<bool, InfraError> {
    let mut runtime = lock_runtime(state)?;
    if !log_session_against(&mut runtime.tasks, task_id, duration_minutes) {
        return Ok(false);
    }
    persist_tasks(state, &runtime.tasks);
    drop(runtime);

    state.log_info(
        "log_pomodoro",
        &format!("logged {duration_minutes}m against task_id={task_id}"),
    );
    Ok(true)
}

/// Per-date study minutes for the details chart. Unknown ids yield an
/// empty view.
pub fn task_activity_impl(state: &AppState, task_id: i64) -> Result<Vec<DailyActivity>, InfraError> {
    let runtime = lock_runtime(state)?;
    Ok(runtime
        .tasks
        .iter()
        .find(|task| task.id() == task_id)
        .map(Task::daily_activity)
        .unwrap_or_default())
}

pub fn get_timer_state_impl(state: &AppState) -> Result<TimerStateResponse, InfraError> {
    let runtime = lock_runtime(state)?;
    Ok(to_timer_state_response(&runtime))
}

/// Updates the configured durations, persisting them best-effort as the
/// new launch defaults. A paused timer reflects the change immediately; a
/// running countdown is untouched until the next boundary or reset.
pub fn configure_timer_impl(
    state: &AppState,
    work_minutes: u32,
    break_minutes: u32,
) -> Result<TimerStateResponse, InfraError> {
    if work_minutes == 0 || break_minutes == 0 {
        return Err(InfraError::InvalidConfig(
            "timer durations must be positive minutes".to_string(),
        ));
    }

    let snapshot = {
        let mut runtime = lock_runtime(state)?;
        runtime.timer.configure(work_minutes, break_minutes);
        to_timer_state_response(&runtime)
    };

    if let Err(error) = save_timer_settings(
        state.config_dir(),
        TimerSettings {
            work_minutes,
            break_minutes,
        },
    ) {
        state.log_error("configure_timer", &error.to_string());
    }

    state.log_info(
        "configure_timer",
        &format!("work={work_minutes}m break={break_minutes}m"),
    );
    Ok(snapshot)
}

/// Starts or pauses the countdown, rescheduling the one-second tick source
/// to match.
pub fn toggle_timer_impl(state: &Arc<AppState>) -> Result<TimerStateResponse, InfraError> {
    let snapshot = {
        let mut runtime = lock_runtime(state)?;
        runtime.timer.toggle();
        to_timer_state_response(&runtime)
    };
    reschedule_ticker(state, snapshot.running)?;

    state.log_info(
        "toggle_timer",
        if snapshot.running {
            "timer started"
        } else {
            "timer paused"
        },
    );
    Ok(snapshot)
}

/// Discards any in-progress countdown, returns to a paused work phase and
/// cancels the tick source.
pub fn reset_timer_impl(state: &Arc<AppState>) -> Result<TimerStateResponse, InfraError> {
    let snapshot = {
        let mut runtime = lock_runtime(state)?;
        runtime.timer.reset();
        to_timer_state_response(&runtime)
    };
    reschedule_ticker(state, false)?;

    state.log_info("reset_timer", "timer reset to work phase");
    Ok(snapshot)
}

/// Advances the countdown by one second. On a work boundary the completed
/// interval is attributed to the focused task (silently dropped when none
/// is focused) and the alert fires; on a break boundary only the alert
/// fires. Alert failures are swallowed and logged.
pub fn tick_timer_impl(state: &AppState) -> Result<TimerStateResponse, InfraError> {
    let mut runtime = lock_runtime(state)?;
    match runtime.timer.tick() {
        TickOutcome::WorkComplete { work_minutes } => {
            fire_alert(state, Phase::Work);
            let logged = match runtime.current_task_id {
                Some(task_id) => log_session_against(&mut runtime.tasks, task_id, work_minutes),
                None => false,
            };
            if logged {
                persist_tasks(state, &runtime.tasks);
            }
            state.log_info(
                "tick_timer",
                &format!("work phase complete ({work_minutes}m, session logged: {logged})"),
            );
        }
        TickOutcome::BreakComplete => {
            fire_alert(state, Phase::Break);
            state.log_info("tick_timer", "break phase complete");
        }
        TickOutcome::Counting | TickOutcome::Idle => {}
    }
    Ok(to_timer_state_response(&runtime))
}

fn lock_runtime(state: &AppState) -> Result<MutexGuard<'_, RuntimeState>, InfraError> {
    state
        .runtime
        .lock()
        .map_err(|error| InfraError::InvalidConfig(format!("runtime lock poisoned: {error}")))
}

fn to_timer_state_response(runtime: &RuntimeState) -> TimerStateResponse {
    TimerStateResponse {
        phase: runtime.timer.phase().as_str().to_string(),
        remaining_seconds: runtime.timer.time_left_seconds(),
        running: runtime.timer.is_running(),
        finishing: runtime.timer.is_finishing(),
        work_minutes: runtime.timer.work_minutes(),
        break_minutes: runtime.timer.break_minutes(),
        current_task_id: runtime.current_task_id,
    }
}

fn log_session_against(tasks: &mut [Task], task_id: i64, duration_minutes: u32) -> bool {
    let Some(task) = tasks.iter_mut().find(|task| task.id() == task_id) else {
        return false;
    };
    task.log_session(Utc::now().date_naive(), duration_minutes);
    true
}

/// Write-through snapshot after every mutation. Best-effort: a failed
/// write is logged and reported to the observer, never surfaced.
fn persist_tasks(state: &AppState, tasks: &[Task]) {
    let result = serde_json::to_string(tasks)
        .map_err(InfraError::from)
        .and_then(|payload| state.store.set(TASKS_KEY, &payload));
    if let Err(error) = result {
        state.log_error("save_tasks", &error.to_string());
        state.notify_persist_failure(&error);
    }
}

fn load_snapshot(store: &dyn KeyValueStore) -> Result<Vec<Task>, InfraError> {
    let Some(raw) = store.get(TASKS_KEY)? else {
        return Ok(Vec::new());
    };
    let tasks: Vec<Task> = serde_json::from_str(&raw)?;
    for task in &tasks {
        task.validate().map_err(InfraError::Snapshot)?;
    }
    Ok(tasks)
}

fn fire_alert(state: &AppState, completed_phase: Phase) {
    if let Err(error) = state.alert.play(completed_phase) {
        state.log_error("alert", &error.to_string());
    }
}

fn reschedule_ticker(state: &Arc<AppState>, running: bool) -> Result<(), InfraError> {
    let mut slot = state
        .ticker
        .lock()
        .map_err(|error| InfraError::InvalidConfig(format!("ticker lock poisoned: {error}")))?;
    // Dropping the old handle aborts its task before any replacement is
    // scheduled.
    *slot = None;
    if running {
        *slot = Some(TickerHandle::spawn(Arc::downgrade(state)));
    }
    Ok(())
}
