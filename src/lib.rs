mod application;
mod domain;
mod infrastructure;

use application::bootstrap::bootstrap_workspace;
use application::commands::{
    add_task_impl, configure_timer_impl, delete_task_impl, get_timer_state_impl, list_tasks_impl,
    log_pomodoro_impl, reset_timer_impl, set_current_task_impl, task_activity_impl,
    tick_timer_impl, toggle_task_impl, toggle_timer_impl, AppState, TimerStateResponse,
};
use domain::models::{DailyActivity, Task};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Serialize)]
struct BootstrapResponse {
    workspace_root: String,
    database_path: String,
}

#[tauri::command]
fn bootstrap(root: Option<String>) -> Result<BootstrapResponse, String> {
    let workspace_root = match root {
        Some(path) => PathBuf::from(path),
        None => std::env::current_dir().map_err(|error| error.to_string())?,
    };

    let result = bootstrap_workspace(&workspace_root).map_err(|error| error.to_string())?;
    Ok(BootstrapResponse {
        workspace_root: result.workspace_root.display().to_string(),
        database_path: result.database_path.display().to_string(),
    })
}

#[tauri::command]
fn ping() -> &'static str {
    "pong"
}

#[tauri::command]
fn list_tasks(state: tauri::State<'_, Arc<AppState>>) -> Result<Vec<Task>, String> {
    list_tasks_impl(state.inner()).map_err(|error| state.command_error("list_tasks", &error))
}

#[tauri::command]
fn add_task(state: tauri::State<'_, Arc<AppState>>, text: String) -> Result<Option<Task>, String> {
    add_task_impl(state.inner(), text).map_err(|error| state.command_error("add_task", &error))
}

#[tauri::command]
fn toggle_task(state: tauri::State<'_, Arc<AppState>>, task_id: i64) -> Result<bool, String> {
    toggle_task_impl(state.inner(), task_id)
        .map_err(|error| state.command_error("toggle_task", &error))
}

#[tauri::command]
fn delete_task(state: tauri::State<'_, Arc<AppState>>, task_id: i64) -> Result<bool, String> {
    delete_task_impl(state.inner(), task_id)
        .map_err(|error| state.command_error("delete_task", &error))
}

#[tauri::command]
fn set_current_task(
    state: tauri::State<'_, Arc<AppState>>,
    task_id: Option<i64>,
) -> Result<Option<i64>, String> {
    set_current_task_impl(state.inner(), task_id)
        .map_err(|error| state.command_error("set_current_task", &error))
}

#[tauri::command]
fn log_pomodoro(
    state: tauri::State<'_, Arc<AppState>>,
    task_id: i64,
    duration_minutes: u32,
) -> Result<bool, String> {
    log_pomodoro_impl(state.inner(), task_id, duration_minutes)
        .map_err(|error| state.command_error("log_pomodoro", &error))
}

#[tauri::command]
fn task_activity(
    state: tauri::State<'_, Arc<AppState>>,
    task_id: i64,
) -> Result<Vec<DailyActivity>, String> {
    task_activity_impl(state.inner(), task_id)
        .map_err(|error| state.command_error("task_activity", &error))
}

#[tauri::command]
fn get_timer_state(state: tauri::State<'_, Arc<AppState>>) -> Result<TimerStateResponse, String> {
    get_timer_state_impl(state.inner())
        .map_err(|error| state.command_error("get_timer_state", &error))
}

#[tauri::command]
fn configure_timer(
    state: tauri::State<'_, Arc<AppState>>,
    work_minutes: u32,
    break_minutes: u32,
) -> Result<TimerStateResponse, String> {
    configure_timer_impl(state.inner(), work_minutes, break_minutes)
        .map_err(|error| state.command_error("configure_timer", &error))
}

// Async so the rescheduled ticker lands on the Tauri async runtime.
#[tauri::command]
async fn toggle_timer(
    state: tauri::State<'_, Arc<AppState>>,
) -> Result<TimerStateResponse, String> {
    toggle_timer_impl(state.inner()).map_err(|error| state.command_error("toggle_timer", &error))
}

#[tauri::command]
async fn reset_timer(state: tauri::State<'_, Arc<AppState>>) -> Result<TimerStateResponse, String> {
    reset_timer_impl(state.inner()).map_err(|error| state.command_error("reset_timer", &error))
}

#[tauri::command]
fn tick_timer(state: tauri::State<'_, Arc<AppState>>) -> Result<TimerStateResponse, String> {
    tick_timer_impl(state.inner()).map_err(|error| state.command_error("tick_timer", &error))
}

pub fn run() {
    let workspace_root = std::env::current_dir().expect("failed to resolve current directory");
    let app_state =
        Arc::new(AppState::new(workspace_root).expect("failed to initialize app state"));

    tauri::Builder::default()
        .manage(app_state)
        .invoke_handler(tauri::generate_handler![
            ping,
            bootstrap,
            list_tasks,
            add_task,
            toggle_task,
            delete_task,
            set_current_task,
            log_pomodoro,
            task_activity,
            get_timer_state,
            configure_timer,
            toggle_timer,
            reset_timer,
            tick_timer
        ])
        .run(tauri::generate_context!())
        .expect("failed to run tauri app");
}
