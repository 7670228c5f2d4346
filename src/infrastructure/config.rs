use crate::infrastructure::error::InfraError;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const APP_JSON: &str = "app.json";
const TIMER_JSON: &str = "timer.json";

pub const DEFAULT_WORK_MINUTES: u32 = 25;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSettings {
    pub work_minutes: u32,
    pub break_minutes: u32,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            work_minutes: DEFAULT_WORK_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
        }
    }
}

fn default_files() -> HashMap<&'static str, serde_json::Value> {
    HashMap::from([
        (
            APP_JSON,
            serde_json::json!({
                "schema": 1,
                "appName": "Pomodoro & Tareas",
                "timezone": "UTC"
            }),
        ),
        (
            TIMER_JSON,
            serde_json::json!({
                "schema": 1,
                "workMinutes": DEFAULT_WORK_MINUTES,
                "breakMinutes": DEFAULT_BREAK_MINUTES
            }),
        ),
    ])
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    for (name, value) in default_files() {
        let path = config_dir.join(name);
        if !path.exists() {
            let formatted = serde_json::to_string_pretty(&value)?;
            fs::write(path, format!("{formatted}\n"))?;
        }
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != 1 {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

/// Reads the persisted timer durations, falling back to the defaults for
/// any value that is missing, unreadable or zero.
pub fn load_timer_settings(config_dir: &Path) -> TimerSettings {
    let mut settings = TimerSettings::default();
    let Ok(parsed) = read_config(&config_dir.join(TIMER_JSON)) else {
        return settings;
    };

    if let Some(value) = parsed.get("workMinutes").and_then(serde_json::Value::as_u64) {
        if value > 0 {
            settings.work_minutes = value as u32;
        }
    }
    if let Some(value) = parsed.get("breakMinutes").and_then(serde_json::Value::as_u64) {
        if value > 0 {
            settings.break_minutes = value as u32;
        }
    }
    settings
}

pub fn save_timer_settings(config_dir: &Path, settings: TimerSettings) -> Result<(), InfraError> {
    let payload = serde_json::json!({
        "schema": 1,
        "workMinutes": settings.work_minutes,
        "breakMinutes": settings.break_minutes,
    });
    let formatted = serde_json::to_string_pretty(&payload)?;
    fs::write(config_dir.join(TIMER_JSON), format!("{formatted}\n"))?;
    Ok(())
}
