use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One completed work interval. Immutable once recorded; removed only when
/// the owning task is deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudySession {
    pub date: NaiveDate,
    pub duration: u32,
}

/// A to-do item carrying its accumulated study statistics.
///
/// `pomodoros` and `total_time` are caches over `sessions`; the fields are
/// private so the only grow path is [`Task::log_session`], which keeps the
/// caches in sync. Snapshots that arrive with the caches out of sync fail
/// [`Task::validate`] and are discarded at load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: i64,
    text: String,
    completed: bool,
    pomodoros: u32,
    sessions: Vec<StudySession>,
    total_time: u32,
}

impl Task {
    /// Creates a task with zeroed statistics. `text` is assumed non-empty;
    /// the command boundary rejects blank input before construction.
    pub fn new(id: i64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            pomodoros: 0,
            sessions: Vec::new(),
            total_time: 0,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn pomodoros(&self) -> u32 {
        self.pomodoros
    }

    pub fn total_time(&self) -> u32 {
        self.total_time
    }

    pub fn sessions(&self) -> &[StudySession] {
        &self.sessions
    }

    pub fn toggle_completed(&mut self) {
        self.completed = !self.completed;
    }

    /// Appends a completed work interval, updating both cached aggregates
    /// in the same mutation.
    pub fn log_session(&mut self, date: NaiveDate, duration_minutes: u32) {
        self.sessions.push(StudySession {
            date,
            duration: duration_minutes,
        });
        self.pomodoros += 1;
        self.total_time += duration_minutes;
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.text.trim().is_empty() {
            return Err("task.text must not be empty".to_string());
        }
        if self.pomodoros as usize != self.sessions.len() {
            return Err("task.pomodoros must equal the session count".to_string());
        }
        let session_total: u32 = self.sessions.iter().map(|session| session.duration).sum();
        if self.total_time != session_total {
            return Err("task.totalTime must equal the summed session durations".to_string());
        }
        Ok(())
    }

    /// Groups sessions by calendar date in first-seen order, summing the
    /// minutes per date. Recomputed on demand for the activity chart; never
    /// persisted.
    pub fn daily_activity(&self) -> Vec<DailyActivity> {
        let mut activity: Vec<DailyActivity> = Vec::new();
        for session in &self.sessions {
            match activity.iter_mut().find(|entry| entry.date == session.date) {
                Some(entry) => entry.minutes += session.duration,
                None => activity.push(DailyActivity {
                    date: session.date,
                    minutes: session.duration,
                }),
            }
        }
        activity
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub minutes: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid date")
    }

    #[test]
    fn new_task_has_zeroed_statistics() {
        let task = Task::new(1, "Study");
        assert_eq!(task.pomodoros(), 0);
        assert_eq!(task.total_time(), 0);
        assert!(task.sessions().is_empty());
        assert!(!task.is_completed());
        assert!(task.validate().is_ok());
    }

    #[test]
    fn log_session_updates_both_aggregates() {
        let mut task = Task::new(1, "Study");
        task.log_session(day("2026-08-26"), 25);
        assert_eq!(task.pomodoros(), 1);
        assert_eq!(task.total_time(), 25);
        assert_eq!(
            task.sessions(),
            &[StudySession {
                date: day("2026-08-26"),
                duration: 25,
            }]
        );

        task.log_session(day("2026-08-26"), 30);
        assert_eq!(task.pomodoros(), 2);
        assert_eq!(task.total_time(), 55);
        assert!(task.validate().is_ok());
    }

    #[test]
    fn toggle_completed_twice_restores_original_value() {
        let mut task = Task::new(1, "Study");
        task.toggle_completed();
        assert!(task.is_completed());
        task.toggle_completed();
        assert!(!task.is_completed());
    }

    #[test]
    fn validate_rejects_stale_aggregates() {
        let raw = r#"{
            "id": 1,
            "text": "Study",
            "completed": false,
            "pomodoros": 1,
            "totalTime": 99,
            "sessions": [{ "date": "2026-08-26", "duration": 25 }]
        }"#;
        let task: Task = serde_json::from_str(raw).expect("deserialize task");
        assert!(task.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_text() {
        let task = Task::new(1, "   ");
        assert!(task.validate().is_err());
    }

    #[test]
    fn serde_layout_uses_camel_case_and_iso_dates() {
        let mut task = Task::new(7, "Leer");
        task.log_session(day("2026-08-25"), 25);

        let value = serde_json::to_value(&task).expect("serialize task");
        assert_eq!(value["id"], 7);
        assert_eq!(value["totalTime"], 25);
        assert_eq!(value["sessions"][0]["date"], "2026-08-25");
        assert_eq!(value["sessions"][0]["duration"], 25);

        let roundtrip: Task = serde_json::from_value(value).expect("deserialize task");
        assert_eq!(roundtrip, task);
    }

    #[test]
    fn daily_activity_groups_by_date_in_first_seen_order() {
        let mut task = Task::new(1, "Study");
        task.log_session(day("2026-08-24"), 25);
        task.log_session(day("2026-08-25"), 30);
        task.log_session(day("2026-08-24"), 10);

        let activity = task.daily_activity();
        assert_eq!(
            activity,
            vec![
                DailyActivity {
                    date: day("2026-08-24"),
                    minutes: 35,
                },
                DailyActivity {
                    date: day("2026-08-25"),
                    minutes: 30,
                },
            ]
        );
    }

    proptest! {
        #[test]
        fn aggregates_stay_consistent_under_any_session_sequence(
            durations in proptest::collection::vec(1u32..=180, 0..50)
        ) {
            let mut task = Task::new(1, "Study");
            for (index, duration) in durations.iter().enumerate() {
                let date = day("2026-08-01") + chrono::Duration::days((index % 7) as i64);
                task.log_session(date, *duration);
            }

            prop_assert!(task.validate().is_ok());
            prop_assert_eq!(task.pomodoros() as usize, durations.len());
            prop_assert_eq!(task.total_time(), durations.iter().sum::<u32>());
            let activity_total: u32 =
                task.daily_activity().iter().map(|entry| entry.minutes).sum();
            prop_assert_eq!(activity_total, task.total_time());
        }
    }
}
