// schedwatch/src/testutil.rs
//
// Record builders for unit tests.

use chrono::NaiveDateTime;

use crate::instances::{ActivityInstance, AutomationInstance};

/// "YYYY-MM-DD HH:MM" → timestamp.
pub fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").expect("fixture timestamp")
}

pub fn run(name: &str, start: &str, end: &str) -> AutomationInstance {
    AutomationInstance {
        name: name.to_string(),
        start_time: Some(at(start)),
        end_time: Some(at(end)),
        scheduled_time: None,
        status: "Complete".to_string(),
        error: None,
        member_id: None,
        customer_key: None,
    }
}

/// Run starting at `start` lasting `minutes`.
pub fn run_for(name: &str, start: NaiveDateTime, minutes: i64) -> AutomationInstance {
    AutomationInstance {
        name: name.to_string(),
        start_time: Some(start),
        end_time: Some(start + chrono::Duration::minutes(minutes)),
        scheduled_time: None,
        status: "Complete".to_string(),
        error: None,
        member_id: None,
        customer_key: None,
    }
}

impl AutomationInstance {
    pub fn scheduled(mut self, s: &str) -> Self {
        self.scheduled_time = Some(at(s));
        self
    }

    pub fn member(mut self, id: &str) -> Self {
        self.member_id = Some(id.to_string());
        self
    }

    pub fn key(mut self, k: &str) -> Self {
        self.customer_key = Some(k.to_string());
        self
    }

    pub fn status(mut self, s: &str) -> Self {
        self.status = s.to_string();
        self
    }

    pub fn failed(mut self, msg: &str) -> Self {
        self.status = "Error".to_string();
        self.error = Some(msg.to_string());
        self
    }
}

pub fn activity(name: &str, activity_type: i64, key: &str, start: &str, seconds: i64) -> ActivityInstance {
    let s = at(start);
    ActivityInstance {
        automation_name: String::new(),
        activity_type,
        activity_name: name.to_string(),
        activity_start_time: Some(s),
        activity_end_time: Some(s + chrono::Duration::seconds(seconds)),
        status: "Complete".to_string(),
        status_details: None,
        customer_key: Some(key.to_string()),
    }
}
