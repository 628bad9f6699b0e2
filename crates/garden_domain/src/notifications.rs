use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// A one-shot local notification. `id` is stable per plant so that handing
/// the same id to the sink again replaces the pending reminder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReminderRequest {
    pub id: String,
    pub title: String,
    pub body: String,
    pub fire_date: NaiveDate,
    pub fire_time: NaiveTime,
}

impl ReminderRequest {
    pub fn scheduled_for(&self) -> NaiveDateTime {
        self.fire_date.and_time(self.fire_time)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Platform-specific notification adapters will implement this trait.
pub trait NotificationSink {
    fn request_authorization(&self) -> PermissionStatus;
    fn schedule(&self, request: ReminderRequest);
    fn cancel(&self, id: &str);
}

/// What happened to the reminder of a plant after a command ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderOutcome {
    Scheduled(ReminderRequest),
    PermissionDenied,
    NoSink,
}

impl ReminderOutcome {
    pub fn request(&self) -> Option<&ReminderRequest> {
        match self {
            ReminderOutcome::Scheduled(request) => Some(request),
            _ => None,
        }
    }
}
