//! Asynchronous operation handles.

use serde::{Deserialize, Deserializer};

/// Progress of an asynchronous operation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EventStatus {
    /// Still running.
    Pending,
    /// Completed successfully.
    Done,
    /// Completed with a failure.
    Error,
}

impl EventStatus {
    /// Whether the event has reached a final state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    fn from_label(label: Option<&str>) -> Self {
        match label.map(str::to_ascii_lowercase).as_deref() {
            Some("done") => Self::Done,
            Some("error" | "failed") => Self::Error,
            _ => Self::Pending,
        }
    }
}

impl<'de> Deserialize<'de> for EventStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(Self::from_label(label.as_deref()))
    }
}

/// An asynchronous operation handle returned by mutating endpoints.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Event {
    /// Provider identifier.
    pub id: i32,
    /// Current progress; `null` on the wire reads as pending.
    #[serde(default = "pending", rename = "action_status")]
    pub status: EventStatus,
    /// Droplet the operation applies to.
    #[serde(default, rename = "droplet_id")]
    pub droplet: Option<i32>,
    /// Provider event type identifier.
    #[serde(default, rename = "event_type_id")]
    pub action: Option<i32>,
    /// Completion percentage as reported by the provider.
    #[serde(default, deserialize_with = "super::optional_string_or_number")]
    pub percentage: Option<String>,
}

const fn pending() -> EventStatus {
    EventStatus::Pending
}
