//! Appointment status machine with an append-only audit trail.

mod machine;

pub use machine::{book, change_status, AppointmentTransition, BookingRequest, StatusChange};

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AgentId, ContactId, HistoryEntry};

/// Identifier wrapper for booked appointments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AppointmentId(pub String);

impl fmt::Display for AppointmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    ToReschedule,
    ToRecontact,
    Rescheduled,
    Signed,
    Cancelled,
    ToCallback,
}

impl AppointmentStatus {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Scheduled => "SCHEDULED",
            Self::ToReschedule => "TO_RESCHEDULE",
            Self::ToRecontact => "TO_RECONTACT",
            Self::Rescheduled => "RESCHEDULED",
            Self::Signed => "SIGNED",
            Self::Cancelled => "CANCELLED",
            Self::ToCallback => "TO_CALLBACK",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Signed | Self::Cancelled)
    }

    /// Statuses whose transition must carry a replacement date.
    pub const fn requires_new_date(self) -> bool {
        matches!(self, Self::Rescheduled | Self::ToReschedule)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Meeting between a prospect and a commercial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub contact_id: ContactId,
    pub commercial_id: AgentId,
    pub status: AppointmentStatus,
    pub scheduled_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

pub type AppointmentHistoryEntry = HistoryEntry<AppointmentStatus>;
