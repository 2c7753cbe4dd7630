use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::domain::{AgentId, ContactId, HistoryEntry};
use super::super::qualification::ValidationError;
use super::{Appointment, AppointmentHistoryEntry, AppointmentId, AppointmentStatus};

/// Request to book a meeting for a prospect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub contact_id: ContactId,
    pub commercial_id: AgentId,
    pub scheduled_at: DateTime<Utc>,
    pub actor: AgentId,
}

/// Requested status change; `reason` stays optional so a missing value surfaces as
/// `MissingReason` instead of a decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: AppointmentStatus,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub new_date: Option<DateTime<Utc>>,
}

/// Writes produced by an accepted status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppointmentTransition {
    pub appointment_id: AppointmentId,
    pub previous_status: AppointmentStatus,
    pub status: AppointmentStatus,
    pub scheduled_at: DateTime<Utc>,
    pub history: AppointmentHistoryEntry,
}

impl AppointmentTransition {
    pub fn apply_to(&self, appointment: &mut Appointment) {
        appointment.status = self.status;
        appointment.scheduled_at = self.scheduled_at;
    }
}

/// Create a `SCHEDULED` appointment under the store-issued `id`, together with its
/// creation entry.
pub fn book(
    request: &BookingRequest,
    id: AppointmentId,
    now: DateTime<Utc>,
) -> Result<(Appointment, AppointmentHistoryEntry), ValidationError> {
    if request.scheduled_at <= now {
        return Err(ValidationError::MissingOrInvalidDate {
            field: "scheduled_at",
        });
    }

    let appointment = Appointment {
        id,
        contact_id: request.contact_id.clone(),
        commercial_id: request.commercial_id.clone(),
        status: AppointmentStatus::Scheduled,
        scheduled_at: request.scheduled_at,
        created_at: now,
    };

    let created = HistoryEntry {
        entity_id: appointment.id.0.clone(),
        previous_status: None,
        new_status: AppointmentStatus::Scheduled,
        actor: request.actor.clone(),
        at: now,
        reason: None,
    };

    Ok((appointment, created))
}

pub fn change_status(
    appointment: &Appointment,
    change: &StatusChange,
    actor: &AgentId,
    now: DateTime<Utc>,
) -> Result<AppointmentTransition, ValidationError> {
    if appointment.status.is_terminal() {
        return Err(ValidationError::AppointmentClosed);
    }
    if change.status == appointment.status {
        return Err(ValidationError::NoOpTransition);
    }

    let reason = change
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|reason| !reason.is_empty())
        .ok_or(ValidationError::MissingReason)?;

    let scheduled_at = if change.status.requires_new_date() {
        change.new_date.ok_or(ValidationError::MissingDate)?
    } else {
        appointment.scheduled_at
    };

    Ok(AppointmentTransition {
        appointment_id: appointment.id.clone(),
        previous_status: appointment.status,
        status: change.status,
        scheduled_at,
        history: HistoryEntry {
            entity_id: appointment.id.0.clone(),
            previous_status: Some(appointment.status),
            new_status: change.status,
            actor: actor.clone(),
            at: now,
            reason: Some(reason.to_string()),
        },
    })
}
