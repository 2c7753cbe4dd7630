//! Call qualification state machine.
//!
//! `qualify` is a pure function of the contact snapshot, the recorded outcome, and the
//! caller-supplied clock. It either rejects the request without touching anything or returns
//! a [`Transition`] carrying every field the store must write in one atomic commit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::ProspectingCatalog;
use super::domain::{
    AgentId, CallEvent, CallOutcome, Contact, ContactHistoryEntry, ContactId, ContactStatus,
    HistoryEntry,
};

/// Rejections that leave the contact untouched; each names the offending field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("sub_reason is required for OUT_OF_TARGET and must be a configured reason code")]
    MissingSubReason,
    #[error("{field} is required and must be a future timestamp")]
    MissingOrInvalidDate { field: &'static str },
    #[error("reason is required for every appointment status change")]
    MissingReason,
    #[error("new_date is required when rescheduling an appointment")]
    MissingDate,
    #[error("status is unchanged; transition to the current status is not recorded")]
    NoOpTransition,
    #[error("status cannot change once an appointment is signed or cancelled")]
    AppointmentClosed,
    #[error("note must not be empty")]
    EmptyNote,
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingSubReason => "sub_reason",
            ValidationError::MissingOrInvalidDate { field } => *field,
            ValidationError::MissingReason => "reason",
            ValidationError::MissingDate => "new_date",
            ValidationError::NoOpTransition | ValidationError::AppointmentClosed => "status",
            ValidationError::EmptyNote => "note",
        }
    }
}

/// Failure of the qualification transition function.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QualificationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Carries no detail about the contact's prior state.
    #[error("contact is excluded from outreach")]
    ContactExcluded,
}

/// Optional side-effect fields submitted alongside an outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualificationFields {
    #[serde(default)]
    pub sub_reason: Option<String>,
    #[serde(default)]
    pub next_action_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub note: Option<String>,
}

/// A call outcome recorded by an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualificationRequest {
    pub agent_id: AgentId,
    pub outcome: CallOutcome,
    #[serde(flatten)]
    pub fields: QualificationFields,
}

/// Every write produced by an accepted qualification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub contact_id: ContactId,
    /// Store version observed when the transition was computed.
    pub expected_version: u64,
    pub previous_status: ContactStatus,
    pub status: ContactStatus,
    pub sub_status: Option<String>,
    pub next_action_date: Option<DateTime<Utc>>,
    pub do_not_contact: bool,
    pub call_count: u32,
    pub last_contact_at: DateTime<Utc>,
    pub call_event: CallEvent,
    pub history: ContactHistoryEntry,
}

impl Transition {
    /// Writes the governed fields onto a stored record. Stores call this inside the same
    /// critical section that appends `call_event` and `history`.
    pub fn apply_to(&self, contact: &mut Contact) {
        contact.status = self.status;
        contact.sub_status = self.sub_status.clone();
        contact.next_action_date = self.next_action_date;
        contact.do_not_contact = self.do_not_contact;
        contact.call_count = self.call_count;
        contact.last_contact_at = Some(self.last_contact_at);
        contact.lease = None;
        contact.version += 1;
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Compute the next state of `contact` for `request`.
pub fn qualify(
    contact: &Contact,
    request: &QualificationRequest,
    catalog: &ProspectingCatalog,
    now: DateTime<Utc>,
) -> Result<Transition, QualificationError> {
    if contact.do_not_contact || contact.status.is_exclusion() {
        return Err(QualificationError::ContactExcluded);
    }

    let outcome = request.outcome;
    let status = outcome.resulting_status();
    let fields = &request.fields;

    let sub_status = if outcome == CallOutcome::OutOfTarget {
        let reason = fields
            .sub_reason
            .as_deref()
            .and_then(|code| catalog.sub_reason(code))
            .ok_or(ValidationError::MissingSubReason)?;
        Some(reason.code.clone())
    } else {
        None
    };

    let next_action_date = if status.requires_callback() {
        match fields.next_action_date {
            Some(date) if date > now => Some(date),
            _ => {
                return Err(ValidationError::MissingOrInvalidDate {
                    field: "next_action_date",
                }
                .into())
            }
        }
    } else {
        None
    };

    let note = non_empty(fields.note.as_deref());

    let call_event = CallEvent {
        contact_id: contact.id.clone(),
        agent_id: request.agent_id.clone(),
        at: now,
        outcome,
        sub_reason: sub_status.clone(),
        note: note.clone(),
    };

    let history = HistoryEntry {
        entity_id: contact.id.0.clone(),
        previous_status: Some(contact.status),
        new_status: status,
        actor: request.agent_id.clone(),
        at: now,
        reason: sub_status.clone().or(note),
    };

    Ok(Transition {
        contact_id: contact.id.clone(),
        expected_version: contact.version,
        previous_status: contact.status,
        status,
        sub_status,
        next_action_date,
        do_not_contact: status.is_exclusion(),
        call_count: contact.call_count.saturating_add(1),
        last_contact_at: now,
        call_event,
        history,
    })
}

/// History-only entry; the one write permitted on excluded contacts.
pub fn note_entry(
    contact: &Contact,
    agent_id: &AgentId,
    note: &str,
    now: DateTime<Utc>,
) -> Result<ContactHistoryEntry, ValidationError> {
    let note = non_empty(Some(note)).ok_or(ValidationError::EmptyNote)?;

    Ok(HistoryEntry {
        entity_id: contact.id.0.clone(),
        previous_status: Some(contact.status),
        new_status: contact.status,
        actor: agent_id.clone(),
        at: now,
        reason: Some(note),
    })
}
