use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::appointments::{
    Appointment, AppointmentHistoryEntry, AppointmentId, AppointmentTransition,
};
use super::domain::{
    AgentId, AgentProfile, CallEvent, CampaignId, Contact, ContactHistoryEntry, ContactId, Lease,
    LeaseToken,
};
use super::qualification::Transition;

/// Coarse pre-filter handed to the store; the dispatcher re-checks every candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityFilter {
    /// `None` lifts the campaign restriction (full-access roles).
    pub campaigns: Option<BTreeSet<CampaignId>>,
    pub now: DateTime<Utc>,
}

/// Lease state a compare-and-swap expects to find.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseExpectation {
    pub token: Option<LeaseToken>,
    pub version: u64,
}

impl LeaseExpectation {
    pub fn observed(contact: &Contact) -> Self {
        Self {
            token: contact.lease.as_ref().map(|lease| lease.token.clone()),
            version: contact.version,
        }
    }

    pub fn matches(&self, contact: &Contact) -> bool {
        contact.version == self.version
            && contact.lease.as_ref().map(|lease| &lease.token) == self.token.as_ref()
    }
}

/// Calls and status history of a contact in commit order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactTimeline {
    pub calls: Vec<CallEvent>,
    pub history: Vec<ContactHistoryEntry>,
}

/// Persistence contract for prospects. Implementations must make `compare_and_swap_lease`
/// and `commit_transition` atomic with respect to each other.
pub trait ContactStore: Send + Sync {
    fn get_contact(&self, id: &ContactId) -> Result<Option<Contact>, StoreError>;
    fn list_eligible(&self, filter: &EligibilityFilter) -> Result<Vec<Contact>, StoreError>;
    /// Contacts currently carrying a lease, live or expired.
    fn leased_contacts(&self) -> Result<Vec<Contact>, StoreError>;
    /// Replace the lease when `expected` still matches; bumps `version`.
    fn compare_and_swap_lease(
        &self,
        id: &ContactId,
        expected: &LeaseExpectation,
        next: Option<Lease>,
    ) -> Result<Contact, StoreError>;
    /// Apply the transition, append its call event and history entry, all or nothing.
    fn commit_transition(&self, transition: &Transition) -> Result<Contact, StoreError>;
    fn append_history(&self, entry: ContactHistoryEntry) -> Result<(), StoreError>;
    fn timeline(&self, id: &ContactId) -> Result<ContactTimeline, StoreError>;
}

/// Lookup of agent roles and assignments.
pub trait AgentDirectory: Send + Sync {
    fn agent(&self, id: &AgentId) -> Result<Option<AgentProfile>, StoreError>;
}

/// Persistence contract for appointments and their audit trail.
pub trait AppointmentStore: Send + Sync {
    /// Reserve the next appointment id (`apt-000001`, `apt-000002`, ...).
    fn next_id(&self) -> Result<AppointmentId, StoreError>;
    fn insert(
        &self,
        appointment: Appointment,
        created: AppointmentHistoryEntry,
    ) -> Result<Appointment, StoreError>;
    fn get(&self, id: &AppointmentId) -> Result<Option<Appointment>, StoreError>;
    /// Apply the transition when the stored status still equals `previous_status`.
    fn commit_status(&self, transition: &AppointmentTransition)
        -> Result<Appointment, StoreError>;
    fn history(&self, id: &AppointmentId) -> Result<Vec<AppointmentHistoryEntry>, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record changed concurrently")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Conflict | StoreError::Unavailable(_))
    }
}

/// Outbound hooks fired after committed transitions (CRM sync, suppression lists).
pub trait PipelineNotifier: Send + Sync {
    fn publish(&self, alert: PipelineAlert) -> Result<(), NotifyError>;
}

/// Simple alert payload so adapters and tests can assert integration boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineAlert {
    pub template: String,
    pub contact_id: ContactId,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
