use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::appointments::{
    self, Appointment, AppointmentHistoryEntry, AppointmentId, BookingRequest, StatusChange,
};
use super::catalog::ProspectingCatalog;
use super::dispatcher::{DispatchConfig, DispatchOutcome, RankedContact, WorkQueueDispatcher};
use super::domain::{AgentId, AgentProfile, Contact, ContactId, ContactStatus, LeaseToken};
use super::qualification::{
    self, QualificationError, QualificationRequest, Transition, ValidationError,
};
use super::repository::{
    AgentDirectory, AppointmentStore, ContactStore, ContactTimeline, PipelineAlert,
    PipelineNotifier, StoreError,
};
use super::scoring::{ScoreBreakdown, ScoringConfig, ScoringEngine};

/// Facade composing the qualification machine, scorer, dispatcher, and appointment machine
/// over the injected collaborators.
pub struct ProspectingService<S, D, P, N> {
    contacts: Arc<S>,
    agents: Arc<D>,
    appointments: Arc<P>,
    notifier: Arc<N>,
    catalog: Arc<ProspectingCatalog>,
    scoring: Arc<ScoringEngine>,
    dispatcher: WorkQueueDispatcher<S>,
}

impl<S, D, P, N> ProspectingService<S, D, P, N>
where
    S: ContactStore + 'static,
    D: AgentDirectory + 'static,
    P: AppointmentStore + 'static,
    N: PipelineNotifier + 'static,
{
    pub fn new(
        contacts: Arc<S>,
        agents: Arc<D>,
        appointments: Arc<P>,
        notifier: Arc<N>,
        catalog: ProspectingCatalog,
        dispatch: DispatchConfig,
    ) -> Self {
        let scoring = Arc::new(ScoringEngine::new(ScoringConfig::from(&catalog)));
        let dispatcher = WorkQueueDispatcher::new(contacts.clone(), scoring.clone(), dispatch);

        Self {
            contacts,
            agents,
            appointments,
            notifier,
            catalog: Arc::new(catalog),
            scoring,
            dispatcher,
        }
    }

    fn agent(&self, agent_id: &AgentId) -> Result<AgentProfile, ProspectingError> {
        self.agents
            .agent(agent_id)?
            .ok_or_else(|| ProspectingError::UnknownAgent(agent_id.clone()))
    }

    fn contact(&self, contact_id: &ContactId) -> Result<Contact, ProspectingError> {
        self.contacts
            .get_contact(contact_id)?
            .ok_or(ProspectingError::NotFound("contact"))
    }

    fn appointment(&self, id: &AppointmentId) -> Result<Appointment, ProspectingError> {
        self.appointments
            .get(id)?
            .ok_or(ProspectingError::NotFound("appointment"))
    }

    /// Lease the highest-priority eligible contact to `agent_id`.
    pub fn request_next_contact(
        &self,
        agent_id: &AgentId,
        now: DateTime<Utc>,
    ) -> Result<DispatchOutcome, ProspectingError> {
        let agent = self.agent(agent_id)?;
        let outcome = self.dispatcher.next_for(&agent, now)?;
        if matches!(outcome, DispatchOutcome::QueueEmpty) {
            debug!(agent_id = %agent_id, "work queue empty");
        }
        Ok(outcome)
    }

    /// Read-only view of the queue in dispatch order.
    pub fn ranked_queue(
        &self,
        agent_id: &AgentId,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<RankedContact>, ProspectingError> {
        let agent = self.agent(agent_id)?;
        Ok(self.dispatcher.preview(&agent, now, limit)?)
    }

    pub fn abandon_lease(
        &self,
        contact_id: &ContactId,
        agent_id: &AgentId,
        token: &LeaseToken,
    ) -> Result<Contact, ProspectingError> {
        Ok(self.dispatcher.abandon(contact_id, agent_id, token)?)
    }

    pub fn expire_leases(&self, now: DateTime<Utc>) -> Result<usize, ProspectingError> {
        let expired = self.dispatcher.expire(now)?;
        if expired > 0 {
            info!(expired, "expired stale contact leases");
        }
        Ok(expired)
    }

    pub fn score_of(&self, contact: &Contact, now: DateTime<Utc>) -> ScoreBreakdown {
        self.scoring.score(contact, now)
    }

    pub fn score_contact(
        &self,
        contact_id: &ContactId,
        now: DateTime<Utc>,
    ) -> Result<ScoreBreakdown, ProspectingError> {
        let contact = self.contact(contact_id)?;
        Ok(self.scoring.score(&contact, now))
    }

    /// Validate and commit a call outcome, releasing the caller's lease.
    pub fn qualify(
        &self,
        contact_id: &ContactId,
        request: &QualificationRequest,
        now: DateTime<Utc>,
    ) -> Result<Contact, ProspectingError> {
        let contact = self.contact(contact_id)?;

        if let Some(lease) = contact.live_lease(now) {
            if lease.agent_id != request.agent_id {
                debug!(
                    contact_id = %contact_id,
                    agent_id = %request.agent_id,
                    "contact leased to another agent"
                );
                return Err(ProspectingError::LeaseConflict);
            }
        }

        let transition = qualification::qualify(&contact, request, &self.catalog, now)
            .map_err(|err| {
                debug!(
                    contact_id = %contact_id,
                    agent_id = %request.agent_id,
                    error = %err,
                    "qualification rejected"
                );
                err
            })?;

        let updated = self.contacts.commit_transition(&transition)?;
        info!(
            contact_id = %contact_id,
            agent_id = %request.agent_id,
            status = %updated.status,
            "qualification committed"
        );

        self.notify_transition(&transition);
        Ok(updated)
    }

    fn notify_transition(&self, transition: &Transition) {
        let template = match transition.status {
            ContactStatus::AppointmentTaken => "appointment_taken",
            status if status.is_exclusion() => "contact_excluded",
            _ => return,
        };

        let mut details = BTreeMap::new();
        details.insert("status".to_string(), transition.status.code().to_string());
        details.insert(
            "agent_id".to_string(),
            transition.call_event.agent_id.0.clone(),
        );

        if let Err(err) = self.notifier.publish(PipelineAlert {
            template: template.to_string(),
            contact_id: transition.contact_id.clone(),
            details,
        }) {
            warn!(
                contact_id = %transition.contact_id,
                error = %err,
                template,
                "pipeline notification failed"
            );
        }
    }

    /// Append a free-text note without changing status. Allowed on excluded contacts.
    pub fn record_note(
        &self,
        contact_id: &ContactId,
        agent_id: &AgentId,
        note: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ProspectingError> {
        let contact = self.contact(contact_id)?;
        let entry = qualification::note_entry(&contact, agent_id, note, now)?;
        self.contacts.append_history(entry)?;
        Ok(())
    }

    pub fn contact_timeline(
        &self,
        contact_id: &ContactId,
    ) -> Result<ContactTimeline, ProspectingError> {
        Ok(self.contacts.timeline(contact_id)?)
    }

    pub fn book_appointment(
        &self,
        request: &BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<Appointment, ProspectingError> {
        let contact = self.contact(&request.contact_id)?;
        if contact.do_not_contact {
            return Err(ProspectingError::ContactExcluded);
        }

        let id = self.appointments.next_id()?;
        let (appointment, created) = appointments::book(request, id.clone(), now)?;
        let stored = self
            .appointments
            .insert(appointment, created)
            .map_err(|err| match err {
                StoreError::Conflict => ProspectingError::DuplicateAppointment(id),
                other => other.into(),
            })?;
        info!(
            appointment_id = %stored.id,
            contact_id = %stored.contact_id,
            commercial_id = %stored.commercial_id,
            "appointment booked"
        );
        Ok(stored)
    }

    pub fn change_appointment_status(
        &self,
        appointment_id: &AppointmentId,
        change: &StatusChange,
        actor: &AgentId,
        now: DateTime<Utc>,
    ) -> Result<Appointment, ProspectingError> {
        let appointment = self.appointment(appointment_id)?;
        let transition = appointments::change_status(&appointment, change, actor, now)?;
        let updated = self.appointments.commit_status(&transition)?;
        info!(
            appointment_id = %appointment_id,
            from = %transition.previous_status,
            to = %transition.status,
            actor = %actor,
            "appointment status changed"
        );
        Ok(updated)
    }

    pub fn appointment_history(
        &self,
        appointment_id: &AppointmentId,
    ) -> Result<Vec<AppointmentHistoryEntry>, ProspectingError> {
        self.appointment(appointment_id)?;
        Ok(self.appointments.history(appointment_id)?)
    }
}

/// Error raised by the prospecting service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProspectingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("contact is excluded from outreach")]
    ContactExcluded,
    #[error("lease held elsewhere or record changed concurrently; request again")]
    LeaseConflict,
    #[error("agent {0} is not registered for the work queue")]
    UnknownAgent(AgentId),
    #[error("appointment {0} already exists")]
    DuplicateAppointment(AppointmentId),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl ProspectingError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProspectingError::LeaseConflict | ProspectingError::StoreUnavailable(_)
        )
    }
}

impl From<QualificationError> for ProspectingError {
    fn from(value: QualificationError) -> Self {
        match value {
            QualificationError::Validation(err) => Self::Validation(err),
            QualificationError::ContactExcluded => Self::ContactExcluded,
        }
    }
}

impl From<StoreError> for ProspectingError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict => Self::LeaseConflict,
            StoreError::NotFound => Self::NotFound("record"),
            StoreError::Unavailable(reason) => Self::StoreUnavailable(reason),
        }
    }
}
