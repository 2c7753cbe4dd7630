//! In-process collaborators backing the service for demos, the HTTP server, and tests.
//!
//! Each store serializes access behind a single mutex, which makes lease swaps and
//! transition commits trivially atomic with respect to one another.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::appointments::{
    Appointment, AppointmentHistoryEntry, AppointmentId, AppointmentTransition,
};
use super::domain::{AgentId, AgentProfile, Contact, ContactHistoryEntry, ContactId, Lease};
use super::qualification::Transition;
use super::repository::{
    AgentDirectory, AppointmentStore, ContactStore, ContactTimeline, EligibilityFilter,
    LeaseExpectation, NotifyError, PipelineAlert, PipelineNotifier, StoreError,
};

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable(format!("{name} lock poisoned")))
}

#[derive(Debug, Default)]
struct ContactRows {
    contacts: HashMap<ContactId, Contact>,
    timelines: HashMap<ContactId, ContactTimeline>,
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryContactStore {
    rows: Arc<Mutex<ContactRows>>,
}

impl InMemoryContactStore {
    pub fn with_contacts<I>(contacts: I) -> Self
    where
        I: IntoIterator<Item = Contact>,
    {
        let mut rows = ContactRows::default();
        for contact in contacts {
            rows.contacts.insert(contact.id.clone(), contact);
        }
        Self {
            rows: Arc::new(Mutex::new(rows)),
        }
    }
}

impl ContactStore for InMemoryContactStore {
    fn get_contact(&self, id: &ContactId) -> Result<Option<Contact>, StoreError> {
        let rows = lock(&self.rows, "contact store")?;
        Ok(rows.contacts.get(id).cloned())
    }

    fn list_eligible(&self, filter: &EligibilityFilter) -> Result<Vec<Contact>, StoreError> {
        let rows = lock(&self.rows, "contact store")?;
        Ok(rows
            .contacts
            .values()
            .filter(|contact| !contact.do_not_contact)
            .filter(|contact| contact.live_lease(filter.now).is_none())
            .filter(|contact| {
                filter
                    .campaigns
                    .as_ref()
                    .map(|campaigns| campaigns.contains(&contact.campaign_id))
                    .unwrap_or(true)
            })
            .cloned()
            .collect())
    }

    fn leased_contacts(&self) -> Result<Vec<Contact>, StoreError> {
        let rows = lock(&self.rows, "contact store")?;
        Ok(rows
            .contacts
            .values()
            .filter(|contact| contact.lease.is_some())
            .cloned()
            .collect())
    }

    fn compare_and_swap_lease(
        &self,
        id: &ContactId,
        expected: &LeaseExpectation,
        next: Option<Lease>,
    ) -> Result<Contact, StoreError> {
        let mut rows = lock(&self.rows, "contact store")?;
        let contact = rows.contacts.get_mut(id).ok_or(StoreError::NotFound)?;
        if !expected.matches(contact) {
            return Err(StoreError::Conflict);
        }

        contact.lease = next;
        contact.version += 1;
        Ok(contact.clone())
    }

    fn commit_transition(&self, transition: &Transition) -> Result<Contact, StoreError> {
        let mut rows = lock(&self.rows, "contact store")?;
        let contact = rows
            .contacts
            .get_mut(&transition.contact_id)
            .ok_or(StoreError::NotFound)?;
        if contact.version != transition.expected_version {
            return Err(StoreError::Conflict);
        }

        transition.apply_to(contact);
        let updated = contact.clone();

        let timeline = rows
            .timelines
            .entry(transition.contact_id.clone())
            .or_default();
        timeline.calls.push(transition.call_event.clone());
        timeline.history.push(transition.history.clone());

        Ok(updated)
    }

    fn append_history(&self, entry: ContactHistoryEntry) -> Result<(), StoreError> {
        let mut rows = lock(&self.rows, "contact store")?;
        let id = ContactId(entry.entity_id.clone());
        if !rows.contacts.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        rows.timelines.entry(id).or_default().history.push(entry);
        Ok(())
    }

    fn timeline(&self, id: &ContactId) -> Result<ContactTimeline, StoreError> {
        let rows = lock(&self.rows, "contact store")?;
        if !rows.contacts.contains_key(id) {
            return Err(StoreError::NotFound);
        }
        Ok(rows.timelines.get(id).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryAgentDirectory {
    agents: Arc<Mutex<HashMap<AgentId, AgentProfile>>>,
}

impl InMemoryAgentDirectory {
    pub fn with_agents<I>(agents: I) -> Self
    where
        I: IntoIterator<Item = AgentProfile>,
    {
        let agents = agents
            .into_iter()
            .map(|agent| (agent.id.clone(), agent))
            .collect();
        Self {
            agents: Arc::new(Mutex::new(agents)),
        }
    }
}

impl AgentDirectory for InMemoryAgentDirectory {
    fn agent(&self, id: &AgentId) -> Result<Option<AgentProfile>, StoreError> {
        Ok(lock(&self.agents, "agent directory")?.get(id).cloned())
    }
}

#[derive(Debug, Default)]
struct AppointmentRows {
    issued: u64,
    appointments: HashMap<AppointmentId, Appointment>,
    history: HashMap<AppointmentId, Vec<AppointmentHistoryEntry>>,
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryAppointmentStore {
    rows: Arc<Mutex<AppointmentRows>>,
}

impl AppointmentStore for InMemoryAppointmentStore {
    fn next_id(&self) -> Result<AppointmentId, StoreError> {
        let mut rows = lock(&self.rows, "appointment store")?;
        rows.issued += 1;
        Ok(AppointmentId(format!("apt-{:06}", rows.issued)))
    }

    fn insert(
        &self,
        appointment: Appointment,
        created: AppointmentHistoryEntry,
    ) -> Result<Appointment, StoreError> {
        let mut rows = lock(&self.rows, "appointment store")?;
        if rows.appointments.contains_key(&appointment.id) {
            return Err(StoreError::Conflict);
        }
        rows.history
            .entry(appointment.id.clone())
            .or_default()
            .push(created);
        rows.appointments
            .insert(appointment.id.clone(), appointment.clone());
        Ok(appointment)
    }

    fn get(&self, id: &AppointmentId) -> Result<Option<Appointment>, StoreError> {
        Ok(lock(&self.rows, "appointment store")?
            .appointments
            .get(id)
            .cloned())
    }

    fn commit_status(
        &self,
        transition: &AppointmentTransition,
    ) -> Result<Appointment, StoreError> {
        let mut rows = lock(&self.rows, "appointment store")?;
        let appointment = rows
            .appointments
            .get_mut(&transition.appointment_id)
            .ok_or(StoreError::NotFound)?;
        if appointment.status != transition.previous_status {
            return Err(StoreError::Conflict);
        }

        transition.apply_to(appointment);
        let updated = appointment.clone();
        rows.history
            .entry(transition.appointment_id.clone())
            .or_default()
            .push(transition.history.clone());
        Ok(updated)
    }

    fn history(&self, id: &AppointmentId) -> Result<Vec<AppointmentHistoryEntry>, StoreError> {
        let rows = lock(&self.rows, "appointment store")?;
        rows.history.get(id).cloned().ok_or(StoreError::NotFound)
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryNotifier {
    events: Arc<Mutex<Vec<PipelineAlert>>>,
}

impl InMemoryNotifier {
    pub fn events(&self) -> Vec<PipelineAlert> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl PipelineNotifier for InMemoryNotifier {
    fn publish(&self, alert: PipelineAlert) -> Result<(), NotifyError> {
        self.events
            .lock()
            .map_err(|_| NotifyError::Transport("notifier lock poisoned".to_string()))?
            .push(alert);
        Ok(())
    }
}
