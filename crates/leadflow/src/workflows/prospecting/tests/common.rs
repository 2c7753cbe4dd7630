use std::collections::BTreeSet;
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::prospecting::domain::{
    AgentId, AgentProfile, AgentRole, CallOutcome, CampaignId, Contact, ContactId, ContactProfile,
};
use crate::workflows::prospecting::qualification::{QualificationFields, QualificationRequest};
use crate::workflows::prospecting::repository::{NotifyError, PipelineAlert, PipelineNotifier};
use crate::workflows::prospecting::{
    prospecting_router, DispatchConfig, InMemoryAgentDirectory, InMemoryAppointmentStore,
    InMemoryContactStore, InMemoryNotifier, ProspectingCatalog, ProspectingService,
};

pub(super) type MemoryService = ProspectingService<
    InMemoryContactStore,
    InMemoryAgentDirectory,
    InMemoryAppointmentStore,
    InMemoryNotifier,
>;

pub(super) const CAMPAIGN: &str = "idf-2025";

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0).unwrap()
}

pub(super) fn tomorrow() -> DateTime<Utc> {
    now() + Duration::days(1)
}

pub(super) fn agent_id(raw: &str) -> AgentId {
    AgentId(raw.to_string())
}

pub(super) fn contact_id(raw: &str) -> ContactId {
    ContactId(raw.to_string())
}

pub(super) fn complete_profile() -> ContactProfile {
    ContactProfile {
        company_name: Some("Acme Industries".to_string()),
        contact_name: Some("Jeanne Martin".to_string()),
        email: Some("j.martin@acme.fr".to_string()),
        phone: Some("0142000000".to_string()),
        mobile: Some("0600000000".to_string()),
        siret: Some("12345678900011".to_string()),
        activity: Some("Informatique".to_string()),
        city: Some("Paris".to_string()),
        postcode: Some("75011".to_string()),
        workforce: Some("250".to_string()),
    }
}

pub(super) fn sparse_profile() -> ContactProfile {
    ContactProfile {
        company_name: Some("Boulangerie Petit".to_string()),
        postcode: Some("69003".to_string()),
        ..ContactProfile::default()
    }
}

pub(super) fn contact(id: &str) -> Contact {
    Contact::new(
        contact_id(id),
        CampaignId(CAMPAIGN.to_string()),
        complete_profile(),
    )
}

pub(super) fn agent(id: &str) -> AgentProfile {
    AgentProfile {
        id: agent_id(id),
        role: AgentRole::Agent,
        campaigns: BTreeSet::from([CampaignId(CAMPAIGN.to_string())]),
        zones: Vec::new(),
    }
}

pub(super) fn supervisor(id: &str) -> AgentProfile {
    AgentProfile {
        id: agent_id(id),
        role: AgentRole::Supervisor,
        campaigns: BTreeSet::new(),
        zones: Vec::new(),
    }
}

pub(super) fn request(agent: &str, outcome: CallOutcome) -> QualificationRequest {
    QualificationRequest {
        agent_id: agent_id(agent),
        outcome,
        fields: QualificationFields::default(),
    }
}

pub(super) fn callback_request(agent: &str, at: DateTime<Utc>) -> QualificationRequest {
    let mut request = request(agent, CallOutcome::CallbackLater);
    request.fields.next_action_date = Some(at);
    request
}

pub(super) struct Harness {
    pub(super) service: Arc<MemoryService>,
    pub(super) contacts: Arc<InMemoryContactStore>,
    pub(super) notifier: Arc<InMemoryNotifier>,
}

pub(super) fn harness<I>(contacts: I, agents: Vec<AgentProfile>) -> Harness
where
    I: IntoIterator<Item = Contact>,
{
    let store = Arc::new(InMemoryContactStore::with_contacts(contacts));
    let notifier = Arc::new(InMemoryNotifier::default());
    let service = ProspectingService::new(
        store.clone(),
        Arc::new(InMemoryAgentDirectory::with_agents(agents)),
        Arc::new(InMemoryAppointmentStore::default()),
        notifier.clone(),
        ProspectingCatalog::standard().clone(),
        DispatchConfig::default(),
    );

    Harness {
        service: Arc::new(service),
        contacts: store,
        notifier,
    }
}

pub(super) fn default_harness() -> Harness {
    harness(
        vec![contact("c-1"), contact("c-2")],
        vec![agent("agent-1"), agent("agent-2"), supervisor("sup-1")],
    )
}

pub(super) struct FailingNotifier;

impl PipelineNotifier for FailingNotifier {
    fn publish(&self, _alert: PipelineAlert) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("crm webhook offline".to_string()))
    }
}

pub(super) fn router_for(harness: &Harness) -> axum::Router {
    prospecting_router(harness.service.clone())
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
