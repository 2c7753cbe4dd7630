//! End-to-end lead lifecycle through the public service facade: seed, dispatch, qualify,
//! book, and follow the appointment to signature.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use leadflow::workflows::prospecting::{
    AgentId, AgentProfile, AgentRole, AppointmentStatus, BookingRequest, CallOutcome,
    CampaignId, ContactId, ContactStatus, DispatchConfig, DispatchOutcome,
    InMemoryAgentDirectory, InMemoryAppointmentStore, InMemoryContactStore, InMemoryNotifier,
    ProspectingCatalog, ProspectingError, ProspectingService, QualificationFields,
    QualificationRequest, StatusChange,
};
use leadflow::workflows::seed::ContactSeedLoader;

type Service = ProspectingService<
    InMemoryContactStore,
    InMemoryAgentDirectory,
    InMemoryAppointmentStore,
    InMemoryNotifier,
>;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0).unwrap()
}

fn agent(id: &str, role: AgentRole) -> AgentProfile {
    AgentProfile {
        id: AgentId(id.to_string()),
        role,
        campaigns: BTreeSet::from([CampaignId("idf-2025".to_string())]),
        zones: Vec::new(),
    }
}

fn seeded_service() -> (Service, Arc<InMemoryNotifier>) {
    let sample = &include_bytes!("../data/contacts_sample.csv")[..];
    let contacts = ContactSeedLoader::from_reader(sample).expect("sample seed imports");
    let notifier = Arc::new(InMemoryNotifier::default());
    let service = ProspectingService::new(
        Arc::new(InMemoryContactStore::with_contacts(contacts)),
        Arc::new(InMemoryAgentDirectory::with_agents(vec![
            agent("agent-1", AgentRole::Agent),
            agent("agent-2", AgentRole::Agent),
            agent("sup-1", AgentRole::Supervisor),
        ])),
        Arc::new(InMemoryAppointmentStore::default()),
        notifier.clone(),
        ProspectingCatalog::standard().clone(),
        DispatchConfig::default(),
    );
    (service, notifier)
}

fn qualification(agent: &str, outcome: CallOutcome) -> QualificationRequest {
    QualificationRequest {
        agent_id: AgentId(agent.to_string()),
        outcome,
        fields: QualificationFields::default(),
    }
}

#[test]
fn queue_respects_eligibility_and_assignment() {
    let (service, _) = seeded_service();

    let agent_queue: Vec<_> = service
        .ranked_queue(&AgentId("agent-1".to_string()), now(), 10)
        .expect("preview succeeds")
        .into_iter()
        .map(|ranked| ranked.contact.id.0)
        .collect();
    assert_eq!(agent_queue, vec!["c-0001", "c-0004", "c-0002"]);

    let owner_queue: Vec<_> = service
        .ranked_queue(&AgentId("agent-2".to_string()), now(), 10)
        .expect("preview succeeds")
        .into_iter()
        .map(|ranked| ranked.contact.id.0)
        .collect();
    assert!(owner_queue.contains(&"c-0003".to_string()));

    let supervisor_queue = service
        .ranked_queue(&AgentId("sup-1".to_string()), now(), 10)
        .expect("preview succeeds");
    assert!(supervisor_queue
        .iter()
        .any(|ranked| ranked.contact.id.0 == "c-0007"));
}

#[test]
fn dispatched_lead_is_qualified_booked_and_signed() {
    let (service, notifier) = seeded_service();
    let agent_id = AgentId("agent-1".to_string());

    let assignment = match service
        .request_next_contact(&agent_id, now())
        .expect("dispatch succeeds")
    {
        DispatchOutcome::Assigned(assignment) => assignment,
        DispatchOutcome::QueueEmpty => panic!("seeded queue is not empty"),
    };
    assert_eq!(assignment.contact.id, ContactId("c-0001".to_string()));
    assert!(assignment.score.total >= 70);

    let qualified = service
        .qualify(
            &assignment.contact.id,
            &qualification("agent-1", CallOutcome::AppointmentTaken),
            now() + Duration::minutes(4),
        )
        .expect("qualification commits");
    assert_eq!(qualified.status, ContactStatus::AppointmentTaken);
    assert!(qualified.lease.is_none());

    let appointment = service
        .book_appointment(
            &BookingRequest {
                contact_id: assignment.contact.id.clone(),
                commercial_id: AgentId("commercial-1".to_string()),
                scheduled_at: now() + Duration::days(5),
                actor: agent_id.clone(),
            },
            now() + Duration::minutes(5),
        )
        .expect("appointment booked");

    let signed = service
        .change_appointment_status(
            &appointment.id,
            &StatusChange {
                status: AppointmentStatus::Signed,
                reason: Some("contrat signé sur place".to_string()),
                new_date: None,
            },
            &AgentId("commercial-1".to_string()),
            now() + Duration::days(5),
        )
        .expect("signature recorded");
    assert_eq!(signed.status, AppointmentStatus::Signed);

    let history = service
        .appointment_history(&appointment.id)
        .expect("history readable");
    assert_eq!(history.len(), 2);

    let templates: Vec<_> = notifier
        .events()
        .into_iter()
        .map(|event| event.template)
        .collect();
    assert_eq!(templates, vec!["appointment_taken".to_string()]);

    assert!(service
        .ranked_queue(&agent_id, now(), 10)
        .expect("preview succeeds")
        .iter()
        .all(|ranked| ranked.contact.id != assignment.contact.id));
}

#[test]
fn excluded_seed_rows_refuse_qualification() {
    let (service, _) = seeded_service();
    assert_eq!(
        service.qualify(
            &ContactId("c-0005".to_string()),
            &qualification("agent-1", CallOutcome::Nrp),
            now(),
        ),
        Err(ProspectingError::ContactExcluded)
    );
}
