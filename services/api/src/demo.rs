use crate::infra::{
    build_service, default_roster, load_catalog, load_roster, parse_timestamp, ApiService,
};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use leadflow::error::AppError;
use leadflow::workflows::prospecting::{
    AgentId, AppointmentStatus, BookingRequest, CallOutcome, DispatchConfig, DispatchOutcome,
    InMemoryAgentDirectory, InMemoryAppointmentStore, InMemoryContactStore, InMemoryNotifier,
    ProspectingCatalog, ProspectingService, QualificationFields, QualificationRequest,
    RankedContact, StatusChange,
};
use leadflow::workflows::seed::ContactSeedLoader;
use std::path::PathBuf;
use std::sync::Arc;

const SAMPLE_CONTACTS: &[u8] = include_bytes!("../../../crates/leadflow/data/contacts_sample.csv");

#[derive(Args, Debug)]
pub(crate) struct QueueArgs {
    /// Contact CSV to rank (defaults to the bundled sample base)
    #[arg(long)]
    pub(crate) contacts: Option<PathBuf>,
    /// JSON agent roster (defaults to a two-agent team plus a supervisor)
    #[arg(long)]
    pub(crate) agents: Option<PathBuf>,
    /// JSON catalog overriding out-of-target reasons and priority sectors
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Agent whose queue is previewed
    #[arg(long, default_value = "agent-1")]
    pub(crate) agent: String,
    /// Maximum number of contacts to print
    #[arg(long, default_value_t = 10)]
    pub(crate) limit: usize,
    /// Evaluation instant (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) at: Option<DateTime<Utc>>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluation instant (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) at: Option<DateTime<Utc>>,
}

pub(crate) fn run_queue_preview(args: QueueArgs) -> Result<(), AppError> {
    let QueueArgs {
        contacts,
        agents,
        catalog,
        agent,
        limit,
        at,
    } = args;

    let now = at.unwrap_or_else(Utc::now);
    let contacts = match contacts {
        Some(path) => ContactSeedLoader::from_path(path)?,
        None => ContactSeedLoader::from_reader(SAMPLE_CONTACTS)?,
    };
    let service = build_service(
        contacts,
        load_roster(agents.as_deref())?,
        load_catalog(catalog.as_deref())?,
        DispatchConfig::default(),
    );

    let agent_id = AgentId(agent);
    let queue = service.ranked_queue(&agent_id, now, limit)?;
    println!("Work queue for {} at {}", agent_id, now.to_rfc3339());
    render_queue(&queue);
    Ok(())
}

fn render_queue(queue: &[RankedContact]) {
    if queue.is_empty() {
        println!("  (queue empty)");
        return;
    }

    for (rank, entry) in queue.iter().enumerate() {
        let score = &entry.score;
        println!(
            "  {:>2}. {} {:<24} {:<17} {:>3} {:<4} \
             (completeness {} | engagement {} | potential {} | timing {})",
            rank + 1,
            entry.contact.id,
            entry.contact.profile.company_name.as_deref().unwrap_or("-"),
            entry.contact.status.code(),
            score.total,
            score.category.label(),
            score.completeness,
            score.engagement,
            score.potential,
            score.timing
        );
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let now = args.at.unwrap_or_else(Utc::now);
    let notifier = Arc::new(InMemoryNotifier::default());
    let service: ApiService = ProspectingService::new(
        Arc::new(InMemoryContactStore::with_contacts(
            ContactSeedLoader::from_reader(SAMPLE_CONTACTS)?,
        )),
        Arc::new(InMemoryAgentDirectory::with_agents(default_roster())),
        Arc::new(InMemoryAppointmentStore::default()),
        notifier.clone(),
        ProspectingCatalog::standard().clone(),
        DispatchConfig::default(),
    );

    let caller = AgentId("agent-1".to_string());
    println!("Lead lifecycle demo at {}", now.to_rfc3339());
    println!("\nQueue preview for {}", caller);
    render_queue(&service.ranked_queue(&caller, now, 5)?);

    let first = match service.request_next_contact(&caller, now)? {
        DispatchOutcome::Assigned(assignment) => assignment,
        DispatchOutcome::QueueEmpty => {
            println!("\nQueue empty; nothing to demonstrate");
            return Ok(());
        }
    };
    println!(
        "\n- Leased {} to {} until {} (score {} {})",
        first.contact.id,
        caller,
        first.lease.expires_at.to_rfc3339(),
        first.score.total,
        first.score.category.label()
    );

    let callback_at = now + Duration::days(1);
    let called_back = service.qualify(
        &first.contact.id,
        &QualificationRequest {
            agent_id: caller.clone(),
            outcome: CallOutcome::CallbackLater,
            fields: QualificationFields {
                next_action_date: Some(callback_at),
                note: Some("Standard: rappeler demain matin".to_string()),
                ..QualificationFields::default()
            },
        },
        now + Duration::minutes(3),
    )?;
    println!(
        "- Qualified {} as {} (next action {})",
        called_back.id,
        called_back.status,
        callback_at.to_rfc3339()
    );

    let rejected = service.qualify(
        &first.contact.id,
        &QualificationRequest {
            agent_id: caller.clone(),
            outcome: CallOutcome::OutOfTarget,
            fields: QualificationFields::default(),
        },
        now + Duration::minutes(4),
    );
    if let Err(err) = rejected {
        println!("- Out-of-target without a reason rejected: {}", err);
    }

    let callback_due = callback_at + Duration::minutes(5);
    let second = match service.request_next_contact(&caller, callback_due)? {
        DispatchOutcome::Assigned(assignment) => assignment,
        DispatchOutcome::QueueEmpty => {
            println!("- Queue empty on callback day");
            return Ok(());
        }
    };
    println!("- Callback day: leased {} again", second.contact.id);

    let booked_contact = service.qualify(
        &second.contact.id,
        &QualificationRequest {
            agent_id: caller.clone(),
            outcome: CallOutcome::AppointmentTaken,
            fields: QualificationFields::default(),
        },
        callback_due + Duration::minutes(6),
    )?;
    println!("- Qualified {} as {}", booked_contact.id, booked_contact.status);

    let commercial = AgentId("commercial-1".to_string());
    let appointment = service.book_appointment(
        &BookingRequest {
            contact_id: booked_contact.id.clone(),
            commercial_id: commercial.clone(),
            scheduled_at: callback_due + Duration::days(3),
            actor: caller.clone(),
        },
        callback_due + Duration::minutes(7),
    )?;
    println!(
        "- Booked {} with {} on {}",
        appointment.id,
        commercial,
        appointment.scheduled_at.to_rfc3339()
    );

    service.change_appointment_status(
        &appointment.id,
        &StatusChange {
            status: AppointmentStatus::Rescheduled,
            reason: Some("client indisponible".to_string()),
            new_date: Some(callback_due + Duration::days(6)),
        },
        &commercial,
        callback_due + Duration::days(1),
    )?;
    service.change_appointment_status(
        &appointment.id,
        &StatusChange {
            status: AppointmentStatus::Signed,
            reason: Some("contrat signé".to_string()),
            new_date: None,
        },
        &commercial,
        callback_due + Duration::days(6),
    )?;

    println!("\nAppointment history for {}", appointment.id);
    for entry in service.appointment_history(&appointment.id)? {
        println!(
            "  - {} {} -> {} by {}{}",
            entry.at.to_rfc3339(),
            entry
                .previous_status
                .map(|status| status.code())
                .unwrap_or("(created)"),
            entry.new_status,
            entry.actor,
            entry
                .reason
                .map(|reason| format!(" ({reason})"))
                .unwrap_or_default()
        );
    }

    let timeline = service.contact_timeline(&booked_contact.id)?;
    println!(
        "\nContact {} timeline: {} calls, {} history entries",
        booked_contact.id,
        timeline.calls.len(),
        timeline.history.len()
    );

    let events = notifier.events();
    if events.is_empty() {
        println!("Pipeline notifications: none dispatched");
    } else {
        println!("Pipeline notifications:");
        for alert in events {
            println!("  - template={} -> {}", alert.template, alert.contact_id);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_runs_end_to_end_on_sample_data() {
        let at = parse_timestamp("2025-10-01").expect("valid timestamp");
        run_demo(DemoArgs { at: Some(at) }).expect("demo completes");
    }

    #[test]
    fn queue_preview_rejects_unknown_agents() {
        let result = run_queue_preview(QueueArgs {
            contacts: None,
            agents: None,
            catalog: None,
            agent: "ghost".to_string(),
            limit: 5,
            at: None,
        });
        assert!(matches!(result, Err(AppError::Prospecting(_))));
    }
}
