use chrono::{DateTime, Utc};
use leadflow::error::AppError;
use leadflow::workflows::prospecting::{
    AgentId, AgentProfile, AgentRole, CampaignId, Contact, DispatchConfig, InMemoryAgentDirectory,
    InMemoryAppointmentStore, InMemoryContactStore, InMemoryNotifier, ProspectingCatalog,
    ProspectingService,
};
use leadflow::workflows::seed::{self, ContactSeedLoader};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type ApiService = ProspectingService<
    InMemoryContactStore,
    InMemoryAgentDirectory,
    InMemoryAppointmentStore,
    InMemoryNotifier,
>;

pub(crate) const DEFAULT_CAMPAIGN: &str = "idf-2025";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Roster used when no agent file is supplied: two callers on the default campaign and a
/// supervisor with full access.
pub(crate) fn default_roster() -> Vec<AgentProfile> {
    let campaign = BTreeSet::from([CampaignId(DEFAULT_CAMPAIGN.to_string())]);
    vec![
        AgentProfile {
            id: AgentId("agent-1".to_string()),
            role: AgentRole::Agent,
            campaigns: campaign.clone(),
            zones: Vec::new(),
        },
        AgentProfile {
            id: AgentId("agent-2".to_string()),
            role: AgentRole::Agent,
            campaigns: campaign,
            zones: Vec::new(),
        },
        AgentProfile {
            id: AgentId("sup-1".to_string()),
            role: AgentRole::Supervisor,
            campaigns: BTreeSet::new(),
            zones: Vec::new(),
        },
    ]
}

pub(crate) fn load_roster(path: Option<&Path>) -> Result<Vec<AgentProfile>, AppError> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            serde_json::from_str(&raw).map_err(AppError::Roster)
        }
        None => Ok(default_roster()),
    }
}

pub(crate) fn load_catalog(path: Option<&Path>) -> Result<ProspectingCatalog, AppError> {
    match path {
        Some(path) => Ok(ProspectingCatalog::from_path(path)?),
        None => Ok(ProspectingCatalog::standard().clone()),
    }
}

pub(crate) fn load_contacts(path: Option<&Path>) -> Result<Vec<Contact>, AppError> {
    match path {
        Some(path) => Ok(ContactSeedLoader::from_path(path)?),
        None => Ok(Vec::new()),
    }
}

pub(crate) fn build_service(
    contacts: Vec<Contact>,
    roster: Vec<AgentProfile>,
    catalog: ProspectingCatalog,
    dispatch: DispatchConfig,
) -> ApiService {
    ProspectingService::new(
        Arc::new(InMemoryContactStore::with_contacts(contacts)),
        Arc::new(InMemoryAgentDirectory::with_agents(roster)),
        Arc::new(InMemoryAppointmentStore::default()),
        Arc::new(InMemoryNotifier::default()),
        catalog,
        dispatch,
    )
}

/// Clap adapter over the seed timestamp rules so `--at` and CSV dates agree.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    seed::parse_timestamp(raw)
        .ok_or_else(|| format!("failed to parse '{raw}' as RFC 3339 or YYYY-MM-DD"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_accept_dates_and_rfc3339() {
        assert_eq!(
            parse_timestamp("2025-10-01"),
            Ok(Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("2025-10-01T14:30:00+02:00"),
            Ok(Utc.with_ymd_and_hms(2025, 10, 1, 12, 30, 0).unwrap())
        );
        assert!(parse_timestamp("demain").is_err());
    }

    #[test]
    fn default_roster_includes_a_supervisor() {
        let roster = load_roster(None).expect("default roster");
        assert_eq!(roster.len(), 3);
        assert!(roster.iter().any(|agent| agent.role.has_full_access()));
    }

    #[test]
    fn missing_files_surface_io_errors() {
        assert!(matches!(
            load_roster(Some(Path::new("missing/agents.json"))),
            Err(AppError::Io(_))
        ));
        assert!(matches!(
            load_contacts(Some(Path::new("missing/contacts.csv"))),
            Err(AppError::Seed(_))
        ));
        assert!(load_contacts(None).expect("no seed").is_empty());
    }
}
