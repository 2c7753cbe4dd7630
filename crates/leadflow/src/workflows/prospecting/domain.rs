use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for prospects held in the contact store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContactId(pub String);

/// Identifier wrapper for telemarketing agents and commercials.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

/// Identifier wrapper for the campaign (contact database) a prospect belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CampaignId(pub String);

/// Opaque token proving ownership of a dispatcher lease.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaseToken(pub String);

impl LeaseToken {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pipeline status of a prospect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactStatus {
    New,
    Nrp,
    Unreachable,
    AnsweringMachine,
    Absent,
    CallbackLater,
    FollowUp,
    AppointmentTaken,
    NotInterested,
    OutOfTarget,
    AlreadyClient,
    WrongNumber,
    Blacklisted,
    RefusArgu,
}

impl ContactStatus {
    pub const fn ordered() -> [Self; 14] {
        [
            Self::New,
            Self::Nrp,
            Self::Unreachable,
            Self::AnsweringMachine,
            Self::Absent,
            Self::CallbackLater,
            Self::FollowUp,
            Self::AppointmentTaken,
            Self::NotInterested,
            Self::OutOfTarget,
            Self::AlreadyClient,
            Self::WrongNumber,
            Self::Blacklisted,
            Self::RefusArgu,
        ]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Nrp => "NRP",
            Self::Unreachable => "UNREACHABLE",
            Self::AnsweringMachine => "ANSWERING_MACHINE",
            Self::Absent => "ABSENT",
            Self::CallbackLater => "CALLBACK_LATER",
            Self::FollowUp => "FOLLOW_UP",
            Self::AppointmentTaken => "APPOINTMENT_TAKEN",
            Self::NotInterested => "NOT_INTERESTED",
            Self::OutOfTarget => "OUT_OF_TARGET",
            Self::AlreadyClient => "ALREADY_CLIENT",
            Self::WrongNumber => "WRONG_NUMBER",
            Self::Blacklisted => "BLACKLISTED",
            Self::RefusArgu => "REFUS_ARGU",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Nrp => "No answer",
            Self::Unreachable => "Unreachable",
            Self::AnsweringMachine => "Answering machine",
            Self::Absent => "Decision maker absent",
            Self::CallbackLater => "Call back later",
            Self::FollowUp => "Follow up",
            Self::AppointmentTaken => "Appointment taken",
            Self::NotInterested => "Not interested",
            Self::OutOfTarget => "Out of target",
            Self::AlreadyClient => "Already a client",
            Self::WrongNumber => "Wrong number",
            Self::Blacklisted => "Blacklisted",
            Self::RefusArgu => "Refused after pitch",
        }
    }

    /// Statuses that latch `do_not_contact` and can never be left.
    pub const fn is_exclusion(self) -> bool {
        matches!(self, Self::Blacklisted | Self::RefusArgu)
    }

    /// Statuses that carry a mandatory `next_action_date`.
    pub const fn requires_callback(self) -> bool {
        matches!(self, Self::CallbackLater | Self::FollowUp)
    }

    /// Dispositions that end the calling workflow (exclusions included).
    pub const fn is_terminal_for_calling(self) -> bool {
        matches!(
            self,
            Self::AppointmentTaken
                | Self::NotInterested
                | Self::OutOfTarget
                | Self::AlreadyClient
                | Self::WrongNumber
                | Self::Blacklisted
                | Self::RefusArgu
        )
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ContactStatus {
    type Err = UnknownCode;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_uppercase();
        Self::ordered()
            .into_iter()
            .find(|status| status.code() == normalized)
            .ok_or_else(|| UnknownCode(raw.to_string()))
    }
}

/// Outcome an agent records after a call. Every status except `NEW` is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallOutcome {
    Nrp,
    Unreachable,
    AnsweringMachine,
    Absent,
    CallbackLater,
    FollowUp,
    AppointmentTaken,
    NotInterested,
    OutOfTarget,
    AlreadyClient,
    WrongNumber,
    Blacklisted,
    RefusArgu,
}

impl CallOutcome {
    pub const fn ordered() -> [Self; 13] {
        [
            Self::Nrp,
            Self::Unreachable,
            Self::AnsweringMachine,
            Self::Absent,
            Self::CallbackLater,
            Self::FollowUp,
            Self::AppointmentTaken,
            Self::NotInterested,
            Self::OutOfTarget,
            Self::AlreadyClient,
            Self::WrongNumber,
            Self::Blacklisted,
            Self::RefusArgu,
        ]
    }

    pub const fn resulting_status(self) -> ContactStatus {
        match self {
            Self::Nrp => ContactStatus::Nrp,
            Self::Unreachable => ContactStatus::Unreachable,
            Self::AnsweringMachine => ContactStatus::AnsweringMachine,
            Self::Absent => ContactStatus::Absent,
            Self::CallbackLater => ContactStatus::CallbackLater,
            Self::FollowUp => ContactStatus::FollowUp,
            Self::AppointmentTaken => ContactStatus::AppointmentTaken,
            Self::NotInterested => ContactStatus::NotInterested,
            Self::OutOfTarget => ContactStatus::OutOfTarget,
            Self::AlreadyClient => ContactStatus::AlreadyClient,
            Self::WrongNumber => ContactStatus::WrongNumber,
            Self::Blacklisted => ContactStatus::Blacklisted,
            Self::RefusArgu => ContactStatus::RefusArgu,
        }
    }

    pub const fn code(self) -> &'static str {
        self.resulting_status().code()
    }
}

impl FromStr for CallOutcome {
    type Err = UnknownCode;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_uppercase();
        Self::ordered()
            .into_iter()
            .find(|outcome| outcome.code() == normalized)
            .ok_or_else(|| UnknownCode(raw.to_string()))
    }
}

/// Raised when a status or outcome code is outside the fixed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown code '{0}'")]
pub struct UnknownCode(pub String);

/// Firmographic attributes feeding the completeness and potential scores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactProfile {
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub siret: Option<String>,
    pub activity: Option<String>,
    pub city: Option<String>,
    pub postcode: Option<String>,
    pub workforce: Option<String>,
}

impl ContactProfile {
    /// First integer found in the free-text workforce field ("250", "50-99", "10 salariés").
    pub fn workforce_size(&self) -> Option<u32> {
        let raw = self.workforce.as_deref()?;
        let digits: String = raw
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(char::is_ascii_digit)
            .collect();
        digits.parse().ok()
    }
}

/// Exclusive hand-out of a contact to one agent until `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub token: LeaseToken,
    pub agent_id: AgentId,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Lease {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Persistent prospect record as exposed by the contact store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub campaign_id: CampaignId,
    pub assigned_agent_id: Option<AgentId>,
    pub status: ContactStatus,
    pub sub_status: Option<String>,
    pub next_action_date: Option<DateTime<Utc>>,
    pub do_not_contact: bool,
    pub profile: ContactProfile,
    pub call_count: u32,
    pub last_contact_at: Option<DateTime<Utc>>,
    pub lease: Option<Lease>,
    /// Optimistic concurrency counter owned by the store.
    pub version: u64,
}

impl Contact {
    pub fn new(id: ContactId, campaign_id: CampaignId, profile: ContactProfile) -> Self {
        Self {
            id,
            campaign_id,
            assigned_agent_id: None,
            status: ContactStatus::New,
            sub_status: None,
            next_action_date: None,
            do_not_contact: false,
            profile,
            call_count: 0,
            last_contact_at: None,
            lease: None,
            version: 0,
        }
    }

    pub fn live_lease(&self, now: DateTime<Utc>) -> Option<&Lease> {
        self.lease.as_ref().filter(|lease| lease.is_live(now))
    }

    /// Checks the record-level invariants tying status to its mandatory fields.
    pub fn invariant_violation(&self) -> Option<&'static str> {
        if self.do_not_contact && !self.status.is_exclusion() {
            return Some("do_not_contact requires BLACKLISTED or REFUS_ARGU status");
        }
        if self.status.is_exclusion() && !self.do_not_contact {
            return Some("exclusion status requires do_not_contact");
        }
        if self.status.requires_callback() && self.next_action_date.is_none() {
            return Some("callback status requires next_action_date");
        }
        None
    }
}

/// Immutable record of a qualified call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEvent {
    pub contact_id: ContactId,
    pub agent_id: AgentId,
    pub at: DateTime<Utc>,
    pub outcome: CallOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Append-only audit entry shared by contacts and appointments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry<S> {
    pub entity_id: String,
    pub previous_status: Option<S>,
    pub new_status: S,
    pub actor: AgentId,
    pub at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

pub type ContactHistoryEntry = HistoryEntry<ContactStatus>;

/// Access level of an agent requesting work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Agent,
    Supervisor,
    Admin,
}

impl AgentRole {
    pub const fn has_full_access(self) -> bool {
        matches!(self, Self::Supervisor | Self::Admin)
    }
}

/// Directory entry describing which part of the contact base an agent may work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: AgentId,
    pub role: AgentRole,
    pub campaigns: BTreeSet<CampaignId>,
    /// Postcode prefixes; empty means every zone.
    #[serde(default)]
    pub zones: Vec<String>,
}

impl AgentProfile {
    pub fn covers_zone(&self, postcode: Option<&str>) -> bool {
        if self.zones.is_empty() {
            return true;
        }
        postcode
            .map(str::trim)
            .map(|code| self.zones.iter().any(|zone| code.starts_with(zone.as_str())))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_mapping_is_total_and_never_yields_new() {
        for outcome in CallOutcome::ordered() {
            let status = outcome.resulting_status();
            assert_ne!(status, ContactStatus::New);
            assert_eq!(status.code(), outcome.code());
        }
    }

    #[test]
    fn codes_parse_case_insensitively() {
        assert_eq!(
            "callback_later".parse::<CallOutcome>(),
            Ok(CallOutcome::CallbackLater)
        );
        assert_eq!(" NEW ".parse::<ContactStatus>(), Ok(ContactStatus::New));
        assert!("LATER".parse::<CallOutcome>().is_err());
        assert!("NEW".parse::<CallOutcome>().is_err());
    }

    #[test]
    fn workforce_size_reads_first_number() {
        let mut profile = ContactProfile::default();
        assert_eq!(profile.workforce_size(), None);
        profile.workforce = Some("250".to_string());
        assert_eq!(profile.workforce_size(), Some(250));
        profile.workforce = Some("de 50 à 99 salariés".to_string());
        assert_eq!(profile.workforce_size(), Some(50));
        profile.workforce = Some("inconnu".to_string());
        assert_eq!(profile.workforce_size(), None);
    }

    #[test]
    fn zones_match_postcode_prefixes() {
        let agent = AgentProfile {
            id: AgentId("a-1".to_string()),
            role: AgentRole::Agent,
            campaigns: BTreeSet::new(),
            zones: vec!["75".to_string(), "92".to_string()],
        };
        assert!(agent.covers_zone(Some("75011")));
        assert!(!agent.covers_zone(Some("69003")));
        assert!(!agent.covers_zone(None));
    }
}
