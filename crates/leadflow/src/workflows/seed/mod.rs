//! Fixed-header CSV loader hydrating the in-memory contact store.

mod parser;

use crate::workflows::prospecting::{
    AgentId, CampaignId, Contact, ContactId, ContactProfile, ContactStatus,
};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

pub use parser::parse_timestamp;
use parser::{parse_flag, ContactRow};

#[derive(Debug)]
pub enum ContactSeedError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { row: usize, reason: String },
}

impl std::fmt::Display for ContactSeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContactSeedError::Io(err) => write!(f, "failed to read contact seed: {}", err),
            ContactSeedError::Csv(err) => write!(f, "invalid contact CSV data: {}", err),
            ContactSeedError::InvalidRow { row, reason } => {
                write!(f, "contact row {} rejected: {}", row, reason)
            }
        }
    }
}

impl std::error::Error for ContactSeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ContactSeedError::Io(err) => Some(err),
            ContactSeedError::Csv(err) => Some(err),
            ContactSeedError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for ContactSeedError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ContactSeedError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct ContactSeedLoader;

impl ContactSeedLoader {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Contact>, ContactSeedError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Contact>, ContactSeedError> {
        let mut seen = HashSet::new();
        let mut contacts = Vec::new();

        // Row numbers are 1-based and skip the header line.
        for (index, row) in parser::parse_rows(reader)?.into_iter().enumerate() {
            let row_number = index + 2;
            let contact = contact_from_row(row)
                .map_err(|reason| ContactSeedError::InvalidRow {
                    row: row_number,
                    reason,
                })?;

            if !seen.insert(contact.id.clone()) {
                return Err(ContactSeedError::InvalidRow {
                    row: row_number,
                    reason: format!("duplicate contact id '{}'", contact.id),
                });
            }
            contacts.push(contact);
        }

        Ok(contacts)
    }
}

fn contact_from_row(row: ContactRow) -> Result<Contact, String> {
    if row.id.trim().is_empty() {
        return Err("id is required".to_string());
    }
    if row.campaign.trim().is_empty() {
        return Err("campaign is required".to_string());
    }

    let status = match row.status.as_deref() {
        Some(raw) => raw
            .parse::<ContactStatus>()
            .map_err(|err| format!("status: {err}"))?,
        None => ContactStatus::New,
    };

    let next_action_date = match row.next_action_date.as_deref() {
        Some(raw) => Some(
            parse_timestamp(raw).ok_or_else(|| format!("next_action_date '{raw}' is not a date"))?,
        ),
        None => None,
    };

    let last_contact_at = match row.last_contact.as_deref() {
        Some(raw) => Some(
            parse_timestamp(raw).ok_or_else(|| format!("last_contact '{raw}' is not a date"))?,
        ),
        None => None,
    };

    let do_not_contact = match row.do_not_contact.as_deref() {
        Some(raw) => {
            parse_flag(raw).ok_or_else(|| format!("do_not_contact '{raw}' is not a flag"))?
        }
        None => status.is_exclusion(),
    };

    let call_count = match row.call_count.as_deref() {
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("call_count '{raw}' is not a count"))?,
        None => 0,
    };

    let profile = ContactProfile {
        company_name: row.company,
        contact_name: row.contact_name,
        email: row.email,
        phone: row.phone,
        mobile: row.mobile,
        siret: row.siret,
        activity: row.activity,
        city: row.city,
        postcode: row.postcode,
        workforce: row.workforce,
    };

    let mut contact = Contact::new(
        ContactId(row.id.trim().to_string()),
        CampaignId(row.campaign.trim().to_string()),
        profile,
    );
    contact.assigned_agent_id = row.assigned_agent.map(AgentId);
    contact.status = status;
    contact.next_action_date = next_action_date;
    contact.do_not_contact = do_not_contact;
    contact.call_count = call_count;
    contact.last_contact_at = last_contact_at;

    match contact.invariant_violation() {
        Some(violation) => Err(violation.to_string()),
        None => Ok(contact),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::io::Cursor;

    const HEADER: &str = concat!(
        "id,campaign,assigned_agent,status,next_action_date,do_not_contact,",
        "company,contact_name,email,phone,mobile,siret,activity,city,postcode,",
        "workforce,call_count,last_contact\n",
    );

    fn load(rows: &str) -> Result<Vec<Contact>, ContactSeedError> {
        ContactSeedLoader::from_reader(Cursor::new(format!("{HEADER}{rows}")))
    }

    #[test]
    fn loads_rows_with_defaults_for_empty_cells() {
        let contacts = load(concat!(
            "c-1,idf,,,,,Acme,Jeanne Martin,j@acme.fr,0142000000,0600000000,",
            "12345678900011,Informatique,Paris,75011,250,,\n",
            "c-2,idf,agent-7,CALLBACK_LATER,2025-10-02T09:30:00Z,,Beta,,,,,,,",
            "Lyon,69003,12,2,2025-09-20\n",
        ))
        .expect("seed loads");

        assert_eq!(contacts.len(), 2);
        let first = &contacts[0];
        assert_eq!(first.status, ContactStatus::New);
        assert_eq!(first.profile.workforce_size(), Some(250));
        assert!(!first.do_not_contact);

        let second = &contacts[1];
        assert_eq!(second.status, ContactStatus::CallbackLater);
        assert_eq!(second.assigned_agent_id, Some(AgentId("agent-7".to_string())));
        assert_eq!(
            second.next_action_date,
            Some(Utc.with_ymd_and_hms(2025, 10, 2, 9, 30, 0).unwrap())
        );
        assert_eq!(
            second.last_contact_at,
            Some(Utc.with_ymd_and_hms(2025, 9, 20, 0, 0, 0).unwrap())
        );
        assert_eq!(second.call_count, 2);
    }

    #[test]
    fn exclusion_status_latches_do_not_contact() {
        let contacts = load("c-9,idf,,BLACKLISTED,,,,,,,,,,,,,,\n").expect("seed loads");
        assert!(contacts[0].do_not_contact);
    }

    #[test]
    fn rejects_rows_breaking_contact_invariants() {
        match load("c-1,idf,,CALLBACK_LATER,,,,,,,,,,,,,,\n") {
            Err(ContactSeedError::InvalidRow { row, reason }) => {
                assert_eq!(row, 2);
                assert!(reason.contains("next_action_date"));
            }
            other => panic!("expected invalid row, got {other:?}"),
        }

        match load("c-1,idf,,NEW,,yes,,,,,,,,,,,,\n") {
            Err(ContactSeedError::InvalidRow { reason, .. }) => {
                assert!(reason.contains("do_not_contact"));
            }
            other => panic!("expected invalid row, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_status_and_duplicate_ids() {
        assert!(matches!(
            load("c-1,idf,,LATER,,,,,,,,,,,,,,\n"),
            Err(ContactSeedError::InvalidRow { .. })
        ));
        assert!(matches!(
            load("c-1,idf,,,,,,,,,,,,,,,,\nc-1,idf,,,,,,,,,,,,,,,,\n"),
            Err(ContactSeedError::InvalidRow { row: 3, .. })
        ));
    }

    #[test]
    fn bare_dates_mean_midnight_utc() {
        let midnight = Utc.with_ymd_and_hms(2025, 9, 20, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-09-20"), Some(midnight));
        assert_eq!(parse_timestamp(" 2025-09-20 "), Some(midnight));
        assert_eq!(
            parse_timestamp("2025-09-20T11:00:00+02:00"),
            Some(Utc.with_ymd_and_hms(2025, 9, 20, 9, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("20/09/2025"), None);
        assert_eq!(parse_timestamp(""), None);
    }
}
