use chrono::{DateTime, Duration, Utc};

use super::super::domain::{Contact, ContactProfile, ContactStatus};
use super::config::ScoringConfig;

pub(crate) const COMPLETENESS_CAP: u8 = 30;
pub(crate) const ENGAGEMENT_CAP: u8 = 25;
pub(crate) const POTENTIAL_CAP: u8 = 30;
pub(crate) const TIMING_CAP: u8 = 15;

fn present(value: &Option<String>) -> bool {
    value
        .as_deref()
        .map(|raw| !raw.trim().is_empty())
        .unwrap_or(false)
}

pub(crate) fn completeness(profile: &ContactProfile) -> u8 {
    let mut points: u8 = 0;

    if present(&profile.company_name) {
        points += 4;
    }
    if present(&profile.contact_name) {
        points += 3;
    }
    if present(&profile.email) {
        points += 4;
    }

    let phone = present(&profile.phone);
    let mobile = present(&profile.mobile);
    if phone {
        points += 3;
    }
    if mobile {
        points += 3;
    }
    if phone && mobile {
        points += 2;
    }

    if present(&profile.siret) {
        points += 4;
    }
    if present(&profile.activity) {
        points += 3;
    }
    if present(&profile.city) && present(&profile.postcode) {
        points += 2;
    }
    if profile.workforce_size().is_some() {
        points += 2;
    }

    points.min(COMPLETENESS_CAP)
}

pub(crate) fn engagement(contact: &Contact) -> u8 {
    let calls = contact.call_count.saturating_mul(3).min(15) as u8;
    let momentum = match contact.status {
        ContactStatus::CallbackLater | ContactStatus::FollowUp | ContactStatus::AppointmentTaken => {
            10
        }
        _ => 0,
    };

    (calls + momentum).min(ENGAGEMENT_CAP)
}

fn workforce_points(size: Option<u32>) -> u8 {
    match size {
        Some(size) if size >= 250 => 20,
        Some(size) if size >= 50 => 15,
        Some(size) if size >= 10 => 10,
        Some(size) if size >= 1 => 5,
        _ => 0,
    }
}

pub(crate) fn potential(profile: &ContactProfile, config: &ScoringConfig) -> u8 {
    let mut points = workforce_points(profile.workforce_size());

    if let Some(activity) = profile.activity.as_deref() {
        let activity = activity.to_lowercase();
        if config
            .high_value_sectors
            .iter()
            .any(|sector| activity.contains(sector.as_str()))
        {
            points = points.saturating_add(config.sector_bonus);
        }
    }

    points.min(POTENTIAL_CAP)
}

pub(crate) fn timing(contact: &Contact, now: DateTime<Utc>) -> u8 {
    let Some(last_contact) = contact.last_contact_at else {
        return if contact.status == ContactStatus::New {
            TIMING_CAP
        } else {
            0
        };
    };

    let elapsed = now - last_contact;
    if elapsed <= Duration::days(7) {
        15
    } else if elapsed <= Duration::days(14) {
        12
    } else if elapsed <= Duration::days(30) {
        8
    } else if elapsed <= Duration::days(90) {
        4
    } else {
        0
    }
}

/// Dispositions whose potential is discounted and whose timing is discarded.
pub(crate) fn is_penalized(status: ContactStatus) -> bool {
    matches!(
        status,
        ContactStatus::NotInterested
            | ContactStatus::WrongNumber
            | ContactStatus::OutOfTarget
            | ContactStatus::AlreadyClient
    )
}
