mod config;
mod rules;
mod tier;

pub use config::ScoringConfig;
pub use tier::{Priority, ScoreCategory};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::Contact;

/// Stateless scorer ranking contacts for outreach.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Pure over `(contact, now)`; the clock is never read here.
    pub fn score(&self, contact: &Contact, now: DateTime<Utc>) -> ScoreBreakdown {
        let completeness = rules::completeness(&contact.profile);
        let engagement = rules::engagement(contact);
        let mut potential = rules::potential(&contact.profile, &self.config);
        let mut timing = rules::timing(contact, now);

        if rules::is_penalized(contact.status) {
            timing = 0;
            potential /= 2;
        }

        let total = (completeness + engagement + potential + timing).min(100);

        ScoreBreakdown {
            completeness,
            engagement,
            potential,
            timing,
            total,
            category: ScoreCategory::from_total(total),
        }
    }
}

/// Sub-scores and total for one contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub completeness: u8,
    pub engagement: u8,
    pub potential: u8,
    pub timing: u8,
    pub total: u8,
    pub category: ScoreCategory,
}

impl ScoreBreakdown {
    pub fn priority(&self) -> Priority {
        self.category.priority()
    }
}
