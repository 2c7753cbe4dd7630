use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Product vocabulary consumed by qualification and scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProspectingCatalog {
    pub out_of_target_reasons: Vec<SubReason>,
    pub high_value_sectors: Vec<String>,
}

/// Allowed justification for an `OUT_OF_TARGET` disposition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubReason {
    pub code: String,
    pub label: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog must list at least one {0}")]
    Empty(&'static str),
    #[error("duplicate out-of-target reason code '{0}'")]
    DuplicateReason(String),
}

const STANDARD_REASONS: [(&str, &str); 6] = [
    ("company_too_small", "Company too small"),
    ("outside_zone", "Outside the covered zone"),
    ("sector_excluded", "Sector not targeted"),
    ("no_decision_maker", "No reachable decision maker"),
    ("already_equipped", "Already equipped elsewhere"),
    ("company_closed", "Company closed or in liquidation"),
];

const STANDARD_SECTORS: [&str; 8] = [
    "informatique",
    "industrie",
    "btp",
    "santé",
    "finance",
    "transport",
    "logistique",
    "immobilier",
];

impl ProspectingCatalog {
    /// Process-wide default vocabulary, built on first use.
    pub fn standard() -> &'static ProspectingCatalog {
        static STANDARD: OnceLock<ProspectingCatalog> = OnceLock::new();
        STANDARD.get_or_init(|| ProspectingCatalog {
            out_of_target_reasons: STANDARD_REASONS
                .iter()
                .map(|(code, label)| SubReason {
                    code: (*code).to_string(),
                    label: (*label).to_string(),
                })
                .collect(),
            high_value_sectors: STANDARD_SECTORS.iter().map(|s| (*s).to_string()).collect(),
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let catalog: ProspectingCatalog = serde_json::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.out_of_target_reasons.is_empty() {
            return Err(CatalogError::Empty("out_of_target_reasons entry"));
        }
        if self.high_value_sectors.is_empty() {
            return Err(CatalogError::Empty("high_value_sectors entry"));
        }

        let mut seen = HashSet::new();
        for reason in &self.out_of_target_reasons {
            if !seen.insert(reason.code.as_str()) {
                return Err(CatalogError::DuplicateReason(reason.code.clone()));
            }
        }
        Ok(())
    }

    pub fn sub_reason(&self, code: &str) -> Option<&SubReason> {
        let code = code.trim();
        self.out_of_target_reasons
            .iter()
            .find(|reason| reason.code == code)
    }

    pub fn is_high_value_sector(&self, activity: &str) -> bool {
        let activity = activity.to_lowercase();
        self.high_value_sectors
            .iter()
            .any(|sector| activity.contains(&sector.to_lowercase()))
    }
}
