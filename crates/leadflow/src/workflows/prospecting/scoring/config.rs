use serde::{Deserialize, Serialize};

use super::super::catalog::ProspectingCatalog;

/// Injectable weights for the potential sub-score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub high_value_sectors: Vec<String>,
    pub sector_bonus: u8,
}

impl From<&ProspectingCatalog> for ScoringConfig {
    fn from(catalog: &ProspectingCatalog) -> Self {
        Self {
            high_value_sectors: catalog
                .high_value_sectors
                .iter()
                .map(|sector| sector.to_lowercase())
                .collect(),
            sector_bonus: 10,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::from(ProspectingCatalog::standard())
    }
}
