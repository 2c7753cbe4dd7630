use serde::{Deserialize, Serialize};

/// Temperature bucket derived from the total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    Cold,
    Cool,
    Warm,
    Hot,
}

/// Outreach priority attached to a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl ScoreCategory {
    pub const fn from_total(total: u8) -> Self {
        if total >= 70 {
            Self::Hot
        } else if total >= 50 {
            Self::Warm
        } else if total >= 30 {
            Self::Cool
        } else {
            Self::Cold
        }
    }

    pub const fn priority(self) -> Priority {
        match self {
            Self::Hot => Priority::High,
            Self::Warm => Priority::Medium,
            Self::Cool | Self::Cold => Priority::Low,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Hot => "HOT",
            Self::Warm => "WARM",
            Self::Cool => "COOL",
            Self::Cold => "COLD",
        }
    }
}
