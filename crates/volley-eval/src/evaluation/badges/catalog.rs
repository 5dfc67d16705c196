use serde::{Deserialize, Serialize};

/// Recognition a player can earn from an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeType {
    Star,
    Improvement,
    Teamwork,
    Effort,
    Skill,
    Leadership,
    Consistency,
    Breakthrough,
}

impl BadgeType {
    pub const ALL: [BadgeType; 8] = [
        BadgeType::Star,
        BadgeType::Improvement,
        BadgeType::Teamwork,
        BadgeType::Effort,
        BadgeType::Skill,
        BadgeType::Leadership,
        BadgeType::Consistency,
        BadgeType::Breakthrough,
    ];

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Star => "Star Player",
            Self::Improvement => "Most Improved",
            Self::Teamwork => "Team Player",
            Self::Effort => "Maximum Effort",
            Self::Skill => "Skilled Performer",
            Self::Leadership => "Leader",
            Self::Consistency => "Consistent Performer",
            Self::Breakthrough => "Breakthrough Moment",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Star => "Exceptional performance and standout contribution",
            Self::Improvement => "Significant growth and development shown",
            Self::Teamwork => "Outstanding collaboration and support for teammates",
            Self::Effort => "Exceptional dedication and work ethic",
            Self::Skill => "High technical ability demonstrated",
            Self::Leadership => "Inspiring and guiding teammates effectively",
            Self::Consistency => "Reliable and steady performance",
            Self::Breakthrough => "Achieved a significant milestone or breakthrough",
        }
    }
}

/// Display metadata for a badge type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeInfo {
    pub badge_type: BadgeType,
    pub name: &'static str,
    pub description: &'static str,
}

impl From<BadgeType> for BadgeInfo {
    fn from(badge_type: BadgeType) -> Self {
        Self {
            badge_type,
            name: badge_type.display_name(),
            description: badge_type.description(),
        }
    }
}

pub fn badge_catalog() -> Vec<BadgeInfo> {
    BadgeType::ALL.into_iter().map(BadgeInfo::from).collect()
}
