use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier of an evaluation plan (one per evaluation event).
    PlanId
);
string_id!(
    /// Identifier of an evaluated player.
    PlayerId
);
string_id!(ExerciseId);
string_id!(MetricId);
string_id!(
    /// Identifier of a finalized evaluation stored in a player's history.
    EvaluationId
);
string_id!(
    /// Named competency (e.g. Passing, Power) that metrics contribute evidence toward.
    SkillTag
);
string_id!(
    /// Grouping of skills such as Physical, Technical or Mental.
    CategoryName
);

/// Roster entry for a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub id: PlayerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl PlayerRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: PlayerId::new(id),
            name: None,
        }
    }

    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: PlayerId::new(id),
            name: Some(name.into()),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }
}

/// Difficulty tier of an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Elite,
}

impl ExerciseLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
            Self::Elite => "Elite",
        }
    }
}

/// Verdict derived from aggregated scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pending,
    Passed,
    Failed,
}

impl Outcome {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

/// Structural problems found while building metric, exercise or plan definitions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DefinitionError {
    #[error("metric '{metric}' must have a positive max_points")]
    NonPositiveMaxPoints { metric: MetricId },
    #[error("metric '{metric}' skill weights sum to {total}%, expected 100% or no weights")]
    WeightsDoNotSumTo100 { metric: MetricId, total: u32 },
    #[error("metric '{metric}' assigns skill '{skill}' more than once")]
    DuplicateSkillWeight { metric: MetricId, skill: SkillTag },
    #[error("slider metric '{metric}' must use a positive step")]
    NonPositiveStep { metric: MetricId },
    #[error("exercise '{exercise}' must contain at least one metric")]
    EmptyExercise { exercise: ExerciseId },
    #[error("exercise '{exercise}' defines metric '{metric}' more than once")]
    DuplicateMetric {
        exercise: ExerciseId,
        metric: MetricId,
    },
    #[error("plan '{plan}' must contain at least one exercise")]
    NoExercises { plan: PlanId },
    #[error("plan '{plan}' must contain at least one player")]
    NoPlayers { plan: PlanId },
    #[error("plan '{plan}' uses order {order} for more than one exercise")]
    DuplicateOrder { plan: PlanId, order: u32 },
    #[error("plan '{plan}' includes exercise '{exercise}' more than once")]
    DuplicateExercise { plan: PlanId, exercise: ExerciseId },
    #[error("plan '{plan}' lists player '{player}' more than once")]
    DuplicatePlayer { plan: PlanId, player: PlayerId },
}
