//! Player evaluation scoring: plan definitions, live sessions, aggregation and badges.
//!
//! Data flows one way. A [`ScoreSheet`] holds normalized metric values, each carrying the
//! skill weights in force when it was recorded; the [`AggregationEngine`] reduces a
//! player's records into scores and an outcome; the [`BadgeDeriver`] turns the aggregate
//! and the player's history into newly earned badges. Progress tracking only looks at
//! which values are present and never touches the numbers.

pub mod aggregation;
pub mod badges;
pub mod config;
pub mod domain;
pub mod import;
pub mod metric;
pub mod plan;
pub mod repository;
pub mod router;
pub mod service;
pub mod session;
pub mod weights;

#[cfg(test)]
mod tests;

pub use aggregation::{
    AggregationEngine, CategoryScore, EvaluationSummary, ExerciseTotal, PlayerAggregate,
    PlayerSummaryEntry, SkillScore, ThresholdCheck, ThresholdResult,
};
pub use badges::{
    badge_catalog, derive_badges, Badge, BadgeDeriver, BadgeInfo, BadgePredicate, BadgeRule,
    BadgeType, CoachDecision, EvaluationRecord,
};
pub use config::{
    EvaluationThreshold, LevelReached, OutcomePolicy, ScoringConfig, ScoringConfigError,
    SkillCategory, SkillMatrix,
};
pub use domain::{
    CategoryName, DefinitionError, EvaluationId, ExerciseId, ExerciseLevel, MetricId, Outcome,
    PlanId, PlayerId, PlayerRef, SkillTag,
};
pub use import::{parse_timestamp, ScoreImportError, ScoreSheetImporter};
pub use metric::{InputError, Metric, MetricConfig, MetricKind, RawInput, SkillWeight};
pub use plan::{EvaluationPlan, Exercise, PlanItem};
pub use repository::{PlayerHistoryRepository, RepositoryError, SessionRepository, SessionView};
pub use router::evaluation_router;
pub use service::{EvaluationService, EvaluationServiceError, FinalizedEvaluation, PlayerResult};
pub use session::{
    EvaluationGroup, EvaluationSession, MetricEntry, PairStatus, ScoreRecord, ScoreSheet,
    SessionCursor, SessionError, SessionProgress, SessionStatus,
};
pub use weights::{distribute, SkillContribution};
