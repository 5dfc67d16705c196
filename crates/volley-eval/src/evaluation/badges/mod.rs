mod catalog;
mod rules;

pub use catalog::{badge_catalog, BadgeInfo, BadgeType};
pub use rules::{BadgePredicate, BadgeRule};

use super::aggregation::PlayerAggregate;
use super::config::{LevelReached, ScoringConfig, SkillMatrix};
use super::domain::{EvaluationId, Outcome, PlanId, PlayerId};
use chrono::{DateTime, Utc};
use rules::RuleContext;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Badge held by a player. At most one per `(player, badge_type)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub player_id: PlayerId,
    pub badge_type: BadgeType,
    pub awarded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_evaluation_id: Option<EvaluationId>,
}

/// Coach's call when finalizing. Without an outcome the suggested one stands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachDecision {
    #[serde(default)]
    pub outcome: Option<Outcome>,
    #[serde(default)]
    pub coach_notes: Option<String>,
}

impl CoachDecision {
    pub fn overrule(outcome: Outcome) -> Self {
        Self {
            outcome: Some(outcome),
            coach_notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.coach_notes = Some(notes.into());
        self
    }
}

/// Finalized evaluation kept in a player's history.
///
/// `outcome` is the final verdict; `suggested_outcome` is what the thresholds proposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub evaluation_id: EvaluationId,
    pub plan_id: PlanId,
    pub player_id: PlayerId,
    pub overall: Option<f64>,
    pub outcome: Outcome,
    pub suggested_outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coach_notes: Option<String>,
    pub completed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highest_level: Option<LevelReached>,
}

impl EvaluationRecord {
    /// `aggregate.outcome` is taken as the suggestion; the decision may replace it.
    pub fn from_aggregate(
        evaluation_id: EvaluationId,
        aggregate: &PlayerAggregate,
        decision: CoachDecision,
        completed_at: DateTime<Utc>,
    ) -> Self {
        let suggested_outcome = aggregate.outcome.unwrap_or(Outcome::Pending);
        Self {
            evaluation_id,
            plan_id: aggregate.plan_id.clone(),
            player_id: aggregate.player_id.clone(),
            overall: aggregate.overall,
            outcome: decision.outcome.unwrap_or(suggested_outcome),
            suggested_outcome,
            coach_notes: decision
                .coach_notes
                .map(|notes| notes.trim().to_string())
                .filter(|notes| !notes.is_empty()),
            completed_at,
            highest_level: aggregate.highest_level.clone(),
        }
    }

    pub fn is_overruled(&self) -> bool {
        self.outcome != self.suggested_outcome
    }
}

/// Applies configured badge rules to an aggregate.
#[derive(Debug, Clone)]
pub struct BadgeDeriver {
    rules: Vec<BadgeRule>,
    matrix: Option<SkillMatrix>,
}

impl BadgeDeriver {
    pub fn new(rules: Vec<BadgeRule>, matrix: Option<SkillMatrix>) -> Self {
        Self { rules, matrix }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config.badges.clone(), config.skill_matrix.clone())
    }

    pub fn rules(&self) -> &[BadgeRule] {
        &self.rules
    }

    /// Badges newly earned by `player_id`.
    ///
    /// `history` holds the player's earlier evaluations in any order and must not include
    /// the one being scored. Types already present in `prior_badges` are never returned,
    /// and a type earned by several rules is returned once, in rule order.
    pub fn derive(
        &self,
        player_id: &PlayerId,
        aggregate: &PlayerAggregate,
        history: &[EvaluationRecord],
        prior_badges: &[Badge],
        now: DateTime<Utc>,
        source_evaluation_id: Option<&EvaluationId>,
    ) -> Vec<Badge> {
        if aggregate.is_empty() {
            return Vec::new();
        }

        let mut earlier: Vec<&EvaluationRecord> = history
            .iter()
            .filter(|entry| &entry.player_id == player_id)
            .collect();
        earlier.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

        let ctx = RuleContext {
            aggregate,
            history: &earlier,
            matrix: self.matrix.as_ref(),
        };

        let mut held: BTreeSet<BadgeType> = prior_badges
            .iter()
            .filter(|badge| &badge.player_id == player_id)
            .map(|badge| badge.badge_type)
            .collect();

        let mut awarded = Vec::new();
        for rule in &self.rules {
            if held.contains(&rule.badge_type) || !rule.predicate.holds(&ctx) {
                continue;
            }
            held.insert(rule.badge_type);
            awarded.push(Badge {
                player_id: player_id.clone(),
                badge_type: rule.badge_type,
                awarded_at: now,
                source_evaluation_id: source_evaluation_id.cloned(),
            });
        }

        awarded
    }
}

/// Convenience wrapper over [`BadgeDeriver::derive`] with the rules of `config`.
pub fn derive_badges(
    config: &ScoringConfig,
    player_id: &PlayerId,
    aggregate: &PlayerAggregate,
    history: &[EvaluationRecord],
    prior_badges: &[Badge],
    now: DateTime<Utc>,
) -> Vec<Badge> {
    BadgeDeriver::from_config(config).derive(player_id, aggregate, history, prior_badges, now, None)
}
