use super::super::domain::{Outcome, PlanId, PlayerId, PlayerRef};
use super::PlayerAggregate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSummaryEntry {
    pub player_id: PlayerId,
    pub display_name: String,
    pub overall: Option<f64>,
    pub outcome: Outcome,
}

/// Outcome counts across a plan's roster.
///
/// Players without any record count as pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub plan_id: PlanId,
    pub total_players: usize,
    pub evaluated_count: usize,
    pub passed_count: usize,
    pub failed_count: usize,
    pub pending_count: usize,
    pub players: Vec<PlayerSummaryEntry>,
}

impl EvaluationSummary {
    pub(crate) fn from_aggregates<'a>(
        plan_id: PlanId,
        aggregates: impl Iterator<Item = (&'a PlayerRef, PlayerAggregate)>,
    ) -> Self {
        let mut summary = Self {
            plan_id,
            total_players: 0,
            evaluated_count: 0,
            passed_count: 0,
            failed_count: 0,
            pending_count: 0,
            players: Vec::new(),
        };

        for (player, aggregate) in aggregates {
            summary.total_players += 1;
            if !aggregate.is_empty() {
                summary.evaluated_count += 1;
            }
            let outcome = aggregate.outcome.unwrap_or(Outcome::Pending);
            match outcome {
                Outcome::Passed => summary.passed_count += 1,
                Outcome::Failed => summary.failed_count += 1,
                Outcome::Pending => summary.pending_count += 1,
            }
            summary.players.push(PlayerSummaryEntry {
                player_id: player.id.clone(),
                display_name: player.display_name().to_string(),
                overall: aggregate.overall,
                outcome,
            });
        }

        summary
    }
}
