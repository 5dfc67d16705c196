use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Read;
use volley_eval::error::AppError;
use volley_eval::evaluation::{
    derive_badges, AggregationEngine, BadgeType, EvaluationPlan, EvaluationServiceError,
    EvaluationSession, EvaluationSummary, PlanId, PlayerAggregate, PlayerId, ScoreSheet,
    ScoreSheetImporter, ScoringConfig, SessionProgress,
};

/// Offline snapshot of a plan scored from a CSV export.
#[derive(Debug, Serialize)]
pub(crate) struct EvaluationReport {
    pub(crate) plan_id: PlanId,
    pub(crate) imported_rows: usize,
    pub(crate) progress: SessionProgress,
    pub(crate) summary: EvaluationSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) players: Option<Vec<PlayerReport>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PlayerReport {
    pub(crate) aggregate: PlayerAggregate,
    /// Badges a first evaluation with these scores would earn.
    pub(crate) badges: Vec<BadgeType>,
}

pub(crate) enum PlayerSelection {
    None,
    All,
    One(PlayerId),
}

/// Import `scores` against `plan` and reduce the result without touching any repository.
pub(crate) fn build_report<R: Read>(
    plan: EvaluationPlan,
    scores: Option<R>,
    config: &ScoringConfig,
    at: DateTime<Utc>,
    selection: PlayerSelection,
) -> Result<EvaluationReport, AppError> {
    let mut sheet = ScoreSheet::new(plan.id().clone());
    let imported_rows = match scores {
        Some(reader) => ScoreSheetImporter::apply(reader, &plan, &mut sheet, at)?,
        None => 0,
    };

    let mut session = EvaluationSession::new(plan);
    session
        .restore(sheet.records().cloned())
        .map_err(EvaluationServiceError::from)?;

    let engine = AggregationEngine::new(config.clone());
    let plan = session.plan();
    let summary = engine.summarize(plan, session.sheet());

    let selected: Vec<PlayerId> = match selection {
        PlayerSelection::None => Vec::new(),
        PlayerSelection::All => plan.players().iter().map(|player| player.id.clone()).collect(),
        PlayerSelection::One(player) => {
            if !plan.has_player(&player) {
                return Err(EvaluationServiceError::PlayerNotFound {
                    plan: plan.id().clone(),
                    player,
                }
                .into());
            }
            vec![player]
        }
    };

    let players = if selected.is_empty() {
        None
    } else {
        Some(
            selected
                .iter()
                .map(|player| {
                    let aggregate = engine.aggregate(plan, session.sheet(), player);
                    let badges = derive_badges(config, player, &aggregate, &[], &[], at)
                        .into_iter()
                        .map(|badge| badge.badge_type)
                        .collect();
                    PlayerReport { aggregate, badges }
                })
                .collect(),
        )
    };

    Ok(EvaluationReport {
        plan_id: plan.id().clone(),
        imported_rows,
        progress: session.progress(),
        summary,
        players,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PLAN_JSON: &str = include_str!("../../../crates/volley-eval/fixtures/spring_tryouts.json");
    const SCORES_CSV: &str =
        include_str!("../../../crates/volley-eval/fixtures/spring_tryouts_scores.csv");

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn plan() -> EvaluationPlan {
        serde_json::from_str(PLAN_JSON).expect("fixture plan")
    }

    #[test]
    fn report_summarizes_the_export() {
        let report = build_report(
            plan(),
            Some(SCORES_CSV.as_bytes()),
            &ScoringConfig::standard(),
            at(),
            PlayerSelection::None,
        )
        .expect("report builds");

        assert_eq!(report.imported_rows, 16);
        assert_eq!(report.progress.total_scored, 7);
        assert_eq!(report.summary.passed_count, 2);
        assert!(report.players.is_none());
    }

    #[test]
    fn imported_rows_counts_rows_not_distinct_scores() {
        let csv = "Player,Exercise,Metric,Value\n\
                   p-01,serve,in_zone,4\n\
                   p-01,serve,in_zone,7\n";
        let report = build_report(
            plan(),
            Some(csv.as_bytes()),
            &ScoringConfig::standard(),
            at(),
            PlayerSelection::None,
        )
        .expect("report builds");

        assert_eq!(report.imported_rows, 2);
        assert_eq!(report.progress.total_scored, 0);
    }

    #[test]
    fn report_can_focus_on_one_player() {
        let report = build_report(
            plan(),
            Some(SCORES_CSV.as_bytes()),
            &ScoringConfig::standard(),
            at(),
            PlayerSelection::One(PlayerId::new("p-02")),
        )
        .expect("report builds");

        let players = report.players.expect("player section");
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].badges, vec![BadgeType::Effort]);
    }

    #[test]
    fn report_without_scores_leaves_everyone_pending() {
        let report = build_report(
            plan(),
            None::<&[u8]>,
            &ScoringConfig::standard(),
            at(),
            PlayerSelection::All,
        )
        .expect("report builds");

        assert_eq!(report.summary.pending_count, 4);
        let players = report.players.expect("player section");
        assert!(players.iter().all(|player| player.badges.is_empty()));
    }

    #[test]
    fn unknown_players_are_rejected() {
        match build_report(
            plan(),
            None::<&[u8]>,
            &ScoringConfig::standard(),
            at(),
            PlayerSelection::One(PlayerId::new("p-99")),
        ) {
            Err(AppError::Evaluation(EvaluationServiceError::PlayerNotFound { player, .. })) => {
                assert_eq!(player, PlayerId::new("p-99"))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
