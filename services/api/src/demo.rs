use crate::infra::{timestamp_arg, InMemoryHistoryRepository, InMemorySessionRepository};
use crate::report::{build_report, EvaluationReport, PlayerReport, PlayerSelection};
use chrono::{DateTime, Utc};
use clap::Args;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use volley_eval::error::AppError;
use volley_eval::evaluation::{
    CoachDecision, EvaluationPlan, EvaluationService, EvaluationSummary, Outcome, PlayerId,
    ScoringConfig, SessionProgress, SessionStatus,
};

const DEMO_PLAN: &str = include_str!("../../../crates/volley-eval/fixtures/spring_tryouts.json");
const DEMO_SCORES: &str =
    include_str!("../../../crates/volley-eval/fixtures/spring_tryouts_scores.csv");

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Number of evaluator groups to split the roster into.
    #[arg(long, default_value_t = 2)]
    pub(crate) groups: usize,
    /// Timestamp used for the session and imported rows (defaults to now).
    #[arg(long, value_parser = timestamp_arg)]
    pub(crate) at: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Plan definition in JSON
    #[arg(long)]
    pub(crate) plan: PathBuf,
    /// Score export (CSV) to apply to the plan
    #[arg(long)]
    pub(crate) scores: Option<PathBuf>,
    /// Scoring rules in JSON (defaults to the standard club rules)
    #[arg(long)]
    pub(crate) scoring: Option<PathBuf>,
    /// Show the full breakdown for a single player
    #[arg(long, conflicts_with = "all_players")]
    pub(crate) player: Option<String>,
    /// Show the full breakdown for every player
    #[arg(long)]
    pub(crate) all_players: bool,
    /// Default timestamp for rows without one (defaults to now)
    #[arg(long, value_parser = timestamp_arg)]
    pub(crate) at: Option<DateTime<Utc>>,
    /// Print the report as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs {
        plan,
        scores,
        scoring,
        player,
        all_players,
        at,
        json,
    } = args;

    let plan: EvaluationPlan = serde_json::from_reader(BufReader::new(File::open(plan)?))?;
    let config = match scoring {
        Some(path) => ScoringConfig::load_from_path(path)?,
        None => ScoringConfig::standard(),
    };
    let scores = scores.map(File::open).transpose()?.map(BufReader::new);
    let selection = match (player, all_players) {
        (Some(player), _) => PlayerSelection::One(PlayerId::new(player)),
        (None, true) => PlayerSelection::All,
        (None, false) => PlayerSelection::None,
    };

    let report = build_report(
        plan,
        scores,
        &config,
        at.unwrap_or_else(Utc::now),
        selection,
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render_report(&report);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let at = args.at.unwrap_or_else(Utc::now);
    let plan: EvaluationPlan = serde_json::from_str(DEMO_PLAN)?;
    let plan_id = plan.id().clone();
    let roster: Vec<PlayerId> = plan.players().iter().map(|player| player.id.clone()).collect();

    let service = EvaluationService::new(
        Arc::new(InMemorySessionRepository::default()),
        Arc::new(InMemoryHistoryRepository::default()),
        ScoringConfig::standard(),
    );

    println!("Player evaluation demo");
    let view = service.register_plan(plan)?;
    println!(
        "Registered plan {} with {} players and {} exercises",
        view.plan_id, view.players, view.exercises
    );

    service.set_status(&plan_id, SessionStatus::Running, at)?;
    if args.groups > 0 {
        match service.split_groups(&plan_id, args.groups) {
            Ok(groups) => {
                for group in groups {
                    let players: Vec<&str> =
                        group.players.iter().map(PlayerId::as_str).collect();
                    println!("  {}: {}", group.name, players.join(", "));
                }
            }
            Err(err) => println!("  Group split skipped: {}", err),
        }
    }

    let rows = service.import_scores(&plan_id, DEMO_SCORES.as_bytes(), at)?;
    println!("Imported {} score rows", rows);

    render_progress(&service.progress(&plan_id)?);
    render_summary(&service.summary(&plan_id)?);

    println!("\nFinalized evaluations");
    for player in &roster {
        match service.finalize(&plan_id, player, CoachDecision::default(), at) {
            Ok(finalized) => {
                let badges: Vec<&str> = finalized
                    .awarded
                    .iter()
                    .map(|badge| badge.badge_type.display_name())
                    .collect();
                println!(
                    "- {} ({}): {}",
                    player,
                    finalized.record.outcome.label(),
                    if badges.is_empty() {
                        "no badges".to_string()
                    } else {
                        badges.join(", ")
                    }
                );
            }
            Err(err) => println!("- {}: {}", player, err),
        }
    }

    let view = service.set_status(&plan_id, SessionStatus::Completed, at)?;
    println!("\nSession {} is {}", view.plan_id, view.status);
    Ok(())
}

fn render_report(report: &EvaluationReport) {
    println!("Evaluation report for {}", report.plan_id);
    println!("Imported rows: {}", report.imported_rows);
    render_progress(&report.progress);
    render_summary(&report.summary);

    if let Some(players) = &report.players {
        for player in players {
            render_player(player);
        }
    }
}

fn render_progress(progress: &SessionProgress) {
    println!(
        "\nProgress: {}/{} pairs scored ({:.0}%)",
        progress.total_scored, progress.total_possible, progress.overall_progress
    );
    for exercise in &progress.exercises {
        println!(
            "  {:<24} {}/{}{}",
            exercise.exercise_name,
            exercise.players_scored,
            exercise.total_players,
            if exercise.complete { " done" } else { "" }
        );
    }
    for group in &progress.groups {
        println!(
            "  {:<24} {}/{} players, {}/{} exercises",
            group.group_name,
            group.players_scored,
            group.total_players,
            group.exercises_completed,
            group.total_exercises
        );
    }
}

fn render_summary(summary: &EvaluationSummary) {
    println!(
        "\nOutcomes: {} passed, {} failed, {} pending of {} players",
        summary.passed_count, summary.failed_count, summary.pending_count, summary.total_players
    );
    for entry in &summary.players {
        let overall = entry
            .overall
            .map(|score| format!("{score:.1}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<20} {:>6}  {}",
            entry.display_name,
            overall,
            entry.outcome.label()
        );
    }
}

fn render_player(player: &PlayerReport) {
    let aggregate = &player.aggregate;
    println!(
        "\nPlayer {} ({})",
        aggregate.player_id,
        aggregate.outcome.unwrap_or(Outcome::Pending).label()
    );
    for category in aggregate.category_scores.values() {
        println!("  {:<16} {:>6.1}", category.category.as_str(), category.score);
    }
    for skill in aggregate.skill_scores.values() {
        let level = skill
            .level
            .as_ref()
            .map(|level| format!(" [{}]", level.label))
            .unwrap_or_default();
        println!("    {:<14} {:>6.1}{}", skill.skill.as_str(), skill.score, level);
    }
    if let Some(check) = &aggregate.threshold_check {
        println!(
            "  Thresholds: {}",
            if check.passed { "met" } else { "not met" }
        );
    }
    if !player.badges.is_empty() {
        let names: Vec<&str> = player
            .badges
            .iter()
            .map(|badge| badge.display_name())
            .collect();
        println!("  Badges on first evaluation: {}", names.join(", "));
    }
}
