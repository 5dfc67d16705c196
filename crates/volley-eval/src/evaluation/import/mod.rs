mod parser;

use super::domain::{ExerciseId, MetricId, PlayerId};
use super::plan::{EvaluationPlan, Exercise};
use super::session::{MetricEntry, ScoreSheet, SessionError};
use chrono::{DateTime, Utc};
use parser::{normalize_label, parse_rows, ScoreRow};

pub use parser::parse_timestamp;
use std::io::Read;
use std::path::Path;

#[derive(Debug)]
pub enum ScoreImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    UnknownPlayer { line: usize, player: String },
    UnknownExercise { line: usize, exercise: String },
    UnknownMetric { line: usize, metric: String },
    InvalidTimestamp { line: usize, value: String },
    Rejected { line: usize, source: SessionError },
}

impl std::fmt::Display for ScoreImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreImportError::Io(err) => write!(f, "failed to read score export: {}", err),
            ScoreImportError::Csv(err) => write!(f, "invalid score CSV data: {}", err),
            ScoreImportError::UnknownPlayer { line, player } => {
                write!(f, "line {line}: player '{player}' is not on the roster")
            }
            ScoreImportError::UnknownExercise { line, exercise } => {
                write!(f, "line {line}: exercise '{exercise}' is not part of the plan")
            }
            ScoreImportError::UnknownMetric { line, metric } => {
                write!(f, "line {line}: metric '{metric}' does not belong to the exercise")
            }
            ScoreImportError::InvalidTimestamp { line, value } => {
                write!(f, "line {line}: cannot parse timestamp '{value}'")
            }
            ScoreImportError::Rejected { line, source } => {
                write!(f, "line {line}: score rejected: {source}")
            }
        }
    }
}

impl std::error::Error for ScoreImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScoreImportError::Io(err) => Some(err),
            ScoreImportError::Csv(err) => Some(err),
            ScoreImportError::Rejected { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ScoreImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ScoreImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Loads offline score sheets exported as `Player,Exercise,Metric,Value,Scored At[,Notes]`.
///
/// Player, exercise and metric columns match either the id or the display name. Rows
/// go through the same normalization as live scoring and later rows overwrite earlier ones.
pub struct ScoreSheetImporter;

impl ScoreSheetImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        plan: &EvaluationPlan,
        default_scored_at: DateTime<Utc>,
    ) -> Result<ScoreSheet, ScoreImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, plan, default_scored_at)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        plan: &EvaluationPlan,
        default_scored_at: DateTime<Utc>,
    ) -> Result<ScoreSheet, ScoreImportError> {
        let mut sheet = ScoreSheet::new(plan.id().clone());
        Self::apply(reader, plan, &mut sheet, default_scored_at)?;
        Ok(sheet)
    }

    /// Merge rows into an existing sheet. Returns the number of rows applied.
    ///
    /// The sheet is left untouched when any row fails.
    pub fn apply<R: Read>(
        reader: R,
        plan: &EvaluationPlan,
        sheet: &mut ScoreSheet,
        default_scored_at: DateTime<Utc>,
    ) -> Result<usize, ScoreImportError> {
        let rows = parse_rows(reader)?;
        let mut staged = sheet.clone();

        for row in &rows {
            apply_row(row, plan, &mut staged, default_scored_at)?;
        }

        *sheet = staged;
        Ok(rows.len())
    }
}

fn apply_row(
    row: &ScoreRow,
    plan: &EvaluationPlan,
    sheet: &mut ScoreSheet,
    default_scored_at: DateTime<Utc>,
) -> Result<(), ScoreImportError> {
    let player_id = resolve_player(plan, &row.player).ok_or_else(|| {
        ScoreImportError::UnknownPlayer {
            line: row.line,
            player: row.player.clone(),
        }
    })?;
    let exercise = resolve_exercise(plan, &row.exercise).ok_or_else(|| {
        ScoreImportError::UnknownExercise {
            line: row.line,
            exercise: row.exercise.clone(),
        }
    })?;
    let metric_id =
        resolve_metric(exercise, &row.metric).ok_or_else(|| ScoreImportError::UnknownMetric {
            line: row.line,
            metric: row.metric.clone(),
        })?;
    let scored_at = match row.scored_at.as_deref() {
        Some(raw) => parse_timestamp(raw).ok_or_else(|| ScoreImportError::InvalidTimestamp {
            line: row.line,
            value: raw.to_string(),
        })?,
        None => default_scored_at,
    };

    let entry = MetricEntry {
        metric_id,
        value: row.value,
        notes: row.notes.clone(),
    };
    let exercise_id: ExerciseId = exercise.id().clone();
    sheet
        .submit(plan, &player_id, &exercise_id, &[entry], scored_at)
        .map_err(|source| ScoreImportError::Rejected {
            line: row.line,
            source,
        })?;
    Ok(())
}

fn resolve_player(plan: &EvaluationPlan, raw: &str) -> Option<PlayerId> {
    let wanted = normalize_label(raw);
    plan.players()
        .iter()
        .find(|player| {
            normalize_label(player.id.as_str()) == wanted
                || player
                    .name
                    .as_deref()
                    .is_some_and(|name| normalize_label(name) == wanted)
        })
        .map(|player| player.id.clone())
}

fn resolve_exercise<'p>(plan: &'p EvaluationPlan, raw: &str) -> Option<&'p Exercise> {
    let wanted = normalize_label(raw);
    plan.exercises().find(|exercise| {
        normalize_label(exercise.id().as_str()) == wanted
            || normalize_label(exercise.name()) == wanted
    })
}

fn resolve_metric(exercise: &Exercise, raw: &str) -> Option<MetricId> {
    let wanted = normalize_label(raw);
    exercise
        .metrics()
        .iter()
        .find(|metric| {
            normalize_label(metric.id().as_str()) == wanted || normalize_label(metric.name()) == wanted
        })
        .map(|metric| metric.id().clone())
}
