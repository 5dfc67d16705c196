use super::super::domain::{ExerciseId, SkillTag};
use super::super::plan::EvaluationPlan;
use super::super::session::ScoreRecord;
use super::super::weights::distribute;
use std::collections::BTreeMap;

/// Running sums of earned points and weight mass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Tally {
    pub earned: f64,
    pub mass: f64,
}

impl Tally {
    pub fn add(&mut self, earned: f64, mass: f64) {
        self.earned += earned;
        self.mass += mass;
    }

    pub fn merge(&mut self, other: &Tally) {
        self.add(other.earned, other.mass);
    }

    /// Percentage score, absent when nothing was measured.
    pub fn score(&self) -> Option<f64> {
        if self.mass > 0.0 {
            Some((self.earned / self.mass * 100.0).clamp(0.0, 100.0))
        } else {
            None
        }
    }
}

pub(crate) struct PlayerTallies {
    pub skills: BTreeMap<SkillTag, Tally>,
    pub overall: Tally,
    pub exercises: BTreeMap<ExerciseId, Tally>,
    pub records: usize,
}

/// Fold one player's records into per-skill, overall and per-exercise tallies.
///
/// Records for exercises that are no longer part of the plan are ignored.
pub(crate) fn tally_player<'a>(
    plan: &EvaluationPlan,
    records: impl Iterator<Item = &'a ScoreRecord>,
) -> PlayerTallies {
    let mut tallies = PlayerTallies {
        skills: BTreeMap::new(),
        overall: Tally::default(),
        exercises: BTreeMap::new(),
        records: 0,
    };

    for record in records {
        if plan.exercise(&record.exercise_id).is_none() {
            continue;
        }
        tallies.records += 1;
        tallies
            .exercises
            .entry(record.exercise_id.clone())
            .or_default()
            .add(record.value, f64::from(record.max_points));

        for contribution in distribute(record.value, record.max_points, &record.skill_weights) {
            tallies.overall.add(contribution.earned, contribution.mass);
            tallies
                .skills
                .entry(contribution.skill)
                .or_default()
                .add(contribution.earned, contribution.mass);
        }
    }

    tallies
}

/// Sum the tallies of `skills`, skipping those without measurements.
pub(crate) fn tally_skills<'a>(
    skills: impl IntoIterator<Item = &'a SkillTag>,
    measured: &BTreeMap<SkillTag, Tally>,
) -> Tally {
    let mut total = Tally::default();
    for skill in skills {
        if let Some(tally) = measured.get(skill) {
            total.merge(tally);
        }
    }
    total
}
