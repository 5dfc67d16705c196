use super::badges::{BadgePredicate, BadgeRule, BadgeType};
use super::domain::{CategoryName, SkillTag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Club-level scoring configuration: outcome policy, skill groupings, level scale and badge rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub outcome: OutcomePolicy,
    #[serde(default)]
    pub categories: Vec<SkillCategory>,
    #[serde(default)]
    pub skill_matrix: Option<SkillMatrix>,
    #[serde(default)]
    pub badges: Vec<BadgeRule>,
}

/// Minimum score required on one skill, or on the overall score when `skill` is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationThreshold {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<SkillTag>,
    pub min_score: f64,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_active() -> bool {
    true
}

impl EvaluationThreshold {
    pub fn overall(min_score: f64) -> Self {
        Self {
            skill: None,
            min_score,
            active: true,
            description: None,
        }
    }

    pub fn for_skill(skill: impl Into<String>, min_score: f64) -> Self {
        Self {
            skill: Some(SkillTag::new(skill)),
            min_score,
            active: true,
            description: None,
        }
    }
}

/// Rules turning aggregated scores into an outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomePolicy {
    #[serde(default)]
    pub thresholds: Vec<EvaluationThreshold>,
    /// Overall score needed to pass when no threshold is active.
    #[serde(default = "default_pass_mark")]
    pub pass_mark: f64,
    /// Keep the outcome pending until the player has completed every exercise.
    #[serde(default)]
    pub require_complete: bool,
}

fn default_pass_mark() -> f64 {
    60.0
}

impl Default for OutcomePolicy {
    fn default() -> Self {
        Self {
            thresholds: Vec::new(),
            pass_mark: default_pass_mark(),
            require_complete: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCategory {
    pub name: CategoryName,
    pub skills: Vec<SkillTag>,
}

impl SkillCategory {
    pub fn new(name: &str, skills: &[&str]) -> Self {
        Self {
            name: CategoryName::new(name),
            skills: skills.iter().map(|skill| SkillTag::new(*skill)).collect(),
        }
    }
}

/// Ordered level scale with the minimum score needed to enter each level above the first.
///
/// `anchors[i]` is the entry score of `levels[i + 1]`. Skills may override the default anchors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatrix {
    pub levels: Vec<String>,
    pub anchors: Vec<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub skill_anchors: BTreeMap<SkillTag, Vec<f64>>,
}

/// Level reached by a skill score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelReached {
    pub index: usize,
    pub label: String,
}

impl SkillMatrix {
    pub fn level_for(&self, skill: &SkillTag, score: f64) -> Option<LevelReached> {
        let anchors = self.skill_anchors.get(skill).unwrap_or(&self.anchors);
        let index = anchors.iter().take_while(|anchor| score >= **anchor).count();
        self.levels.get(index).map(|label| LevelReached {
            index,
            label: label.clone(),
        })
    }

    pub fn level_index(&self, label: &str) -> Option<usize> {
        self.levels
            .iter()
            .position(|level| level.eq_ignore_ascii_case(label))
    }

    fn validate(&self) -> Result<(), ScoringConfigError> {
        if self.levels.len() < 2 {
            return Err(ScoringConfigError::Invalid(
                "skill matrix needs at least two levels".to_string(),
            ));
        }
        check_anchors("default", &self.anchors, self.levels.len())?;
        for (skill, anchors) in &self.skill_anchors {
            check_anchors(skill.as_str(), anchors, self.levels.len())?;
        }
        Ok(())
    }
}

fn check_anchors(owner: &str, anchors: &[f64], levels: usize) -> Result<(), ScoringConfigError> {
    if anchors.len() != levels - 1 {
        return Err(ScoringConfigError::Invalid(format!(
            "{owner} anchors: expected {} values, found {}",
            levels - 1,
            anchors.len()
        )));
    }
    let in_range = anchors.iter().all(|anchor| (0.0..=100.0).contains(anchor));
    let ascending = anchors.windows(2).all(|pair| pair[0] < pair[1]);
    if !in_range || !ascending {
        return Err(ScoringConfigError::Invalid(format!(
            "{owner} anchors must be strictly increasing within 0-100"
        )));
    }
    Ok(())
}

impl ScoringConfig {
    /// Volleyball defaults used when a club has not configured its own rules.
    pub fn standard() -> Self {
        Self {
            outcome: OutcomePolicy::default(),
            categories: vec![
                SkillCategory::new("Physical", &["Power", "Agility", "Endurance", "Vertical"]),
                SkillCategory::new(
                    "Technical",
                    &[
                        "Serving", "Passing", "Setting", "Attacking", "Blocking", "Digging",
                        "Control",
                    ],
                ),
                SkillCategory::new("Mental", &["Communication", "Focus", "Coachability"]),
            ],
            skill_matrix: Some(SkillMatrix {
                levels: vec![
                    "Foundation".to_string(),
                    "Developing".to_string(),
                    "Competent".to_string(),
                    "Advanced".to_string(),
                    "Elite".to_string(),
                ],
                anchors: vec![20.0, 40.0, 60.0, 80.0],
                skill_anchors: BTreeMap::new(),
            }),
            badges: vec![
                BadgeRule::new(BadgeType::Effort, BadgePredicate::FirstEvaluationCompleted),
                BadgeRule::new(BadgeType::Star, BadgePredicate::OverallAtLeast(90.0)),
                BadgeRule::new(BadgeType::Skill, BadgePredicate::AnySkillAtLeast(85.0)),
                BadgeRule::new(
                    BadgeType::Breakthrough,
                    BadgePredicate::LevelReached("Advanced".to_string()),
                ),
                BadgeRule::new(BadgeType::Improvement, BadgePredicate::ImprovedBy(10.0)),
                BadgeRule::new(
                    BadgeType::Consistency,
                    BadgePredicate::ConsistentlyAbove {
                        min: 70.0,
                        evaluations: 3,
                    },
                ),
                BadgeRule::new(
                    BadgeType::Leadership,
                    BadgePredicate::CategoryAtLeast {
                        category: CategoryName::new("Mental"),
                        min: 80.0,
                    },
                ),
                BadgeRule::new(
                    BadgeType::Teamwork,
                    BadgePredicate::SkillAtLeast {
                        skill: SkillTag::new("Communication"),
                        min: 80.0,
                    },
                ),
            ],
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ScoringConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ScoringConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ScoringConfigError> {
        for threshold in &self.outcome.thresholds {
            if !(0.0..=100.0).contains(&threshold.min_score) {
                return Err(ScoringConfigError::Invalid(format!(
                    "threshold min_score {} must be within 0-100",
                    threshold.min_score
                )));
            }
        }
        if !(0.0..=100.0).contains(&self.outcome.pass_mark) {
            return Err(ScoringConfigError::Invalid(format!(
                "pass_mark {} must be within 0-100",
                self.outcome.pass_mark
            )));
        }
        if let Some(matrix) = &self.skill_matrix {
            matrix.validate()?;
        }
        Ok(())
    }

    /// Skills belonging to `category`, empty when the category is unknown.
    pub fn skills_in(&self, category: &CategoryName) -> &[SkillTag] {
        self.categories
            .iter()
            .find(|entry| &entry.name == category)
            .map(|entry| entry.skills.as_slice())
            .unwrap_or(&[])
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Problems loading or validating a [`ScoringConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ScoringConfigError {
    #[error("unable to read scoring config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid scoring config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid scoring config: {0}")]
    Invalid(String),
}
