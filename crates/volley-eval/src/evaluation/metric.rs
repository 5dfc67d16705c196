use super::domain::{DefinitionError, MetricId, SkillTag};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Input semantic of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Checkbox,
    Slider,
    Number,
    Ratio,
}

impl MetricKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Checkbox => "Checkbox",
            Self::Slider => "Slider",
            Self::Number => "Number",
            Self::Ratio => "Ratio",
        }
    }
}

/// Per-type parameters, resolved when the definition is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricConfig {
    Checkbox {
        #[serde(default = "default_pass_label")]
        pass_label: String,
        #[serde(default = "default_fail_label")]
        fail_label: String,
    },
    Slider {
        #[serde(default = "default_step")]
        step: u32,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit_label: Option<String>,
    },
    Ratio {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        denominator_label: Option<String>,
    },
}

fn default_pass_label() -> String {
    "Pass".to_string()
}

fn default_fail_label() -> String {
    "Fail".to_string()
}

fn default_step() -> u32 {
    1
}

impl MetricConfig {
    pub fn checkbox() -> Self {
        Self::Checkbox {
            pass_label: default_pass_label(),
            fail_label: default_fail_label(),
        }
    }

    pub fn slider() -> Self {
        Self::Slider { step: 1 }
    }

    pub fn number() -> Self {
        Self::Number { unit_label: None }
    }

    pub fn ratio() -> Self {
        Self::Ratio {
            denominator_label: None,
        }
    }

    pub const fn kind(&self) -> MetricKind {
        match self {
            Self::Checkbox { .. } => MetricKind::Checkbox,
            Self::Slider { .. } => MetricKind::Slider,
            Self::Number { .. } => MetricKind::Number,
            Self::Ratio { .. } => MetricKind::Ratio,
        }
    }
}

/// Share of a metric's score attributed to one skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillWeight {
    pub skill: SkillTag,
    pub percentage: u8,
}

impl SkillWeight {
    pub fn new(skill: impl Into<String>, percentage: u8) -> Self {
        Self {
            skill: SkillTag::new(skill),
            percentage,
        }
    }
}

/// A single measurable unit within an exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MetricDefinition")]
pub struct Metric {
    id: MetricId,
    name: String,
    max_points: u32,
    config: MetricConfig,
    skill_weights: Vec<SkillWeight>,
}

#[derive(Debug, Deserialize)]
struct MetricDefinition {
    id: MetricId,
    name: String,
    max_points: u32,
    config: MetricConfig,
    #[serde(default)]
    skill_weights: Vec<SkillWeight>,
}

impl TryFrom<MetricDefinition> for Metric {
    type Error = DefinitionError;

    fn try_from(value: MetricDefinition) -> Result<Self, Self::Error> {
        Metric::new(
            value.id,
            value.name,
            value.max_points,
            value.config,
            value.skill_weights,
        )
    }
}

impl Metric {
    pub fn new(
        id: impl Into<MetricId>,
        name: impl Into<String>,
        max_points: u32,
        config: MetricConfig,
        skill_weights: Vec<SkillWeight>,
    ) -> Result<Self, DefinitionError> {
        let id = id.into();
        if max_points == 0 {
            return Err(DefinitionError::NonPositiveMaxPoints { metric: id });
        }
        if let MetricConfig::Slider { step: 0 } = config {
            return Err(DefinitionError::NonPositiveStep { metric: id });
        }
        validate_weights(&id, &skill_weights)?;

        Ok(Self {
            id,
            name: name.into(),
            max_points,
            config,
            skill_weights,
        })
    }

    pub fn id(&self) -> &MetricId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_points(&self) -> u32 {
        self.max_points
    }

    pub fn config(&self) -> &MetricConfig {
        &self.config
    }

    pub fn kind(&self) -> MetricKind {
        self.config.kind()
    }

    pub fn skill_weights(&self) -> &[SkillWeight] {
        &self.skill_weights
    }

    /// Normalize a raw input against this metric's type and range.
    pub fn normalize(&self, raw: RawInput) -> f64 {
        normalize(self.kind(), self.max_points, raw)
    }
}

fn validate_weights(metric: &MetricId, weights: &[SkillWeight]) -> Result<(), DefinitionError> {
    if weights.is_empty() {
        return Ok(());
    }

    let mut seen = HashSet::new();
    for weight in weights {
        if !seen.insert(&weight.skill) {
            return Err(DefinitionError::DuplicateSkillWeight {
                metric: metric.clone(),
                skill: weight.skill.clone(),
            });
        }
    }

    let total: u32 = weights.iter().map(|weight| u32::from(weight.percentage)).sum();
    if total != 100 {
        return Err(DefinitionError::WeightsDoNotSumTo100 {
            metric: metric.clone(),
            total,
        });
    }

    Ok(())
}

/// Raw value captured by the scoring UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInput {
    Flag(bool),
    Count(i64),
}

impl RawInput {
    /// Boundary check for wire values before they reach the normalizer.
    ///
    /// Checkbox metrics accept `0` or `1`; the other types accept any whole number
    /// (out-of-range counts are clamped later, never rejected).
    pub fn parse(metric: &Metric, value: f64) -> Result<Self, InputError> {
        if !value.is_finite() {
            return Err(InputError::NotFinite {
                metric: metric.id.clone(),
            });
        }
        if value.fract() != 0.0 {
            return Err(InputError::NotWhole {
                metric: metric.id.clone(),
                value,
            });
        }

        match metric.kind() {
            MetricKind::Checkbox if value == 0.0 => Ok(Self::Flag(false)),
            MetricKind::Checkbox if value == 1.0 => Ok(Self::Flag(true)),
            MetricKind::Checkbox => Err(InputError::NotAFlag {
                metric: metric.id.clone(),
                value,
            }),
            MetricKind::Slider | MetricKind::Number | MetricKind::Ratio => {
                // saturating float-to-int cast, the normalizer clamps the rest
                let count = value as i64;
                if let MetricConfig::Slider { step } = metric.config {
                    let inside = count > 0 && count < i64::from(metric.max_points);
                    if inside && count % i64::from(step) != 0 {
                        return Err(InputError::OffStep {
                            metric: metric.id.clone(),
                            value,
                            step,
                        });
                    }
                }
                Ok(Self::Count(count))
            }
        }
    }
}

/// Rejection raised at the input boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("value for metric '{metric}' is not a finite number")]
    NotFinite { metric: MetricId },
    #[error("metric '{metric}' expects a whole number, got {value}")]
    NotWhole { metric: MetricId, value: f64 },
    #[error("checkbox metric '{metric}' expects 0 or 1, got {value}")]
    NotAFlag { metric: MetricId, value: f64 },
    #[error("slider metric '{metric}' moves in steps of {step}, got {value}")]
    OffStep { metric: MetricId, value: f64, step: u32 },
}

/// Convert a raw input into a score in `[0, max_points]`. Never fails, only clamps.
pub fn normalize(kind: MetricKind, max_points: u32, raw: RawInput) -> f64 {
    let max = f64::from(max_points);
    match (kind, raw) {
        (_, RawInput::Flag(true)) => max,
        (_, RawInput::Flag(false)) => 0.0,
        (MetricKind::Checkbox, RawInput::Count(count)) => {
            if count > 0 {
                max
            } else {
                0.0
            }
        }
        (MetricKind::Slider | MetricKind::Number | MetricKind::Ratio, RawInput::Count(count)) => {
            f64::from(clamp_count(count, max_points))
        }
    }
}

/// Apply one stepper increment/decrement, clamped to `[0, max_points]`.
pub fn step(current: u32, delta: i64, max_points: u32) -> u32 {
    clamp_count(i64::from(current).saturating_add(delta), max_points)
}

fn clamp_count(count: i64, max_points: u32) -> u32 {
    count.clamp(0, i64::from(max_points)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(config: MetricConfig, max_points: u32) -> Metric {
        Metric::new("m", "Metric", max_points, config, vec![]).expect("valid metric")
    }

    #[test]
    fn checkbox_maps_flag_to_full_or_zero() {
        assert_eq!(normalize(MetricKind::Checkbox, 3, RawInput::Flag(true)), 3.0);
        assert_eq!(normalize(MetricKind::Checkbox, 3, RawInput::Flag(false)), 0.0);
    }

    #[test]
    fn numeric_types_clamp_out_of_range_counts() {
        for kind in [MetricKind::Slider, MetricKind::Number, MetricKind::Ratio] {
            assert_eq!(normalize(kind, 10, RawInput::Count(-4)), 0.0);
            assert_eq!(normalize(kind, 10, RawInput::Count(7)), 7.0);
            assert_eq!(normalize(kind, 10, RawInput::Count(42)), 10.0);
        }
    }

    #[test]
    fn stepper_never_leaves_range() {
        assert_eq!(step(0, -1, 5), 0);
        assert_eq!(step(4, 1, 5), 5);
        assert_eq!(step(5, 1, 5), 5);
        assert_eq!(step(3, -1, 5), 2);
    }

    #[test]
    fn parse_rejects_out_of_type_values() {
        let checkbox = metric(MetricConfig::checkbox(), 1);
        assert_eq!(RawInput::parse(&checkbox, 1.0), Ok(RawInput::Flag(true)));
        assert!(matches!(
            RawInput::parse(&checkbox, 2.0),
            Err(InputError::NotAFlag { .. })
        ));

        let slider = metric(MetricConfig::slider(), 10);
        assert!(matches!(
            RawInput::parse(&slider, 2.5),
            Err(InputError::NotWhole { .. })
        ));
        assert!(matches!(
            RawInput::parse(&slider, f64::NAN),
            Err(InputError::NotFinite { .. })
        ));
        assert_eq!(RawInput::parse(&slider, 15.0), Ok(RawInput::Count(15)));
    }

    #[test]
    fn slider_values_follow_the_configured_step() {
        let slider = metric(MetricConfig::Slider { step: 5 }, 12);

        assert_eq!(RawInput::parse(&slider, 10.0), Ok(RawInput::Count(10)));
        assert_eq!(RawInput::parse(&slider, 0.0), Ok(RawInput::Count(0)));
        assert_eq!(RawInput::parse(&slider, 12.0), Ok(RawInput::Count(12)));
        assert_eq!(RawInput::parse(&slider, 20.0), Ok(RawInput::Count(20)));
        match RawInput::parse(&slider, 3.0) {
            Err(InputError::OffStep { value, step, .. }) => {
                assert_eq!(value, 3.0);
                assert_eq!(step, 5);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let counter = metric(MetricConfig::number(), 12);
        assert_eq!(RawInput::parse(&counter, 3.0), Ok(RawInput::Count(3)));
    }

    #[test]
    fn weights_must_sum_to_one_hundred() {
        let err = Metric::new(
            "serve",
            "Serve accuracy",
            10,
            MetricConfig::slider(),
            vec![SkillWeight::new("Serving", 60), SkillWeight::new("Power", 30)],
        )
        .expect_err("weights sum to 90");
        assert_eq!(
            err,
            DefinitionError::WeightsDoNotSumTo100 {
                metric: MetricId::new("serve"),
                total: 90
            }
        );
    }

    #[test]
    fn duplicate_skill_weights_are_rejected() {
        let err = Metric::new(
            "serve",
            "Serve accuracy",
            10,
            MetricConfig::slider(),
            vec![SkillWeight::new("Serving", 50), SkillWeight::new("Serving", 50)],
        )
        .expect_err("duplicate skill");
        assert!(matches!(err, DefinitionError::DuplicateSkillWeight { .. }));
    }

    #[test]
    fn deserializing_runs_validation() {
        let json = r#"{
            "id": "pass",
            "name": "Pass to target",
            "max_points": 0,
            "config": { "type": "checkbox" }
        }"#;
        let err = serde_json::from_str::<Metric>(json).expect_err("zero max points");
        assert!(err.to_string().contains("positive max_points"));

        let json = r#"{
            "id": "pass",
            "name": "Pass to target",
            "max_points": 5,
            "config": { "type": "ratio", "denominator_label": "attempts" },
            "skill_weights": [{ "skill": "Passing", "percentage": 100 }]
        }"#;
        let metric: Metric = serde_json::from_str(json).expect("valid metric json");
        assert_eq!(metric.kind(), MetricKind::Ratio);
        assert_eq!(metric.skill_weights().len(), 1);
    }
}
