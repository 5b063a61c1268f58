use crate::error::{StudyError, StudyResult};
use crate::identifier::Identifier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of one resolved trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Correct,
    Wrong,
    TooSimilar,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Correct => "correct",
            Self::Wrong => "wrong",
            Self::TooSimilar => "too_similar",
        };
        f.write_str(label)
    }
}

/// Weighted L1 distance from a hand-tuned ideal parameter tuple
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceScheme {
    pub targets: [f64; 3],
    pub weights: [f64; 3],
}

impl DistanceScheme {
    pub const fn new(targets: [f64; 3], weights: [f64; 3]) -> Self {
        Self { targets, weights }
    }

    /// Targets (6, 35, 600), weights (10, 1, 0.1)
    pub const fn primary() -> Self {
        Self::new([6.0, 35.0, 600.0], [10.0, 1.0, 0.1])
    }

    /// Targets (6, 30, 650), unit weights
    pub const fn alternate() -> Self {
        Self::new([6.0, 30.0, 650.0], [1.0, 1.0, 1.0])
    }

    pub fn distance(&self, id: &Identifier) -> StudyResult<f64> {
        let values = id.values();
        if values.len() != self.targets.len() {
            return Err(StudyError::malformed(
                id.name(),
                format!(
                    "distance needs {} numbers, found {}",
                    self.targets.len(),
                    values.len()
                ),
            ));
        }

        Ok(values
            .iter()
            .zip(self.targets.iter().zip(self.weights.iter()))
            .map(|(&v, (&t, &w))| w * (v as f64 - t).abs())
            .sum())
    }
}

/// Named presets selectable from settings and the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SchemePreset {
    #[default]
    Primary,
    Alternate,
}

impl From<SchemePreset> for DistanceScheme {
    fn from(preset: SchemePreset) -> Self {
        match preset {
            SchemePreset::Primary => DistanceScheme::primary(),
            SchemePreset::Alternate => DistanceScheme::alternate(),
        }
    }
}

/// Decides whether a two-way choice picked the candidate closer to the ideal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Judge {
    chosen: DistanceScheme,
    other: DistanceScheme,
}

impl Judge {
    /// Scores both candidates with the same scheme
    pub fn new(scheme: DistanceScheme) -> Self {
        Self {
            chosen: scheme,
            other: scheme,
        }
    }

    /// Scores the chosen and the rejected candidate with different schemes
    pub fn asymmetric(chosen: DistanceScheme, other: DistanceScheme) -> Self {
        Self { chosen, other }
    }

    pub fn judge(&self, chosen: &Identifier, other: &Identifier) -> StudyResult<Outcome> {
        let chosen_distance = self.chosen.distance(chosen)?;
        let other_distance = self.other.distance(other)?;
        tracing::debug!(
            chosen = chosen.name(),
            chosen_distance,
            other = other.name(),
            other_distance,
            "judged trial"
        );
        Ok(decide(chosen_distance, other_distance))
    }
}

impl Default for Judge {
    fn default() -> Self {
        Self::new(DistanceScheme::primary())
    }
}

/// Ties go against the participant.
pub fn decide(chosen_distance: f64, other_distance: f64) -> Outcome {
    if chosen_distance < other_distance {
        Outcome::Correct
    } else {
        Outcome::Wrong
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(stem: &str) -> Identifier {
        Identifier::parse(stem, 3).unwrap()
    }

    #[test]
    fn test_ideal_has_zero_distance() {
        let d = DistanceScheme::primary().distance(&id("6,35,600")).unwrap();
        assert_eq!(d, 0.0);
    }

    #[test]
    fn test_weighted_distance() {
        // 10*|4-6| + |40-35| + 0.1*|500-600| = 20 + 5 + 10
        let d = DistanceScheme::primary().distance(&id("4,40,500")).unwrap();
        assert!((d - 35.0).abs() < 1e-9);

        let d = DistanceScheme::alternate().distance(&id("4,40,500")).unwrap();
        assert!((d - 162.0).abs() < 1e-9);
    }

    #[test]
    fn test_decide() {
        assert_eq!(decide(5.0, 12.0), Outcome::Correct);
        assert_eq!(decide(12.0, 5.0), Outcome::Wrong);
        assert_eq!(decide(5.0, 5.0), Outcome::Wrong);
    }

    #[test]
    fn test_judge_picks_closer_candidate() {
        let judge = Judge::default();
        let near = id("6,35,610");
        let far = id("3,35,600");

        assert_eq!(judge.judge(&near, &far).unwrap(), Outcome::Correct);
        assert_eq!(judge.judge(&far, &near).unwrap(), Outcome::Wrong);
    }

    #[test]
    fn test_asymmetric_judge_uses_both_schemes() {
        let judge = Judge::asymmetric(DistanceScheme::primary(), DistanceScheme::alternate());
        // chosen: 10*1 = 10 under primary; other: 0 under alternate
        let outcome = judge.judge(&id("7,35,600"), &id("6,30,650")).unwrap();
        assert_eq!(outcome, Outcome::Wrong);
        // chosen: 0; other: 1 under alternate
        let outcome = judge.judge(&id("6,35,600"), &id("7,30,650")).unwrap();
        assert_eq!(outcome, Outcome::Correct);
    }

    #[test]
    fn test_wrong_arity_fails() {
        let four = Identifier::parse("1,2,3,4", 4).unwrap();
        let err = Judge::default().judge(&four, &id("6,35,600")).unwrap_err();
        assert!(matches!(err, StudyError::MalformedIdentifier { .. }));
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::TooSimilar.to_string(), "too_similar");
        assert_eq!(
            serde_json::to_string(&Outcome::Correct).unwrap(),
            "\"correct\""
        );
    }
}
