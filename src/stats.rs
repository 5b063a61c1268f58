//! Append-only running statistics for an experiment session.
//!
//! Two ledgers exist, one per session kind:
//! - [`OutcomeTally`] counts judged outcomes and keeps an accuracy history
//! - [`ParameterAverages`] keeps running means of the selected candidates' parameters
//!
//! Nothing is ever retracted. Each `record` appends exactly one history entry.

use crate::error::{StudyError, StudyResult};
use crate::judge::Outcome;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Point-in-time view of an [`OutcomeTally`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TallySnapshot {
    pub correct: usize,
    pub wrong: usize,
    pub too_similar: usize,
    /// Percentage in [0, 100]
    pub accuracy: f64,
}

impl TallySnapshot {
    pub fn total(&self) -> usize {
        self.correct + self.wrong + self.too_similar
    }
}

/// Accuracy reads `N/A` until a trial has been judged correct or wrong
impl fmt::Display for TallySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Correct: {} | Wrong: {} | Too Similar: {} | Accuracy: ",
            self.correct, self.wrong, self.too_similar
        )?;
        if self.correct + self.wrong == 0 {
            write!(f, "N/A")
        } else {
            write!(f, "{:.2}%", self.accuracy)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutcomeTally {
    correct: usize,
    wrong: usize,
    too_similar: usize,
    accuracy_history: Vec<f64>,
}

impl OutcomeTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Correct => self.correct += 1,
            Outcome::Wrong => self.wrong += 1,
            Outcome::TooSimilar => self.too_similar += 1,
        }
        self.accuracy_history.push(self.accuracy());
    }

    /// Correct share of judged trials; too-similar trials are not judged.
    pub fn accuracy(&self) -> f64 {
        let judged = self.correct + self.wrong;
        if judged == 0 {
            return 0.0;
        }
        self.correct as f64 / judged as f64 * 100.0
    }

    pub fn history(&self) -> &[f64] {
        &self.accuracy_history
    }

    pub fn snapshot(&self) -> TallySnapshot {
        TallySnapshot {
            correct: self.correct,
            wrong: self.wrong,
            too_similar: self.too_similar,
            accuracy: self.accuracy(),
        }
    }
}

/// Point-in-time view of a [`ParameterAverages`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AveragesSnapshot {
    pub selections: usize,
    pub averages: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterAverages {
    arity: usize,
    sums: Vec<i64>,
    selections: Vec<Vec<i64>>,
    history: Vec<Vec<f64>>,
}

impl ParameterAverages {
    pub fn new(arity: usize) -> Self {
        Self {
            arity,
            sums: vec![0; arity],
            selections: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn record(&mut self, values: &[i64]) -> StudyResult<()> {
        if values.len() != self.arity {
            return Err(StudyError::malformed(
                format!("{:?}", values),
                format!("expected {} numbers, found {}", self.arity, values.len()),
            ));
        }

        for (sum, &v) in self.sums.iter_mut().zip(values) {
            *sum += v;
        }
        self.selections.push(values.to_vec());
        self.history.push(self.averages());
        Ok(())
    }

    /// Zeros until the first selection
    pub fn averages(&self) -> Vec<f64> {
        let count = self.selections.len();
        if count == 0 {
            return vec![0.0; self.arity];
        }
        self.sums.iter().map(|&s| s as f64 / count as f64).collect()
    }

    pub fn history(&self) -> &[Vec<f64>] {
        &self.history
    }

    /// One series per parameter, in selection order
    pub fn series(&self) -> Vec<Vec<f64>> {
        (0..self.arity)
            .map(|i| self.history.iter().map(|row| row[i]).collect())
            .collect()
    }

    pub fn snapshot(&self) -> AveragesSnapshot {
        AveragesSnapshot {
            selections: self.selections.len(),
            averages: self.averages(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_display_without_judged_trials() {
        let mut tally = OutcomeTally::new();
        assert_eq!(
            tally.snapshot().to_string(),
            "Correct: 0 | Wrong: 0 | Too Similar: 0 | Accuracy: N/A"
        );

        tally.record(Outcome::TooSimilar);
        assert_eq!(
            tally.snapshot().to_string(),
            "Correct: 0 | Wrong: 0 | Too Similar: 1 | Accuracy: N/A"
        );

        tally.record(Outcome::Correct);
        tally.record(Outcome::Wrong);
        tally.record(Outcome::Correct);
        assert_eq!(
            tally.snapshot().to_string(),
            "Correct: 2 | Wrong: 1 | Too Similar: 1 | Accuracy: 66.67%"
        );
    }

    #[test]
    fn test_tally_counts_sum_to_trials() {
        let mut tally = OutcomeTally::new();
        let outcomes = [
            Outcome::Correct,
            Outcome::Wrong,
            Outcome::TooSimilar,
            Outcome::Correct,
            Outcome::Correct,
        ];
        for (n, outcome) in outcomes.iter().enumerate() {
            tally.record(*outcome);
            assert_eq!(tally.snapshot().total(), n + 1);
            assert_eq!(tally.history().len(), n + 1);
        }

        let snap = tally.snapshot();
        assert_eq!((snap.correct, snap.wrong, snap.too_similar), (3, 1, 1));
        assert!((snap.accuracy - 75.0).abs() < 1e-9);
        assert!(tally.history().iter().all(|a| (0.0..=100.0).contains(a)));
    }

    #[test]
    fn test_too_similar_first_keeps_zero_accuracy() {
        let mut tally = OutcomeTally::new();
        tally.record(Outcome::TooSimilar);
        assert_eq!(tally.history(), &[0.0]);
        tally.record(Outcome::Correct);
        assert_eq!(tally.history(), &[0.0, 100.0]);
    }

    #[test]
    fn test_running_averages() {
        let mut avg = ParameterAverages::new(3);
        assert_eq!(avg.averages(), vec![0.0, 0.0, 0.0]);

        avg.record(&[6, 30, 600]).unwrap();
        avg.record(&[4, 40, 500]).unwrap();

        assert_eq!(avg.averages(), vec![5.0, 35.0, 550.0]);
        assert_eq!(avg.history().len(), 2);
        assert_eq!(avg.history()[0], vec![6.0, 30.0, 600.0]);
        assert_eq!(avg.series()[1], vec![30.0, 35.0]);
        assert_eq!(avg.snapshot().selections, 2);
    }

    #[test]
    fn test_wrong_arity_leaves_ledger_untouched() {
        let mut avg = ParameterAverages::new(4);
        avg.record(&[1, 2, 3, 4]).unwrap();
        assert!(avg.record(&[1, 2, 3]).is_err());
        assert_eq!(avg.snapshot().selections, 1);
        assert_eq!(avg.history().len(), 1);
    }
}
