//! # Interactive experiment sessions
//!
//! A session repeatedly draws a trial, asks a [`ChoiceSource`] for the
//! participant's action, and folds the result into its running statistics:
//!
//! ```text
//! Idle -> Presenting -> AwaitingChoice -> Resolved -> Presenting -> ...
//!                                      \-> Finished (on quit)
//! ```
//!
//! Per-trial failures (a candidate name that does not decode, a selection
//! outside the presented slots) discard that trial and move on. Failures that
//! mean the session is misconfigured (an empty pool, unreadable files) end it.

use crate::dataset::Category;
use crate::error::{StudyError, StudyResult};
use crate::identifier::Identifier;
use crate::judge::{Judge, Outcome};
use crate::sampler::{self, TrialPlan};
use crate::stats::{AveragesSnapshot, OutcomeTally, ParameterAverages, TallySnapshot};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Forced-choice trials always show two candidates
pub const FORCED_CHOICE_CANDIDATES: usize = 2;

/// Integers encoded in forced-choice candidate names
pub const FORCED_CHOICE_ARITY: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Idle,
    Presenting,
    AwaitingChoice,
    Resolved,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionKind {
    /// Two candidates, judged against the ideal; the participant may call them too similar
    ForcedChoice { judge: Judge },
    /// Several candidates, the chosen one's parameters feed running averages
    ParameterSelection { arity: usize, candidates: usize },
}

impl SessionKind {
    fn candidates(&self) -> usize {
        match self {
            Self::ForcedChoice { .. } => FORCED_CHOICE_CANDIDATES,
            Self::ParameterSelection { candidates, .. } => *candidates,
        }
    }

    fn allows_too_similar(&self) -> bool {
        matches!(self, Self::ForcedChoice { .. })
    }
}

/// What the participant did with a presented trial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Zero-based index into the presented candidates
    Select(usize),
    TooSimilar,
    Quit,
}

/// Context shown alongside a trial
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub status: String,
    pub allow_too_similar: bool,
}

/// Supplies the participant's action for each trial
pub trait ChoiceSource {
    fn choose(&mut self, plan: &TrialPlan, prompt: &Prompt) -> StudyResult<Action>;
}

impl<F> ChoiceSource for F
where
    F: FnMut(&TrialPlan, &Prompt) -> StudyResult<Action>,
{
    fn choose(&mut self, plan: &TrialPlan, prompt: &Prompt) -> StudyResult<Action> {
        self(plan, prompt)
    }
}

/// How a recorded trial ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialOutcome {
    Judged(Outcome),
    Selected(Vec<i64>),
}

/// A presented trial and its resolution; never modified once recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub category: String,
    pub reference: PathBuf,
    pub candidates: Vec<PathBuf>,
    pub chosen: Option<usize>,
    pub outcome: TrialOutcome,
}

/// Final state of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub trials: usize,
    pub discarded: usize,
    pub tally: Option<TallySnapshot>,
    pub accuracy_history: Vec<f64>,
    pub averages: Option<AveragesSnapshot>,
    pub average_series: Vec<Vec<f64>>,
}

pub struct Session {
    kind: SessionKind,
    categories: Vec<Category>,
    rng: StdRng,
    phase: SessionPhase,
    current: Option<TrialPlan>,
    ledger: Vec<Trial>,
    tally: OutcomeTally,
    averages: ParameterAverages,
    discarded: usize,
}

impl Session {
    pub fn new(kind: SessionKind, categories: Vec<Category>, rng: StdRng) -> Self {
        let arity = match kind {
            SessionKind::ForcedChoice { .. } => FORCED_CHOICE_ARITY,
            SessionKind::ParameterSelection { arity, .. } => arity,
        };
        Self {
            kind,
            categories,
            rng,
            phase: SessionPhase::Idle,
            current: None,
            ledger: Vec::new(),
            tally: OutcomeTally::new(),
            averages: ParameterAverages::new(arity),
            discarded: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn trials(&self) -> &[Trial] {
        &self.ledger
    }

    pub fn tally(&self) -> &OutcomeTally {
        &self.tally
    }

    pub fn averages(&self) -> &ParameterAverages {
        &self.averages
    }

    /// Draws the next trial and waits for a choice
    pub fn present(&mut self) -> StudyResult<TrialPlan> {
        self.phase = SessionPhase::Presenting;
        let plan = sampler::draw_trial(&self.categories, self.kind.candidates(), &mut self.rng)?;
        tracing::debug!(
            category = %plan.category,
            candidates = plan.candidates.len(),
            "presenting trial"
        );

        self.current = Some(plan.clone());
        self.phase = SessionPhase::AwaitingChoice;
        Ok(plan)
    }

    /// Applies `action` to the trial being shown.
    ///
    /// Returns the recorded trial, or `None` once the participant quits.
    /// On a trial-local error the trial is dropped and nothing is recorded.
    pub fn resolve(&mut self, action: Action) -> StudyResult<Option<&Trial>> {
        let Some(plan) = self.current.take() else {
            return Err(StudyError::UnsupportedAction {
                action: "resolve without a presented trial".to_string(),
            });
        };

        if action == Action::Quit {
            self.phase = SessionPhase::Finished;
            return Ok(None);
        }
        self.phase = SessionPhase::Resolved;

        let (chosen, outcome) = match self.evaluate(&plan, action) {
            Ok(resolved) => resolved,
            Err(e) => {
                if e.is_trial_local() {
                    self.discarded += 1;
                }
                return Err(e);
            }
        };

        match &outcome {
            TrialOutcome::Judged(o) => self.tally.record(*o),
            TrialOutcome::Selected(values) => self.averages.record(values)?,
        }

        self.ledger.push(Trial {
            category: plan.category,
            reference: plan.reference,
            candidates: plan.candidates,
            chosen,
            outcome,
        });
        tracing::info!(status = %self.status_line(), "trial recorded");
        Ok(self.ledger.last())
    }

    fn evaluate(
        &self,
        plan: &TrialPlan,
        action: Action,
    ) -> StudyResult<(Option<usize>, TrialOutcome)> {
        match (action, &self.kind) {
            (Action::TooSimilar, SessionKind::ForcedChoice { .. }) => {
                Ok((None, TrialOutcome::Judged(Outcome::TooSimilar)))
            }
            (Action::TooSimilar, _) => Err(StudyError::UnsupportedAction {
                action: "too similar".to_string(),
            }),
            (Action::Select(index), kind) => {
                let presented = plan.candidates.len();
                if index >= presented {
                    return Err(StudyError::InvalidSelection { index, presented });
                }

                match kind {
                    SessionKind::ForcedChoice { judge } => {
                        let chosen =
                            Identifier::from_path(&plan.candidates[index], FORCED_CHOICE_ARITY)?;
                        let other_path = &plan.candidates[if index == 0 { 1 } else { 0 }];
                        let other = Identifier::from_path(other_path, FORCED_CHOICE_ARITY)?;
                        let outcome = judge.judge(&chosen, &other)?;
                        Ok((Some(index), TrialOutcome::Judged(outcome)))
                    }
                    SessionKind::ParameterSelection { arity, .. } => {
                        let id = Identifier::from_path(&plan.candidates[index], *arity)?;
                        Ok((Some(index), TrialOutcome::Selected(id.values().to_vec())))
                    }
                }
            }
            (Action::Quit, _) => Err(StudyError::UnsupportedAction {
                action: "quit".to_string(),
            }),
        }
    }

    /// One-line summary of the running statistics
    pub fn status_line(&self) -> String {
        match self.kind {
            SessionKind::ForcedChoice { .. } => self.tally.snapshot().to_string(),
            SessionKind::ParameterSelection { .. } => {
                if self.averages.snapshot().selections == 0 {
                    return "Averages: N/A".to_string();
                }
                let parts: Vec<String> = self
                    .averages
                    .averages()
                    .iter()
                    .map(|v| format!("{:.2}", v))
                    .collect();
                format!("Averages: [{}]", parts.join(", "))
            }
        }
    }

    fn prompt(&self) -> Prompt {
        Prompt {
            status: self.status_line(),
            allow_too_similar: self.kind.allows_too_similar(),
        }
    }

    /// Runs trials until the source quits.
    pub fn run<C: ChoiceSource + ?Sized>(&mut self, source: &mut C) -> StudyResult<SessionSummary> {
        while self.phase != SessionPhase::Finished {
            let plan = self.present()?;
            let action = source.choose(&plan, &self.prompt())?;

            match self.resolve(action) {
                Ok(_) => {}
                Err(e) if e.is_trial_local() => {
                    tracing::warn!(error = %e, "trial discarded");
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            trials = self.ledger.len(),
            discarded = self.discarded,
            "session finished"
        );
        Ok(self.summary())
    }

    pub fn summary(&self) -> SessionSummary {
        let (tally, averages) = match self.kind {
            SessionKind::ForcedChoice { .. } => (Some(self.tally.snapshot()), None),
            SessionKind::ParameterSelection { .. } => (None, Some(self.averages.snapshot())),
        };
        SessionSummary {
            trials: self.ledger.len(),
            discarded: self.discarded,
            tally,
            accuracy_history: self.tally.history().to_vec(),
            averages,
            average_series: self.averages.series(),
        }
    }
}

/// Line-oriented chooser for a terminal.
///
/// Accepts `1..=k` to pick a candidate, `s` for too similar and `q` to quit.
/// Unrecognised input asks again; end of input quits.
pub struct TerminalChooser<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalChooser<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn parse(line: &str, presented: usize, allow_too_similar: bool) -> Option<Action> {
        match line.trim().to_ascii_lowercase().as_str() {
            "q" | "quit" => Some(Action::Quit),
            "s" | "similar" if allow_too_similar => Some(Action::TooSimilar),
            other => other
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=presented).contains(n))
                .map(|n| Action::Select(n - 1)),
        }
    }
}

impl<R: BufRead, W: Write> ChoiceSource for TerminalChooser<R, W> {
    fn choose(&mut self, plan: &TrialPlan, prompt: &Prompt) -> StudyResult<Action> {
        writeln!(self.output)?;
        writeln!(self.output, "{}", prompt.status)?;
        writeln!(self.output, "Reference ({}): {}", plan.category, plan.reference.display())?;
        writeln!(self.output, "Which of the following images looks most similar to the reference?")?;
        for (i, candidate) in plan.candidates.iter().enumerate() {
            writeln!(self.output, "  [{}] {}", i + 1, candidate.display())?;
        }

        let hint = if prompt.allow_too_similar {
            format!("1-{} to choose, s = too similar, q = quit", plan.candidates.len())
        } else {
            format!("1-{} to choose, q = quit", plan.candidates.len())
        };

        loop {
            write!(self.output, "{}> ", hint)?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(Action::Quit);
            }
            if let Some(action) = Self::parse(&line, plan.candidates.len(), prompt.allow_too_similar) {
                return Ok(action);
            }
            writeln!(self.output, "Unrecognised choice: {}", line.trim())?;
        }
    }
}
