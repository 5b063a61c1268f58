//! Command line surface for running studies and scoring images.
//!
//! ```bash
//! metamer-study forced-choice --dir Dataset/bigben-1080 --dir Dataset/Einstein-1080
//! metamer-study select --dir Dataset/bigben --arity 3
//! metamer-study metrics --original bigben.jpg --candidate bigben_metamer.png -o results
//! metamer-study compare 1.png 2.png 3.png --reference groundtruth.png
//! ```

use crate::judge::SchemePreset;
use crate::settings::StudySettings;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "metamer-study", version, about = "Perceptual studies and image quality metrics for metamer images")]
pub struct Cli {
    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true, env = "METAMER_STUDY_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Two candidates per trial; pick the one closer to the reference or mark them too similar
    ForcedChoice(ForcedChoiceArgs),
    /// Several candidates per trial; track running averages of the chosen parameters
    Select(SelectArgs),
    /// Score generated images against their originals (PSNR, SSIM, VIF)
    Metrics(MetricsArgs),
    /// Histogram similarity and difference overlays between candidates and a reference
    Compare(CompareArgs),
    /// Print the settings file location and contents
    Settings,
}

#[derive(Debug, Clone, Args)]
pub struct SessionArgs {
    /// Category directory; repeat for several (overrides settings)
    #[arg(long = "dir")]
    pub dirs: Vec<PathBuf>,

    /// Seed for reproducible trial order
    #[arg(long)]
    pub seed: Option<u64>,

    /// Summary plot path (defaults to the output directory)
    #[arg(long)]
    pub plot: Option<PathBuf>,

    /// Skip the summary plot
    #[arg(long, conflicts_with = "plot")]
    pub no_plot: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ForcedChoiceArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Distance scheme for the chosen candidate
    #[arg(long, value_enum)]
    pub chosen_scheme: Option<SchemePreset>,

    /// Distance scheme for the rejected candidate
    #[arg(long, value_enum)]
    pub other_scheme: Option<SchemePreset>,
}

#[derive(Debug, Clone, Args)]
pub struct SelectArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Candidates shown per trial
    #[arg(long, value_parser = parse_positive)]
    pub candidates: Option<usize>,

    /// Integers encoded in each candidate name
    #[arg(long, value_parser = parse_positive)]
    pub arity: Option<usize>,
}

#[derive(Debug, Clone, Args)]
pub struct MetricsArgs {
    /// Original image; repeat, paired in order with --candidate
    #[arg(long = "original", required = true)]
    pub originals: Vec<PathBuf>,

    /// Generated image scored against the original at the same position
    #[arg(long = "candidate", required = true)]
    pub candidates: Vec<PathBuf>,

    /// Output directory (defaults to the settings output directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct CompareArgs {
    /// Candidate images
    #[arg(required = true)]
    pub candidates: Vec<PathBuf>,

    /// Reference image
    #[arg(long)]
    pub reference: PathBuf,

    /// Output directory (defaults to the settings output directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

fn parse_positive(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

impl SessionArgs {
    pub fn apply(&self, settings: &mut StudySettings) {
        if !self.dirs.is_empty() {
            settings.directories = self.dirs.clone();
        }
        if self.seed.is_some() {
            settings.seed = self.seed;
        }
    }

    pub fn plot_path(&self, settings: &StudySettings, default_name: &str) -> Option<PathBuf> {
        if self.no_plot {
            return None;
        }
        Some(
            self.plot
                .clone()
                .unwrap_or_else(|| settings.output_dir.join(default_name)),
        )
    }
}

impl ForcedChoiceArgs {
    pub fn apply(&self, settings: &mut StudySettings) {
        self.session.apply(settings);
        if let Some(chosen) = self.chosen_scheme {
            settings.judge.chosen = chosen;
        }
        if let Some(other) = self.other_scheme {
            settings.judge.other = other;
        }
    }
}

impl SelectArgs {
    pub fn apply(&self, settings: &mut StudySettings) {
        self.session.apply(settings);
        if let Some(candidates) = self.candidates {
            settings.selection_candidates = candidates;
        }
        if let Some(arity) = self.arity {
            settings.parameter_arity = arity;
        }
    }
}
