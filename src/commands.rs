use crate::dataset;
use crate::plot;
use crate::report::{self, ImagePair, PairReport};
use crate::session::{ChoiceSource, Session, SessionKind, SessionSummary};
use crate::settings::StudySettings;
use crate::similarity;
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::{Path, PathBuf};

pub const ACCURACY_PLOT_NAME: &str = "accuracy_plot.png";
pub const AVERAGES_PLOT_NAME: &str = "averages.png";

/// Seeded when a seed is configured, otherwise from OS entropy
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Runs a two-alternative forced-choice session and renders the accuracy plot.
///
/// A plot that cannot be written is logged; the summary is still returned.
pub fn run_forced_choice<C: ChoiceSource + ?Sized>(
    settings: &StudySettings,
    source: &mut C,
    plot_path: Option<&Path>,
) -> Result<SessionSummary> {
    let categories = dataset::load_categories(&settings.directories)
        .context("Failed to load category directories")?;

    let kind = SessionKind::ForcedChoice {
        judge: settings.judge.build(),
    };
    let mut session = Session::new(kind, categories, make_rng(settings.seed));
    let summary = session.run(source).context("Session aborted")?;

    if let Some(path) = plot_path {
        if let Err(e) = plot::render_accuracy_plot(path, &summary.accuracy_history) {
            tracing::warn!(path = %path.display(), error = %format!("{e:#}"), "accuracy plot not written");
        }
    }
    Ok(summary)
}

/// Runs a parameter-selection session and renders one averages plot per parameter
pub fn run_parameter_selection<C: ChoiceSource + ?Sized>(
    settings: &StudySettings,
    source: &mut C,
    plot_path: Option<&Path>,
) -> Result<SessionSummary> {
    let categories = dataset::load_categories(&settings.directories)
        .context("Failed to load category directories")?;

    anyhow::ensure!(
        settings.selection_candidates >= 1 && settings.parameter_arity >= 1,
        "selection_candidates and parameter_arity must be at least 1"
    );

    let kind = SessionKind::ParameterSelection {
        arity: settings.parameter_arity,
        candidates: settings.selection_candidates,
    };
    let mut session = Session::new(kind, categories, make_rng(settings.seed));
    let summary = session.run(source).context("Session aborted")?;

    if let Some(path) = plot_path {
        if let Err(e) = plot::render_average_plots(path, &summary.average_series) {
            tracing::warn!(path = %path.display(), error = %format!("{e:#}"), "averages plot not written");
        }
    }
    Ok(summary)
}

/// Pairs originals with candidates position by position
pub fn pair_up(originals: &[PathBuf], candidates: &[PathBuf]) -> Result<Vec<ImagePair>> {
    if originals.len() != candidates.len() {
        anyhow::bail!(
            "{} original(s) but {} candidate(s); each original needs exactly one candidate",
            originals.len(),
            candidates.len()
        );
    }
    Ok(originals
        .iter()
        .zip(candidates)
        .map(|(o, c)| ImagePair {
            original: o.clone(),
            candidate: c.clone(),
        })
        .collect())
}

/// Scores image pairs and writes the CSV table and heatmaps
pub fn score_pairs(pairs: &[ImagePair], output_dir: &Path) -> Result<Vec<PairReport>> {
    report::evaluate_pairs(pairs, output_dir)
        .with_context(|| format!("Failed to score pairs into {}", output_dir.display()))
}

/// Compares candidates with each other and with the reference, saving `result_<n>.png` overlays
pub fn compare_images(
    candidates: &[PathBuf],
    reference: &Path,
    output_dir: &Path,
) -> Result<Vec<(PathBuf, String)>> {
    let images = candidates
        .iter()
        .map(|p| {
            image::open(p)
                .map(|img| img.to_rgb8())
                .with_context(|| format!("Failed to load {}", p.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    let reference_img = image::open(reference)
        .with_context(|| format!("Failed to load {}", reference.display()))?
        .to_rgb8();

    let comparisons = similarity::compare_group(&images, &reference_img)?;

    fs::create_dir_all(output_dir)?;
    let mut written = Vec::with_capacity(comparisons.len());
    for (idx, comparison) in comparisons.into_iter().enumerate() {
        let path = output_dir.join(format!("result_{}.png", idx + 1));
        comparison
            .overlay
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push((path, comparison.label));
    }
    Ok(written)
}
