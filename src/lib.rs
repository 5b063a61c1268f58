pub mod cli;
pub mod commands;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod heatmap;
pub mod identifier;
pub mod judge;
pub mod metrics;
pub mod plot;
pub mod report;
pub mod sampler;
pub mod session;
pub mod settings;
pub mod similarity;
pub mod stats;

pub use error::{StudyError, StudyResult};
pub use identifier::Identifier;
pub use judge::{DistanceScheme, Judge, Outcome, SchemePreset};
pub use metrics::{PairEvaluation, QualityScores};
pub use session::{Action, ChoiceSource, Session, SessionKind, SessionSummary, TerminalChooser};
pub use settings::StudySettings;
pub use stats::{OutcomeTally, ParameterAverages};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::io;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // Logs go to stderr so the prompt on stdout stays readable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn print_summary(summary: &SessionSummary) {
    println!();
    println!("Trials: {} ({} discarded)", summary.trials, summary.discarded);
    if let Some(tally) = &summary.tally {
        println!("{}", tally);
    }
    if let Some(averages) = &summary.averages {
        let values: Vec<String> = averages.averages.iter().map(|v| format!("{:.2}", v)).collect();
        println!(
            "Selections: {} | Averages: [{}]",
            averages.selections,
            values.join(", ")
        );
    }
}

/// Parses the command line and runs the requested command
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings_path = match &cli.settings {
        Some(path) => path.clone(),
        None => StudySettings::default_path()?,
    };
    let mut settings = StudySettings::load_from(&settings_path)?;

    match cli.command {
        Commands::ForcedChoice(args) => {
            args.apply(&mut settings);
            let plot_path = args.session.plot_path(&settings, commands::ACCURACY_PLOT_NAME);
            let mut chooser = TerminalChooser::new(io::stdin().lock(), io::stdout());
            let summary = commands::run_forced_choice(&settings, &mut chooser, plot_path.as_deref())?;
            print_summary(&summary);
            if let Some(path) = plot_path.filter(|p| p.exists()) {
                println!("Accuracy plot: {}", path.display());
            }
        }
        Commands::Select(args) => {
            args.apply(&mut settings);
            let plot_path = args.session.plot_path(&settings, commands::AVERAGES_PLOT_NAME);
            let mut chooser = TerminalChooser::new(io::stdin().lock(), io::stdout());
            let summary =
                commands::run_parameter_selection(&settings, &mut chooser, plot_path.as_deref())?;
            print_summary(&summary);
            if let Some(base) = &plot_path {
                for idx in 0..summary.average_series.len() {
                    let path = plot::parameter_plot_path(base, idx);
                    if path.exists() {
                        println!("Averages plot: {}", path.display());
                    }
                }
            }
        }
        Commands::Metrics(args) => {
            let output = args.output.unwrap_or_else(|| settings.output_dir.clone());
            let pairs = commands::pair_up(&args.originals, &args.candidates)?;
            let reports = commands::score_pairs(&pairs, &output)?;
            for r in &reports {
                println!(
                    "{} vs {}: PSNR {:.2} | SSIM {:.4} | VIF {:.4}",
                    r.pair.original.display(),
                    r.pair.candidate.display(),
                    r.scores.psnr,
                    r.scores.ssim,
                    r.scores.vif
                );
            }
            println!(
                "Wrote {}",
                output.join(report::CSV_FILE_NAME).display()
            );
        }
        Commands::Compare(args) => {
            let output = args.output.unwrap_or_else(|| settings.output_dir.clone());
            let written = commands::compare_images(&args.candidates, &args.reference, &output)?;
            for (path, label) in &written {
                println!("{}: {}", path.display(), label);
            }
        }
        Commands::Settings => {
            println!("{}", settings_path.display());
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }
    Ok(())
}
