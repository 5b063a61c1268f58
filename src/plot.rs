use anyhow::{Context, Result};
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

const PLOT_SIZE: (u32, u32) = (1200, 700);

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

/// Accuracy against attempt number, one point per recorded trial.
///
/// Returns `false` without writing anything when the history is empty.
pub fn render_accuracy_plot(out_path: &Path, history: &[f64]) -> Result<bool> {
    if history.is_empty() {
        tracing::info!("no trials recorded, skipping accuracy plot");
        return Ok(false);
    }
    ensure_parent(out_path)?;

    let x_max = history.len().max(2) as f64;
    let root = BitMapBackend::new(out_path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Accuracy Over Time", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(1.0f64..x_max, 0.0f64..100.0f64)?;

    chart
        .configure_mesh()
        .x_desc("Attempt Number")
        .y_desc("Accuracy (%)")
        .draw()?;

    let points: Vec<(f64, f64)> = history
        .iter()
        .enumerate()
        .map(|(i, &a)| ((i + 1) as f64, a))
        .collect();

    chart.draw_series(LineSeries::new(points.iter().copied(), &BLUE))?;
    chart.draw_series(points.iter().map(|&(x, y)| Circle::new((x, y), 3, BLUE.filled())))?;

    root.present()
        .with_context(|| format!("failed to write {}", out_path.display()))?;
    tracing::info!(path = %out_path.display(), "saved accuracy plot");
    Ok(true)
}

/// `<dir>/<stem>_param<i>.png` for parameter `i` (1-based)
pub fn parameter_plot_path(base: &Path, index: usize) -> PathBuf {
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("averages");
    base.with_file_name(format!("{}_param{}.png", stem, index + 1))
}

/// One chart per parameter showing its running average over selections.
pub fn render_average_plots(base: &Path, series: &[Vec<f64>]) -> Result<Vec<PathBuf>> {
    if series.iter().all(|s| s.is_empty()) {
        tracing::info!("no selections recorded, skipping averages plots");
        return Ok(Vec::new());
    }
    ensure_parent(base)?;

    let mut written = Vec::with_capacity(series.len());
    for (i, values) in series.iter().enumerate() {
        let path = parameter_plot_path(base, i);
        render_series(&path, &format!("Parameter {} Averages Over Selections", i + 1), values)?;
        written.push(path);
    }
    Ok(written)
}

fn render_series(out_path: &Path, title: &str, values: &[f64]) -> Result<()> {
    let (lo, hi) = values
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let pad = ((hi - lo) * 0.05).max(1.0);

    let root = BitMapBackend::new(out_path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(1.0f64..(values.len().max(2) as f64), (lo - pad)..(hi + pad))?;

    chart
        .configure_mesh()
        .x_desc("Selections")
        .y_desc("Average Value")
        .draw()?;

    chart.draw_series(LineSeries::new(
        values.iter().enumerate().map(|(i, &v)| ((i + 1) as f64, v)),
        &BLUE,
    ))?;

    root.present()
        .with_context(|| format!("failed to write {}", out_path.display()))?;
    tracing::info!(path = %out_path.display(), "saved averages plot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parameter_plot_path() {
        let base = Path::new("out/averages.png");
        assert_eq!(
            parameter_plot_path(base, 0),
            PathBuf::from("out/averages_param1.png")
        );
        assert_eq!(
            parameter_plot_path(base, 2),
            PathBuf::from("out/averages_param3.png")
        );
    }

    #[test]
    fn test_accuracy_plot_written() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("plots").join("accuracy_plot.png");

        assert!(render_accuracy_plot(&path, &[100.0, 50.0, 66.7, 75.0]).unwrap());
        assert!(path.exists());
        assert!(fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_one_averages_plot_per_parameter() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("averages.png");
        let series = vec![
            vec![6.0, 5.5, 6.0],
            vec![35.0, 32.5, 33.0],
            vec![600.0, 625.0, 610.0],
        ];

        let written = render_average_plots(&base, &series).unwrap();
        let expected: Vec<PathBuf> = (0..3).map(|i| parameter_plot_path(&base, i)).collect();
        assert_eq!(written, expected);
        assert!(written.iter().all(|p| p.exists()));
        assert!(!base.exists());
    }

    #[test]
    fn test_single_point_series_renders() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("averages.png");

        let written = render_average_plots(&base, &[vec![4.0]]).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].exists());
    }

    #[test]
    fn test_empty_history_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("accuracy_plot.png");

        assert!(!render_accuracy_plot(&path, &[]).unwrap());
        assert!(!path.exists());

        let written = render_average_plots(&path, &[vec![], vec![]]).unwrap();
        assert!(written.is_empty());
    }
}
