use crate::error::StudyResult;
use crate::heatmap;
use crate::metrics::{self, PairEvaluation, QualityScores};
use image::{imageops, RgbImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CSV_FILE_NAME: &str = "image_quality_metrics.csv";

/// An original image and the generated image scored against it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePair {
    pub original: PathBuf,
    pub candidate: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairReport {
    pub pair: ImagePair,
    pub scores: QualityScores,
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_number(value: f64) -> String {
    if value.is_infinite() {
        if value > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        value.to_string()
    }
}

/// One header row plus one row per pair
pub fn to_csv(reports: &[PairReport]) -> String {
    let mut csv = String::from("Original Image,Compressed Image,PSNR,SSIM,VIF\n");
    for r in reports {
        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            csv_field(&r.pair.original.display().to_string()),
            csv_field(&r.pair.candidate.display().to_string()),
            csv_number(r.scores.psnr),
            csv_number(r.scores.ssim),
            csv_number(r.scores.vif),
        ));
    }
    csv
}

/// Originals on top; candidate and heatmaps below
fn comparison_panel(original: &RgbImage, candidate: &RgbImage, eval: &PairEvaluation) -> RgbImage {
    let (w, h) = original.dimensions();
    let mut panel = RgbImage::new(w * 3, h * 2);

    imageops::replace(&mut panel, original, 0, 0);
    imageops::replace(&mut panel, candidate, w as i64, 0);
    imageops::replace(&mut panel, &heatmap::jet(&eval.ssim_diff), 2 * w as i64, 0);
    imageops::replace(&mut panel, &heatmap::jet(&eval.psnr_diff), 0, h as i64);
    imageops::replace(&mut panel, &heatmap::jet(&eval.vif_diff), w as i64, h as i64);
    panel
}

fn write_artifacts(
    output_dir: &Path,
    number: usize,
    original: &RgbImage,
    candidate: &RgbImage,
    eval: &PairEvaluation,
) -> StudyResult<()> {
    original.save(output_dir.join(format!("original_image_{}.png", number)))?;
    candidate.save(output_dir.join(format!("compressed_image_{}.png", number)))?;
    heatmap::jet(&eval.psnr_diff).save(output_dir.join(format!("psnr_diff_{}.png", number)))?;
    heatmap::jet(&eval.ssim_diff).save(output_dir.join(format!("ssim_diff_{}.png", number)))?;
    heatmap::jet(&eval.vif_diff).save(output_dir.join(format!("vif_diff_{}.png", number)))?;
    comparison_panel(original, candidate, eval)
        .save(output_dir.join(format!("comparison_{}.png", number)))?;
    Ok(())
}

fn evaluate_one(output_dir: &Path, number: usize, pair: &ImagePair) -> StudyResult<PairReport> {
    let original = image::open(&pair.original)?.to_rgb8();
    let candidate = image::open(&pair.candidate)?.to_rgb8();

    let eval = metrics::evaluate(&original, &candidate)?;
    write_artifacts(output_dir, number, &original, &candidate, &eval)?;

    tracing::info!(
        original = %pair.original.display(),
        candidate = %pair.candidate.display(),
        psnr = eval.scores.psnr,
        ssim = eval.scores.ssim,
        vif = eval.scores.vif,
        "scored pair"
    );

    Ok(PairReport {
        pair: pair.clone(),
        scores: eval.scores,
    })
}

/// Scores every pair in parallel and writes images plus the CSV table.
///
/// Artifacts are numbered from 1 in input order. The first failing pair aborts the batch.
pub fn evaluate_pairs(pairs: &[ImagePair], output_dir: &Path) -> StudyResult<Vec<PairReport>> {
    fs::create_dir_all(output_dir)?;

    let reports = pairs
        .par_iter()
        .enumerate()
        .map(|(i, pair)| evaluate_one(output_dir, i + 1, pair))
        .collect::<StudyResult<Vec<_>>>()?;

    fs::write(output_dir.join(CSV_FILE_NAME), to_csv(&reports))?;
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StudyError;
    use image::Rgb;
    use tempfile::TempDir;

    fn write_image(path: &Path, img: &RgbImage) {
        img.save(path).unwrap();
    }

    fn textured(width: u32, height: u32, shift: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let v = ((x * 31 + y * 17 + shift) % 256) as u8;
            Rgb([v, v / 2, 255 - v])
        })
    }

    #[test]
    fn test_csv_quoting_and_infinity() {
        let reports = vec![PairReport {
            pair: ImagePair {
                original: PathBuf::from("orig.png"),
                candidate: PathBuf::from("6,35,600.png"),
            },
            scores: QualityScores {
                psnr: f64::INFINITY,
                ssim: 1.0,
                vif: 0.5,
            },
        }];
        let csv = to_csv(&reports);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Original Image,Compressed Image,PSNR,SSIM,VIF"));
        assert_eq!(lines.next(), Some("orig.png,\"6,35,600.png\",inf,1,0.5"));
    }

    #[test]
    fn test_evaluate_pairs_writes_artifacts() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.png");
        let b = tmp.path().join("b.png");
        write_image(&a, &textured(16, 16, 0));
        write_image(&b, &textured(16, 16, 3));

        let out = tmp.path().join("results");
        let pairs = vec![
            ImagePair {
                original: a.clone(),
                candidate: a.clone(),
            },
            ImagePair {
                original: a.clone(),
                candidate: b.clone(),
            },
        ];
        let reports = evaluate_pairs(&pairs, &out).unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].pair, pairs[0]);
        assert!(reports[0].scores.psnr.is_infinite());
        assert!(reports[1].scores.psnr.is_finite());
        assert!(reports[1].scores.ssim < 1.0);

        for name in [
            "original_image_1.png",
            "compressed_image_2.png",
            "psnr_diff_2.png",
            "ssim_diff_1.png",
            "vif_diff_2.png",
            "comparison_2.png",
            CSV_FILE_NAME,
        ] {
            assert!(out.join(name).exists(), "missing {}", name);
        }

        let csv = fs::read_to_string(out.join(CSV_FILE_NAME)).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_mismatched_pair_aborts() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.png");
        let b = tmp.path().join("b.png");
        write_image(&a, &textured(16, 16, 0));
        write_image(&b, &textured(16, 12, 0));

        let err = evaluate_pairs(
            &[ImagePair {
                original: a,
                candidate: b,
            }],
            &tmp.path().join("out"),
        )
        .unwrap_err();
        assert!(matches!(err, StudyError::ShapeMismatch { .. }));
        assert!(!tmp.path().join("out").join(CSV_FILE_NAME).exists());
    }
}
