//! Histogram-based similarity between candidates and their reference.
//!
//! Colour similarity is the correlation of hue/saturation histograms; the
//! spatial disagreement is shown as a green overlay on the first image.

use crate::error::{StudyError, StudyResult};
use crate::metrics::luma;
use image::{Rgb, RgbImage};

const HUE_BINS: usize = 50;
const SAT_BINS: usize = 60;
const DIFF_THRESHOLD: u8 = 30;

/// L2-normalised 2-D hue/saturation histogram
#[derive(Debug, Clone, PartialEq)]
pub struct HsHistogram {
    bins: Vec<f64>,
}

/// One labelled pairwise comparison
#[derive(Debug, Clone)]
pub struct Comparison {
    pub label: String,
    pub similarity: f64,
    pub overlay: RgbImage,
}

/// Hue in [0, 180) and saturation in [0, 255], 8-bit HSV conventions
fn hue_saturation(px: &Rgb<u8>) -> (f64, f64) {
    let [r, g, b] = px.0.map(|c| c as f64);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let sat = if max > 0.0 { delta / max * 255.0 } else { 0.0 };
    if delta == 0.0 {
        return (0.0, sat);
    }

    let mut hue = if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if hue < 0.0 {
        hue += 360.0;
    }
    (hue / 2.0, sat)
}

impl HsHistogram {
    pub fn from_image(img: &RgbImage) -> Self {
        let mut bins = vec![0.0; HUE_BINS * SAT_BINS];
        for px in img.pixels() {
            let (h, s) = hue_saturation(px);
            let hb = ((h * HUE_BINS as f64 / 180.0) as usize).min(HUE_BINS - 1);
            let sb = ((s * SAT_BINS as f64 / 256.0) as usize).min(SAT_BINS - 1);
            bins[hb * SAT_BINS + sb] += 1.0;
        }

        let norm = bins.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            bins.iter_mut().for_each(|v| *v /= norm);
        }
        Self { bins }
    }

    /// Pearson correlation; two flat histograms count as identical
    pub fn correlation(&self, other: &HsHistogram) -> f64 {
        let n = self.bins.len() as f64;
        let mean_a = self.bins.iter().sum::<f64>() / n;
        let mean_b = other.bins.iter().sum::<f64>() / n;

        let mut num = 0.0;
        let mut var_a = 0.0;
        let mut var_b = 0.0;
        for (&a, &b) in self.bins.iter().zip(&other.bins) {
            let (da, db) = (a - mean_a, b - mean_b);
            num += da * db;
            var_a += da * da;
            var_b += db * db;
        }

        let denom = var_a * var_b;
        if denom.abs() > f64::EPSILON {
            num / denom.sqrt()
        } else {
            1.0
        }
    }
}

/// Pixels whose grayscale values differ by more than the threshold
pub fn difference_mask(a: &RgbImage, b: &RgbImage) -> StudyResult<Vec<bool>> {
    if a.dimensions() != b.dimensions() {
        return Err(StudyError::ShapeMismatch {
            reference: a.dimensions(),
            candidate: b.dimensions(),
        });
    }
    Ok(a.pixels()
        .zip(b.pixels())
        .map(|(pa, pb)| luma(pa).abs_diff(luma(pb)) > DIFF_THRESHOLD)
        .collect())
}

/// Blends masked pixels half-and-half with pure green
pub fn overlay(img: &RgbImage, mask: &[bool]) -> RgbImage {
    let mut out = img.clone();
    for (px, &hit) in out.pixels_mut().zip(mask) {
        if hit {
            let [r, g, b] = px.0;
            *px = Rgb([
                (r as f64 * 0.5).round() as u8,
                (g as f64 * 0.5 + 127.5).round() as u8,
                (b as f64 * 0.5).round() as u8,
            ]);
        }
    }
    out
}

fn compare(
    a: &RgbImage,
    b: &RgbImage,
    hist_a: &HsHistogram,
    hist_b: &HsHistogram,
    what: &str,
) -> StudyResult<Comparison> {
    let mask = difference_mask(a, b)?;
    let similarity = hist_a.correlation(hist_b);
    Ok(Comparison {
        label: format!("{} (Similarity: {:.4})", what, similarity),
        similarity,
        overlay: overlay(a, &mask),
    })
}

/// Compares every candidate pair, then each candidate with the reference.
///
/// Output order is candidate-major: for candidate `i`, its comparisons with
/// later candidates come first, followed by its comparison with the reference.
pub fn compare_group(
    candidates: &[RgbImage],
    reference: &RgbImage,
) -> StudyResult<Vec<Comparison>> {
    let histograms: Vec<HsHistogram> = candidates.iter().map(HsHistogram::from_image).collect();
    let reference_hist = HsHistogram::from_image(reference);

    let mut results = Vec::new();
    for i in 0..candidates.len() {
        for j in i + 1..candidates.len() {
            results.push(compare(
                &candidates[i],
                &candidates[j],
                &histograms[i],
                &histograms[j],
                &format!("Image {} and Image {}", i + 1, j + 1),
            )?);
        }
        results.push(compare(
            &candidates[i],
            reference,
            &histograms[i],
            &reference_hist,
            &format!("Image {} and Groundtruth", i + 1),
        )?);
    }

    tracing::debug!(comparisons = results.len(), "compared candidate group");
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_image(left: Rgb<u8>, right: Rgb<u8>) -> RgbImage {
        RgbImage::from_fn(8, 8, |x, _| if x < 4 { left } else { right })
    }

    #[test]
    fn test_hue_saturation_primaries() {
        assert_eq!(hue_saturation(&Rgb([255, 0, 0])), (0.0, 255.0));
        assert_eq!(hue_saturation(&Rgb([0, 255, 0])), (60.0, 255.0));
        assert_eq!(hue_saturation(&Rgb([0, 0, 255])), (120.0, 255.0));
        assert_eq!(hue_saturation(&Rgb([90, 90, 90])), (0.0, 0.0));
    }

    #[test]
    fn test_identical_histograms_correlate_fully() {
        let img = split_image(Rgb([200, 10, 10]), Rgb([10, 10, 200]));
        let h = HsHistogram::from_image(&img);
        assert!((h.correlation(&h) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_different_colours_correlate_less() {
        let red = HsHistogram::from_image(&RgbImage::from_pixel(8, 8, Rgb([220, 0, 0])));
        let blue = HsHistogram::from_image(&RgbImage::from_pixel(8, 8, Rgb([0, 0, 220])));
        assert!(red.correlation(&blue) < 0.5);
    }

    #[test]
    fn test_mask_and_overlay() {
        let a = RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]));
        let b = split_image(Rgb([0, 0, 0]), Rgb([255, 255, 255]));

        let mask = difference_mask(&a, &b).unwrap();
        assert_eq!(mask.iter().filter(|&&m| m).count(), 32);

        let out = overlay(&a, &mask);
        assert_eq!(*out.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*out.get_pixel(7, 0), Rgb([0, 128, 0]));
    }

    #[test]
    fn test_compare_group_order_and_count() {
        let imgs = vec![
            RgbImage::from_pixel(8, 8, Rgb([10, 20, 30])),
            RgbImage::from_pixel(8, 8, Rgb([30, 20, 10])),
            RgbImage::from_pixel(8, 8, Rgb([20, 20, 20])),
        ];
        let reference = RgbImage::from_pixel(8, 8, Rgb([10, 20, 30]));

        let results = compare_group(&imgs, &reference).unwrap();
        let labels: Vec<_> = results
            .iter()
            .map(|c| c.label.split(" (").next().unwrap().to_string())
            .collect();
        assert_eq!(
            labels,
            vec![
                "Image 1 and Image 2",
                "Image 1 and Image 3",
                "Image 1 and Groundtruth",
                "Image 2 and Image 3",
                "Image 2 and Groundtruth",
                "Image 3 and Groundtruth",
            ]
        );
        assert!((results[2].similarity - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_mismatched_sizes_fail() {
        let a = RgbImage::new(8, 8);
        let b = RgbImage::new(8, 9);
        assert!(matches!(
            compare_group(&[a], &b),
            Err(StudyError::ShapeMismatch { .. })
        ));
    }
}
