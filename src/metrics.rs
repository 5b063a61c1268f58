//! # Full-reference image quality metrics
//!
//! Scores a generated image against the original it was derived from.
//! Every metric returns a scalar plus an 8-bit difference map so the
//! result can be rendered as a heatmap.
//!
//! ## PSNR
//! - `20·log10(255/√MSE)` over all colour channels
//! - Infinite for bit-identical inputs
//!
//! ## SSIM
//! - Wang et al. (2004) on grayscale
//! - 7×7 uniform window with sample covariance, reflective borders
//! - The score excludes a 3-pixel border where the window is incomplete
//!
//! ## VIF (pixel domain)
//! - Local statistics from a 9×9 Gaussian (σ = 1.5)
//! - Ratio of the information the distorted image preserves to the information
//!   in the reference, under an additive-noise channel model
//! - Regions where the reference has no local variance carry no information

use crate::error::{StudyError, StudyResult};
use crate::filter::{self, Border};
use image::{GrayImage, Luma, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

const MAX_PIXEL: f64 = 255.0;

const SSIM_WINDOW: usize = 7;
const SSIM_K1: f64 = 0.01;
const SSIM_K2: f64 = 0.03;

const VIF_KERNEL: usize = 9;
const VIF_SIGMA: f64 = 1.5;
const VIF_NOISE_VARIANCE: f64 = 2.0;
const VIF_EPS: f64 = 1e-10;

/// Row-major single-channel image with `f64` samples
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    width: u32,
    height: u32,
    data: Vec<f64>,
}

impl Plane {
    pub(crate) fn from_raw(width: u32, height: u32, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), (width * height) as usize);
        Self {
            width,
            height,
            data,
        }
    }

    pub fn from_gray(img: &GrayImage) -> Self {
        let (width, height) = img.dimensions();
        let data = img.pixels().map(|p| p[0] as f64).collect();
        Self::from_raw(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> Plane {
        Plane::from_raw(self.width, self.height, self.data.iter().map(|&v| f(v)).collect())
    }

    fn zip(&self, other: &Plane, f: impl Fn(f64, f64) -> f64) -> Plane {
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(&a, &b)| f(a, b))
            .collect();
        Plane::from_raw(self.width, self.height, data)
    }

    fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().sum::<f64>() / self.data.len() as f64
    }
}

/// A metric score and its difference map
#[derive(Debug, Clone)]
pub struct MetricOutput {
    pub score: f64,
    pub diff: GrayImage,
}

/// All three scores for one image pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityScores {
    pub psnr: f64,
    pub ssim: f64,
    pub vif: f64,
}

fn ensure_same_shape(reference: (u32, u32), candidate: (u32, u32)) -> StudyResult<()> {
    if reference != candidate {
        return Err(StudyError::ShapeMismatch {
            reference,
            candidate,
        });
    }
    Ok(())
}

/// Scales `values` so the largest becomes 255; all zeros stay zero.
fn normalized_map(width: u32, height: u32, values: &[f64]) -> GrayImage {
    let max = values.iter().cloned().fold(0.0_f64, f64::max);
    GrayImage::from_fn(width, height, |x, y| {
        let v = values[(y * width + x) as usize];
        let scaled = if max > 0.0 { v / max * 255.0 } else { 0.0 };
        Luma([scaled as u8])
    })
}

pub fn psnr(reference: &RgbImage, candidate: &RgbImage) -> StudyResult<MetricOutput> {
    ensure_same_shape(reference.dimensions(), candidate.dimensions())?;
    let (width, height) = reference.dimensions();

    let per_pixel: Vec<f64> = reference
        .pixels()
        .zip(candidate.pixels())
        .map(|(a, b)| {
            a.0.iter()
                .zip(b.0.iter())
                .map(|(&ca, &cb)| (ca as f64 - cb as f64).powi(2))
                .sum::<f64>()
                / 3.0
        })
        .collect();

    let mse = if per_pixel.is_empty() {
        0.0
    } else {
        per_pixel.iter().sum::<f64>() / per_pixel.len() as f64
    };

    if mse == 0.0 {
        return Ok(MetricOutput {
            score: f64::INFINITY,
            diff: GrayImage::new(width, height),
        });
    }

    Ok(MetricOutput {
        score: 20.0 * (MAX_PIXEL / mse.sqrt()).log10(),
        diff: normalized_map(width, height, &per_pixel),
    })
}

pub fn ssim(reference: &Plane, candidate: &Plane) -> StudyResult<MetricOutput> {
    ensure_same_shape(reference.dimensions(), candidate.dimensions())?;
    let (width, height) = reference.dimensions();
    if (width as usize) < SSIM_WINDOW || (height as usize) < SSIM_WINDOW {
        return Err(StudyError::TooSmall {
            width,
            height,
            window: SSIM_WINDOW as u32,
        });
    }

    let kernel = filter::box_kernel(SSIM_WINDOW);
    let blur = |p: &Plane| filter::separable(p, &kernel, Border::Reflect);

    let np = (SSIM_WINDOW * SSIM_WINDOW) as f64;
    let cov_norm = np / (np - 1.0);

    let ux = blur(reference);
    let uy = blur(candidate);
    let uxx = blur(&reference.map(|v| v * v));
    let uyy = blur(&candidate.map(|v| v * v));
    let uxy = blur(&reference.zip(candidate, |a, b| a * b));

    let c1 = (SSIM_K1 * MAX_PIXEL).powi(2);
    let c2 = (SSIM_K2 * MAX_PIXEL).powi(2);

    let map: Vec<f64> = (0..ux.data().len())
        .map(|i| {
            let (mx, my) = (ux.data()[i], uy.data()[i]);
            let vx = cov_norm * (uxx.data()[i] - mx * mx);
            let vy = cov_norm * (uyy.data()[i] - my * my);
            let vxy = cov_norm * (uxy.data()[i] - mx * my);

            let a1 = 2.0 * mx * my + c1;
            let a2 = 2.0 * vxy + c2;
            let b1 = mx * mx + my * my + c1;
            let b2 = vx + vy + c2;
            (a1 * a2) / (b1 * b2)
        })
        .collect();

    let pad = SSIM_WINDOW / 2;
    let (w, h) = (width as usize, height as usize);
    let mut sum = 0.0;
    let mut count = 0usize;
    for y in pad..h - pad {
        for x in pad..w - pad {
            sum += map[y * w + x];
            count += 1;
        }
    }

    let diff = GrayImage::from_fn(width, height, |x, y| {
        let v = map[(y * width + x) as usize] * 255.0;
        Luma([v.clamp(0.0, 255.0) as u8])
    });

    Ok(MetricOutput {
        score: sum / count as f64,
        diff,
    })
}

pub fn vif(reference: &Plane, distorted: &Plane) -> StudyResult<MetricOutput> {
    ensure_same_shape(reference.dimensions(), distorted.dimensions())?;
    let (width, height) = reference.dimensions();

    // Local variances are shift invariant; centring keeps flat regions at exactly zero.
    let ref_mean = reference.mean();
    let dist_mean = distorted.mean();
    let x = reference.map(|v| v - ref_mean);
    let y = distorted.map(|v| v - dist_mean);

    let kernel = filter::gaussian_kernel(VIF_KERNEL, VIF_SIGMA);
    let blur = |p: &Plane| filter::separable(p, &kernel, Border::Reflect101);

    let mu1 = blur(&x);
    let mu2 = blur(&y);
    let sxx = blur(&x.map(|v| v * v));
    let syy = blur(&y.map(|v| v * v));
    let sxy = blur(&x.zip(&y, |a, b| a * b));

    let mut num = 0.0;
    let mut den = 0.0;
    for i in 0..mu1.data().len() {
        let (m1, m2) = (mu1.data()[i], mu2.data()[i]);
        let mut sigma1_sq = sxx.data()[i] - m1 * m1;
        let sigma2_sq = syy.data()[i] - m2 * m2;
        let sigma12 = sxy.data()[i] - m1 * m2;

        let mut g = sigma12 / (sigma1_sq + VIF_EPS);
        let mut sv_sq = sigma2_sq - g * sigma12;

        if sigma1_sq < VIF_EPS {
            g = 0.0;
            sv_sq = sigma2_sq;
            sigma1_sq = 0.0;
        }
        if sigma2_sq < VIF_EPS {
            g = 0.0;
            sv_sq = 0.0;
        }
        if sv_sq < VIF_EPS {
            sv_sq = VIF_EPS;
        }

        num += (1.0 + g * g * sigma1_sq / (sv_sq + VIF_NOISE_VARIANCE)).log10();
        den += (1.0 + sigma1_sq / VIF_NOISE_VARIANCE).log10();
    }

    let score = if den > 0.0 { num / den } else { 0.0 };

    let abs_diff: Vec<f64> = reference
        .data()
        .iter()
        .zip(distorted.data())
        .map(|(a, b)| (a - b).abs())
        .collect();

    Ok(MetricOutput {
        score,
        diff: normalized_map(width, height, &abs_diff),
    })
}

/// Difference maps for the three metrics, in PSNR, SSIM, VIF order
#[derive(Debug, Clone)]
pub struct PairEvaluation {
    pub scores: QualityScores,
    pub psnr_diff: GrayImage,
    pub ssim_diff: GrayImage,
    pub vif_diff: GrayImage,
}

/// BT.601 luma, rounded to 8 bits
pub fn luma(px: &Rgb<u8>) -> u8 {
    let [r, g, b] = px.0.map(|c| c as f64);
    (0.299 * r + 0.587 * g + 0.114 * b).round() as u8
}

/// Grayscale conversion shared by the metrics and the similarity comparator
pub fn grayscale(img: &RgbImage) -> GrayImage {
    let (width, height) = img.dimensions();
    GrayImage::from_fn(width, height, |x, y| Luma([luma(img.get_pixel(x, y))]))
}

/// Runs all three metrics; SSIM and VIF see the grayscale versions
pub fn evaluate(reference: &RgbImage, candidate: &RgbImage) -> StudyResult<PairEvaluation> {
    let psnr = psnr(reference, candidate)?;

    let ref_gray = Plane::from_gray(&grayscale(reference));
    let cand_gray = Plane::from_gray(&grayscale(candidate));

    let ssim = ssim(&ref_gray, &cand_gray)?;
    let vif = vif(&ref_gray, &cand_gray)?;

    Ok(PairEvaluation {
        scores: QualityScores {
            psnr: psnr.score,
            ssim: ssim.score,
            vif: vif.score,
        },
        psnr_diff: psnr.diff,
        ssim_diff: ssim.diff,
        vif_diff: vif.diff,
    })
}
