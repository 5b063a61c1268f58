use crate::metrics::Plane;
use rayon::prelude::*;

/// How samples outside the image are synthesised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Border {
    /// `gfedcb|abcdefgh|gfedcba`
    Reflect101,
    /// `hgfedcba|abcdefgh|hgfedcba`
    Reflect,
}

impl Border {
    fn index(self, i: isize, n: usize) -> usize {
        if n == 1 {
            return 0;
        }
        let n = n as isize;
        let j = match self {
            Border::Reflect101 => {
                let period = 2 * (n - 1);
                let j = i.rem_euclid(period);
                if j >= n {
                    period - j
                } else {
                    j
                }
            }
            Border::Reflect => {
                let period = 2 * n;
                let j = i.rem_euclid(period);
                if j >= n {
                    period - 1 - j
                } else {
                    j
                }
            }
        };
        j as usize
    }
}

/// Normalised 1-D Gaussian of odd length `size`
pub fn gaussian_kernel(size: usize, sigma: f64) -> Vec<f64> {
    let center = (size / 2) as f64;
    let mut kernel: Vec<f64> = (0..size)
        .map(|i| {
            let x = i as f64 - center;
            (-(x * x) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);
    kernel
}

pub fn box_kernel(size: usize) -> Vec<f64> {
    vec![1.0 / size as f64; size]
}

/// Convolves `plane` with `kernel` along rows, then along columns.
///
/// The kernel must be symmetric with odd length.
pub fn separable(plane: &Plane, kernel: &[f64], border: Border) -> Plane {
    let (w, h) = (plane.width() as usize, plane.height() as usize);
    let radius = (kernel.len() / 2) as isize;
    let src = plane.data();

    let mut horizontal = vec![0.0; w * h];
    horizontal
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(y, row)| {
            let line = &src[y * w..(y + 1) * w];
            for (x, out) in row.iter_mut().enumerate() {
                *out = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, &weight)| {
                        let sx = border.index(x as isize + k as isize - radius, w);
                        weight * line[sx]
                    })
                    .sum();
            }
        });

    let mut vertical = vec![0.0; w * h];
    vertical.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        for (x, out) in row.iter_mut().enumerate() {
            *out = kernel
                .iter()
                .enumerate()
                .map(|(k, &weight)| {
                    let sy = border.index(y as isize + k as isize - radius, h);
                    weight * horizontal[sy * w + x]
                })
                .sum();
        }
    });

    Plane::from_raw(plane.width(), plane.height(), vertical)
}
