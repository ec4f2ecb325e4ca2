use rayon::prelude::*;

use crate::data::image::Image;
use crate::foundation::error::{MedflowError, MedflowResult};

/// Normalized 1D Gaussian weights for an odd `mask_size`.
pub fn gaussian_weights(mask_size: u32, sigma: f32) -> MedflowResult<Vec<f32>> {
    if mask_size == 0 || mask_size % 2 == 0 {
        return Err(MedflowError::config(format!(
            "gaussian mask size must be odd and >= 1, got {mask_size}"
        )));
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(MedflowError::config(format!(
            "gaussian standard deviation must be > 0, got {sigma}"
        )));
    }

    let r = (mask_size / 2) as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let raw: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = raw.iter().sum();
    if sum <= 0.0 {
        return Err(MedflowError::config("gaussian kernel sum is zero"));
    }
    Ok(raw.into_iter().map(|w| (w / sum) as f32).collect())
}

/// Smooth every channel of a 2D or 3D image with a separable Gaussian, clamping at the edges.
pub fn smooth(image: &Image, mask_size: u32, sigma: f32) -> MedflowResult<Vec<f32>> {
    let kernel = gaussian_weights(mask_size, sigma)?;
    let src = image.samples();
    if mask_size == 1 {
        return Ok(src.to_vec());
    }

    let dims = [
        image.width() as usize,
        image.height() as usize,
        image.depth() as usize,
    ];
    let channels = image.channels() as usize;
    let axes = if image.rank() == 3 { 3 } else { 2 };

    let mut a = src.to_vec();
    let mut b = vec![0.0f32; src.len()];
    for axis in 0..axes {
        pass(&a, &mut b, dims, channels, axis, &kernel);
        std::mem::swap(&mut a, &mut b);
    }
    Ok(a)
}

fn pass(src: &[f32], dst: &mut [f32], dims: [usize; 3], channels: usize, axis: usize, k: &[f32]) {
    let [w, h, _] = dims;
    let stride = match axis {
        0 => channels,
        1 => w * channels,
        _ => w * h * channels,
    };
    let extent = dims[axis] as isize;
    let radius = (k.len() / 2) as isize;

    dst.par_chunks_mut(w * channels)
        .enumerate()
        .for_each(|(row, out)| {
            let base = row * w * channels;
            for x in 0..w {
                let pos = match axis {
                    0 => x,
                    1 => row % h,
                    _ => row / h,
                };
                let origin = base + x * channels - pos * stride;
                for c in 0..channels {
                    let mut acc = 0.0f32;
                    for (ki, &kw) in k.iter().enumerate() {
                        let p = (pos as isize + ki as isize - radius).clamp(0, extent - 1) as usize;
                        acc += kw * src[origin + p * stride + c];
                    }
                    out[x * channels + c] = acc;
                }
            }
        });
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/gaussian.rs"]
mod tests;
