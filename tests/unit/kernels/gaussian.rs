use super::*;
use crate::data::image::DataType;

#[test]
fn weights_are_normalized_and_symmetric() {
    let k = gaussian_weights(7, 2.0).unwrap();
    assert_eq!(k.len(), 7);
    let sum: f32 = k.iter().sum();
    assert!((sum - 1.0).abs() < 1e-5);
    for i in 0..3 {
        assert!((k[i] - k[6 - i]).abs() < 1e-7);
    }
    assert!(k[3] > k[2]);
}

#[test]
fn bad_mask_or_sigma_is_rejected() {
    assert!(matches!(
        gaussian_weights(4, 1.0),
        Err(MedflowError::InvalidConfiguration(_))
    ));
    assert!(matches!(
        gaussian_weights(0, 1.0),
        Err(MedflowError::InvalidConfiguration(_))
    ));
    assert!(matches!(
        gaussian_weights(3, 0.0),
        Err(MedflowError::InvalidConfiguration(_))
    ));
}

#[test]
fn mask_size_one_is_identity() {
    let img = Image::new_2d(2, 1, 1, DataType::Float, vec![1.0, 9.0]).unwrap();
    assert_eq!(smooth(&img, 1, 3.0).unwrap(), vec![1.0, 9.0]);
}

#[test]
fn constant_volume_is_unchanged() {
    let img = Image::new_3d(4, 3, 2, 2, DataType::Uint8, vec![7.0; 4 * 3 * 2 * 2]).unwrap();
    let out = smooth(&img, 5, 1.5).unwrap();
    assert!(out.iter().all(|v| (v - 7.0).abs() < 1e-4));
}

#[test]
fn impulse_spreads_and_keeps_energy() {
    let (w, h) = (7u32, 7u32);
    let mut samples = vec![0.0f32; (w * h) as usize];
    samples[(3 * w + 3) as usize] = 100.0;
    let img = Image::new_2d(w, h, 1, DataType::Float, samples).unwrap();

    let out = smooth(&img, 3, 1.0).unwrap();
    let nonzero = out.iter().filter(|v| **v > 0.0).count();
    assert_eq!(nonzero, 9);
    let total: f32 = out.iter().sum();
    assert!((total - 100.0).abs() < 1e-3);
    assert!(out[(3 * w + 3) as usize] < 100.0);
}

#[test]
fn depth_axis_is_smoothed_for_volumes() {
    let mut samples = vec![0.0f32; 3];
    samples[1] = 30.0;
    let img = Image::new_3d(1, 1, 3, 1, DataType::Float, samples.clone()).unwrap();
    let out = smooth(&img, 3, 1.0).unwrap();
    assert!(out[0] > 0.0 && out[2] > 0.0);

    let flat = Image::new_2d(1, 3, 1, DataType::Float, samples).unwrap();
    let out2 = smooth(&flat, 3, 1.0).unwrap();
    assert!((out2[0] - out[0]).abs() < 1e-5);
}
