use super::*;

#[test]
fn new_2d_validates_sample_count() {
    assert!(Image::new_2d(2, 2, 1, DataType::Uint8, vec![0.0; 4]).is_ok());
    let err = Image::new_2d(2, 2, 1, DataType::Uint8, vec![0.0; 3]).unwrap_err();
    assert!(matches!(err, MedflowError::DimensionMismatch(_)));
    let err = Image::new_3d(0, 2, 2, 1, DataType::Uint8, vec![]).unwrap_err();
    assert!(matches!(err, MedflowError::DimensionMismatch(_)));
}

#[test]
fn sample_indexing_is_slice_major() {
    let samples: Vec<f32> = (0..24).map(|v| v as f32).collect();
    let img = Image::new_3d(2, 3, 4, 1, DataType::Float, samples).unwrap();
    assert_eq!(img.sample(1, 0, 0, 0), 1.0);
    assert_eq!(img.sample(0, 1, 0, 0), 2.0);
    assert_eq!(img.sample(0, 0, 1, 0), 6.0);
    assert_eq!(img.sample(1, 2, 3, 0), 23.0);
    assert_eq!(img.extent(2), 4);
    assert_eq!(img.voxel_count(), 24);
}

#[test]
fn with_samples_keeps_metadata() {
    let img = Image::new_2d(2, 1, 1, DataType::Uint16, vec![1.0, 2.0])
        .unwrap()
        .with_spacing(Vec3::new(0.5, 0.25, 1.0));
    let out = img.with_samples(vec![3.0, 4.0]).unwrap();
    assert_eq!(out.spacing(), Vec3::new(0.5, 0.25, 1.0));
    assert_eq!(out.data_type(), DataType::Uint16);
    assert_eq!(out.samples(), &[3.0, 4.0]);
}

#[test]
fn bounding_box_uses_spacing_and_header_transform() {
    let img = Image::new_3d(4, 2, 2, 1, DataType::Uint8, vec![0.0; 16])
        .unwrap()
        .with_spacing(Vec3::new(0.5, 1.0, 2.0))
        .with_transform(Affine3A::from_translation(Vec3::new(10.0, 0.0, 0.0)));
    let b = img.bounding_box();
    assert_eq!(b.min(), Vec3::new(10.0, 0.0, 0.0));
    assert_eq!(b.max(), Vec3::new(12.0, 2.0, 4.0));
}

#[test]
fn data_type_defaults_match_ranges() {
    assert_eq!(DataType::Uint8.default_window(), 255.0);
    assert_eq!(DataType::Uint8.default_level(), 127.5);
    assert_eq!(DataType::Float.build_option(), "-DTYPE_FLOAT");
    assert_eq!(DataType::Int16.build_option(), "-DTYPE_INT");
    assert_eq!(DataType::Uint16.build_option(), "-DTYPE_UINT");
}

#[test]
fn require_rank_reports_mismatch() {
    let img = Image::new_2d(1, 1, 1, DataType::Uint8, vec![0.0]).unwrap();
    assert!(img.require_rank(2, "test").is_ok());
    assert!(matches!(
        img.require_rank(3, "test"),
        Err(MedflowError::DimensionMismatch(_))
    ));
}
