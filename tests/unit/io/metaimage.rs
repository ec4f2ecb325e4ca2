use super::*;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "medflow_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn parses_a_typical_header() {
    let h = parse_header(
        "ObjectType = Image\n\
         NDims = 3\n\
         DimSize = 4 3 2\n\
         ElementType = MET_SHORT\n\
         ElementSpacing = 0.5 0.5 2\n\
         Offset = 10 20 30\n\
         TransformMatrix = 1 0 0 0 1 0 0 0 1\n\
         ElementDataFile = vol.raw\n\
         Ignored = after data file\n",
    )
    .unwrap();
    assert_eq!(h.dims, vec![4, 3, 2]);
    assert_eq!(h.element_type, DataType::Int16);
    assert_eq!(h.spacing, Vec3::new(0.5, 0.5, 2.0));
    assert_eq!(h.offset, Vec3::new(10.0, 20.0, 30.0));
    assert_eq!(h.data_file.as_deref(), Some("vol.raw"));
    assert_eq!(
        h.transform().transform_point3(Vec3::ZERO),
        Vec3::new(10.0, 20.0, 30.0)
    );
}

#[test]
fn header_errors() {
    assert!(matches!(
        parse_header("NDims = 3\nElementType = MET_UCHAR\nElementDataFile = x.raw\n"),
        Err(MedflowError::InvalidInput(_))
    ));
    assert!(matches!(
        parse_header("NDims = 4\nDimSize = 1 1 1 1\nElementType = MET_UCHAR\nElementDataFile = x\n"),
        Err(MedflowError::DimensionMismatch(_))
    ));
    assert!(matches!(
        parse_header("DimSize = 1 1\nElementType = MET_DOUBLE\nElementDataFile = x\n"),
        Err(MedflowError::UnsupportedOperation(_))
    ));
    assert!(matches!(
        parse_header("DimSize = 1 1\nCompressedData = True\nElementDataFile = x\n"),
        Err(MedflowError::UnsupportedOperation(_))
    ));
}

#[test]
fn volume_round_trips_through_header_and_raw() {
    let dir = temp_dir("mhd_roundtrip");
    let path = dir.join("vol.mhd");
    let samples: Vec<f32> = (0..24).map(|v| (v * 1000) as f32).collect();
    let img = Image::new_3d(4, 3, 2, 1, DataType::Uint16, samples.clone())
        .unwrap()
        .with_spacing(Vec3::new(0.5, 0.25, 2.0))
        .with_transform(Affine3A::from_translation(Vec3::new(1.0, 2.0, 3.0)));
    write_metaimage(&path, &img).unwrap();
    assert!(dir.join("vol.raw").exists());

    let back = read_metaimage(&path).unwrap();
    assert_eq!(back.rank(), 3);
    assert_eq!((back.width(), back.height(), back.depth()), (4, 3, 2));
    assert_eq!(back.samples(), samples.as_slice());
    assert_eq!(back.spacing(), Vec3::new(0.5, 0.25, 2.0));
    assert_eq!(back.transform(), img.transform());
    assert_eq!(back.data_type(), DataType::Uint16);
}

#[test]
fn two_dimensional_multichannel_round_trip() {
    let dir = temp_dir("mhd_2d");
    let path = dir.join("rgb.mhd");
    let img = Image::new_2d(2, 1, 3, DataType::Float, vec![0.0, 0.5, 1.0, -1.5, 2.0, 3.25])
        .unwrap();
    write_metaimage(&path, &img).unwrap();
    let back = read_metaimage(&path).unwrap();
    assert_eq!(back.rank(), 2);
    assert_eq!(back.channels(), 3);
    assert_eq!(back.samples(), img.samples());
}

#[test]
fn local_data_and_big_endian() {
    let dir = temp_dir("mha_local");
    let path = dir.join("inline.mha");
    let mut bytes = b"ObjectType = Image\nNDims = 2\nDimSize = 2 1\nElementType = MET_USHORT\nBinaryDataByteOrderMSB = True\nElementDataFile = LOCAL\n".to_vec();
    bytes.extend_from_slice(&[0x01, 0x00, 0x00, 0x02]);
    std::fs::write(&path, bytes).unwrap();

    let img = read_metaimage(&path).unwrap();
    assert_eq!(img.samples(), &[256.0, 2.0]);
}

#[test]
fn short_data_is_a_dimension_mismatch() {
    let h = parse_header("DimSize = 2 2\nElementType = MET_FLOAT\nElementDataFile = LOCAL\n").unwrap();
    assert!(matches!(
        decode(&h, &[0u8; 8]),
        Err(MedflowError::DimensionMismatch(_))
    ));
}

#[test]
fn recognizes_metaimage_extensions() {
    assert!(is_metaimage(Path::new("a/b.mhd")));
    assert!(is_metaimage(Path::new("B.MHA")));
    assert!(!is_metaimage(Path::new("a.png")));
}
