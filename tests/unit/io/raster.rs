use super::*;

fn temp_dir(name: &str) -> std::path::PathBuf {
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
fn gray_png_round_trips_through_files() {
    let dir = temp_dir("raster_gray");
    let path = dir.join("gray.png");
    let img = Image::new_2d(3, 2, 1, DataType::Uint8, vec![0.0, 10.0, 20.0, 30.0, 40.0, 255.0])
        .unwrap();
    write_raster(&path, &img).unwrap();

    let back = read_raster(&path).unwrap();
    assert_eq!((back.width(), back.height(), back.channels()), (3, 2, 1));
    assert_eq!(back.data_type(), DataType::Uint8);
    assert_eq!(back.samples(), img.samples());
    assert_eq!(back.rank(), 2);
}

#[test]
fn sixteen_bit_png_keeps_precision() {
    let dir = temp_dir("raster_16");
    let path = dir.join("wide.png");
    let img = Image::new_2d(2, 1, 1, DataType::Uint16, vec![1000.0, 65535.0]).unwrap();
    write_raster(&path, &img).unwrap();
    let back = read_raster(&path).unwrap();
    assert_eq!(back.data_type(), DataType::Uint16);
    assert_eq!(back.samples(), &[1000.0, 65535.0]);
}

#[test]
fn smoothed_samples_are_rounded_and_clamped() {
    let dir = temp_dir("raster_clamp");
    let path = dir.join("clamped.png");
    let img = Image::new_2d(3, 1, 1, DataType::Uint8, vec![-4.0, 12.6, 300.0]).unwrap();
    write_raster(&path, &img).unwrap();
    assert_eq!(read_raster(&path).unwrap().samples(), &[0.0, 13.0, 255.0]);
}

#[test]
fn jpeg_export_drops_alpha() {
    let dir = temp_dir("raster_jpeg");
    let path = dir.join("rgba.jpg");
    let img = Image::new_2d(2, 2, 4, DataType::Uint8, vec![128.0; 16]).unwrap();
    write_raster(&path, &img).unwrap();
    let back = read_raster(&path).unwrap();
    assert_eq!(back.channels(), 3);
}

#[test]
fn volumes_cannot_be_rasterized() {
    let dir = temp_dir("raster_3d");
    let img = Image::new_3d(2, 2, 2, 1, DataType::Uint8, vec![0.0; 8]).unwrap();
    assert!(matches!(
        write_raster(&dir.join("v.png"), &img),
        Err(MedflowError::DimensionMismatch(_))
    ));
}

#[test]
fn missing_file_is_wrapped_io_error() {
    let err = read_raster(Path::new("definitely/not/here.png")).unwrap_err();
    assert!(matches!(err, MedflowError::Other(_)));
    assert!(err.to_string().contains("here.png"));
}

#[test]
fn decode_from_memory() {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(image::RgbImage::from_raw(1, 1, vec![1, 2, 3]).unwrap())
        .write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    let img = decode_raster(&buf).unwrap();
    assert_eq!(img.channels(), 3);
    assert_eq!(img.samples(), &[1.0, 2.0, 3.0]);
}
