use std::path::PathBuf;
use std::sync::Arc;

use super::*;
use crate::data::image::DataType;
use crate::device::device::Device;
use crate::device::registry::DeviceRegistry;
use crate::foundation::core::{NodeId, Vec3};
use crate::nodes::ImageSource;
use crate::process::pipeline::Pipeline;

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

fn wire(image: Image, exporter: impl ProcessObject + 'static) -> (Pipeline, NodeId) {
    let mut p = Pipeline::new(Arc::new(DeviceRegistry::from_devices(vec![Device::host(
        "cpu",
    )])));
    let src = p.add_node(ImageSource::new(image)).unwrap();
    let e = p.add_node(exporter).unwrap();
    let out = p.output(src).unwrap();
    p.set_input(e, "input", out).unwrap();
    (p, e)
}

#[test]
fn raster_export_writes_and_passes_through() {
    let dir = temp_dir("export_png");
    let path = dir.join("nested").join("out.png");
    let img = Image::new_2d(2, 2, 1, DataType::Uint8, vec![0.0, 64.0, 128.0, 255.0]).unwrap();
    let (mut p, e) = wire(img.clone(), ImageExporter::new(&path));
    let out = p.output(e).unwrap();
    p.update(out).unwrap();

    assert!(path.is_file());
    let back = raster::read_raster(&path).unwrap();
    assert_eq!(back.samples(), img.samples());
    assert_eq!(p.image(out).unwrap().samples(), img.samples());
}

#[test]
fn raster_export_rejects_volumes() {
    let dir = temp_dir("export_png_3d");
    let path = dir.join("vol.png");
    let img = Image::new_3d(2, 2, 2, 1, DataType::Uint8, vec![0.0; 8]).unwrap();
    let (mut p, e) = wire(img, ImageExporter::new(&path));
    let err = p.update_node(e).unwrap_err();
    assert!(matches!(err, MedflowError::DimensionMismatch(_)), "{err:?}");
    assert!(!path.exists());
}

#[test]
fn metaimage_export_keeps_geometry() {
    let dir = temp_dir("export_mhd");
    let path = dir.join("vol.mhd");
    let img = Image::new_3d(3, 2, 2, 1, DataType::Int16, (0..12).map(|v| v as f32 - 6.0).collect())
        .unwrap()
        .with_spacing(Vec3::new(0.5, 0.5, 3.0));
    let (mut p, e) = wire(img.clone(), MetaImageExporter::new(&path));
    p.update_node(e).unwrap();

    let back = metaimage::read_metaimage(&path).unwrap();
    assert_eq!(back.samples(), img.samples());
    assert_eq!(back.spacing(), img.spacing());
    assert_eq!(back.data_type(), DataType::Int16);
}

#[test]
fn missing_filename_is_a_configuration_error() {
    let img = Image::new_2d(1, 1, 1, DataType::Uint8, vec![1.0]).unwrap();
    let (mut p, e) = wire(img, ImageExporter::default());
    let err = p.update_node(e).unwrap_err();
    assert!(matches!(err, MedflowError::InvalidConfiguration(_)), "{err:?}");

    p.set_parameter(e, "filename", "unused.png").unwrap();
    assert_eq!(
        p.parameter(e, "filename").unwrap(),
        Some(ParamValue::Text("unused.png".into()))
    );
}
