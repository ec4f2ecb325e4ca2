use std::path::PathBuf;
use std::sync::Arc;

use super::*;
use crate::data::image::{DataType, Image};
use crate::device::device::Device;
use crate::device::registry::DeviceRegistry;
use crate::io::raster::write_raster;
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

/// Writes `count` 2x2 frames whose samples equal their index, plus one past a gap.
fn write_frames(dir: &std::path::Path, count: u32) -> String {
    for i in (0..count).chain([count + 1]) {
        let img = Image::new_2d(2, 2, 1, DataType::Uint8, vec![i as f32; 4]).unwrap();
        write_raster(&dir.join(format!("frame_{i}.png")), &img).unwrap();
    }
    dir.join("frame_#.png").to_string_lossy().into_owned()
}

fn pipeline() -> Pipeline {
    Pipeline::new(Arc::new(DeviceRegistry::from_devices(vec![Device::host(
        "cpu",
    )])))
}

fn drain(p: &mut Pipeline, data: crate::foundation::core::DataId) -> Vec<f32> {
    let mut seen = Vec::new();
    loop {
        match p.next_frame(data) {
            Ok(frame) => seen.push(frame.samples()[0]),
            Err(err) => {
                assert!(err.is_stream_exhausted(), "{err:?}");
                return seen;
            }
        }
    }
}

#[test]
fn streams_until_first_missing_file() {
    let dir = temp_dir("streamer_gap");
    let format = write_frames(&dir, 3);

    let mut p = pipeline();
    let s = p.add_node(ImageFileStreamer::new(&format).unwrap()).unwrap();
    let out = p.output(s).unwrap();
    assert_eq!(drain(&mut p, out), vec![0.0, 1.0, 2.0]);
    assert_eq!(p.execution_count(s).unwrap(), 3);

    // Exhaustion is sticky until a parameter changes.
    assert!(p.next_frame(out).unwrap_err().is_stream_exhausted());
}

#[test]
fn start_index_and_max_frames_bound_the_stream() {
    let dir = temp_dir("streamer_bounds");
    let format = write_frames(&dir, 4);

    let mut p = pipeline();
    let streamer = ImageFileStreamer::new(&format)
        .unwrap()
        .with_start_index(1)
        .with_max_frames(2);
    let s = p.add_node(streamer).unwrap();
    let out = p.output(s).unwrap();
    assert_eq!(drain(&mut p, out), vec![1.0, 2.0]);

    p.set_parameter(s, "max_frames", -1).unwrap();
    assert_eq!(drain(&mut p, out), vec![1.0, 2.0, 3.0]);
}

#[test]
fn missing_format_is_a_configuration_error() {
    let mut p = pipeline();
    let s = p.add_node(ImageFileStreamer::default()).unwrap();
    let out = p.output(s).unwrap();
    let err = p.next_frame(out).unwrap_err();
    assert!(matches!(err, MedflowError::InvalidConfiguration(_)), "{err:?}");
}

#[test]
fn parameters_are_validated() {
    let mut s = ImageFileStreamer::default();
    assert!(s.set_parameter("filename_format", &ParamValue::Text("no_placeholder.png".into())).is_err());
    assert!(s.set_parameter("start_index", &ParamValue::Int(-1)).is_err());
    assert!(s.set_parameter("max_frames", &ParamValue::Int(0)).is_err());
    assert!(s.set_parameter("frames", &ParamValue::Int(1)).is_err());

    s.set_parameter("filename_format", &ParamValue::Text("f_#.mhd".into()))
        .unwrap();
    s.set_parameter("max_frames", &ParamValue::Int(5)).unwrap();
    assert_eq!(s.parameter("max_frames"), Some(ParamValue::Int(5)));
    assert_eq!(
        s.parameter("filename_format"),
        Some(ParamValue::Text("f_#.mhd".into()))
    );
    assert_eq!(s.produced(), 0);
}
