use super::*;
use crate::device::device::Device;

fn registry() -> Arc<DeviceRegistry> {
    Arc::new(DeviceRegistry::from_devices(vec![Device::host("cpu")]))
}

const SMOOTH_AND_RENDER: &str = r#"{
  "nodes": [
    { "id": "vol", "kind": "metaimage_importer", "params": { "filename": "vol.mhd" } },
    { "id": "smooth", "kind": "gaussian_smoothing",
      "params": { "mask_size": 5, "standard_deviation": 1.0 },
      "inputs": { "input": "vol" } },
    { "id": "slice", "kind": "slice_renderer",
      "params": { "slice_plane": "y", "slice_index": -1 },
      "inputs": { "input": "smooth" } }
  ],
  "update": ["slice"]
}"#;

#[test]
fn parses_with_defaults() {
    let cfg = PipelineConfig::from_json(SMOOTH_AND_RENDER).unwrap();
    assert_eq!(cfg.updates, 1);
    assert!(!cfg.device.prefer_gpu);
    assert_eq!(cfg.nodes.len(), 3);
    assert_eq!(cfg.nodes[1].params["mask_size"], ParamValue::Int(5));
    assert_eq!(cfg.nodes[1].params["standard_deviation"], ParamValue::Float(1.0));
    assert_eq!(cfg.nodes[2].inputs["input"], "smooth");
    cfg.validate().unwrap();
}

#[test]
fn json_round_trip_is_lossless() {
    let cfg = PipelineConfig::from_json(SMOOTH_AND_RENDER).unwrap();
    let again = PipelineConfig::from_json(&cfg.to_json_pretty().unwrap()).unwrap();
    assert_eq!(cfg, again);
}

#[test]
fn unknown_fields_are_serde_errors() {
    let err = PipelineConfig::from_json(r#"{ "nodes": [], "frames": 3 }"#).unwrap_err();
    assert!(matches!(err, MedflowError::Serde(_)), "{err:?}");
    let err = PipelineConfig::from_json("not json").unwrap_err();
    assert!(matches!(err, MedflowError::Serde(_)), "{err:?}");
}

#[test]
fn validation_catches_bad_references() {
    let mut cfg = PipelineConfig::from_json(SMOOTH_AND_RENDER).unwrap();
    cfg.nodes[2].inputs.insert("input".into(), "missing".into());
    assert!(matches!(cfg.validate(), Err(MedflowError::InvalidConfiguration(_))));

    let mut cfg = PipelineConfig::from_json(SMOOTH_AND_RENDER).unwrap();
    cfg.nodes[1].id = "vol".into();
    assert!(matches!(cfg.validate(), Err(MedflowError::InvalidConfiguration(_))));

    let mut cfg = PipelineConfig::from_json(SMOOTH_AND_RENDER).unwrap();
    cfg.update.push("nope".into());
    assert!(matches!(cfg.validate(), Err(MedflowError::InvalidConfiguration(_))));

    let mut cfg = PipelineConfig::from_json(SMOOTH_AND_RENDER).unwrap();
    cfg.updates = 0;
    assert!(matches!(cfg.validate(), Err(MedflowError::InvalidConfiguration(_))));
}

#[test]
fn build_wires_nodes_and_resolves_relative_paths() {
    let cfg = PipelineConfig::from_json(SMOOTH_AND_RENDER).unwrap();
    let built = cfg.build(registry(), Path::new("data")).unwrap();
    let p = &built.pipeline;

    let vol = built.node("vol").unwrap();
    let smooth = built.node("smooth").unwrap();
    let slice = built.node("slice").unwrap();
    assert_eq!(p.node_input(smooth, "input").unwrap(), Some(p.output(vol).unwrap()));
    assert_eq!(p.node_input(slice, "input").unwrap(), Some(p.output(smooth).unwrap()));
    assert_eq!(built.update, vec![slice]);
    assert_eq!(
        p.parameter(vol, "filename").unwrap(),
        Some(ParamValue::Text(
            Path::new("data").join("vol.mhd").to_string_lossy().into_owned()
        ))
    );
    // Building never executes.
    assert_eq!(p.execution_count(vol).unwrap(), 0);
}

#[test]
fn build_rejects_unknown_kinds_and_cycles() {
    let cfg = PipelineConfig::from_json(
        r#"{ "nodes": [ { "id": "a", "kind": "teapot" } ] }"#,
    )
    .unwrap();
    let err = cfg.build(registry(), Path::new(".")).unwrap_err();
    assert!(matches!(err, MedflowError::InvalidConfiguration(_)), "{err:?}");

    let cfg = PipelineConfig::from_json(
        r#"{ "nodes": [
          { "id": "a", "kind": "gaussian_smoothing", "inputs": { "input": "b" } },
          { "id": "b", "kind": "gaussian_smoothing", "inputs": { "input": "a" } }
        ] }"#,
    )
    .unwrap();
    let err = cfg.build(registry(), Path::new(".")).unwrap_err();
    assert!(matches!(err, MedflowError::InvalidConfiguration(_)), "{err:?}");
}

#[test]
fn stream_capacity_is_applied() {
    let cfg = PipelineConfig::from_json(
        r##"{ "nodes": [ { "id": "s", "kind": "image_file_streamer",
              "params": { "filename_format": "f_#.png" }, "stream_capacity": 4 } ] }"##,
    )
    .unwrap();
    assert!(cfg.build(registry(), Path::new(".")).is_ok());

    let cfg = PipelineConfig::from_json(
        r##"{ "nodes": [ { "id": "s", "kind": "image_file_streamer", "stream_capacity": 0 } ] }"##,
    )
    .unwrap();
    let err = cfg.build(registry(), Path::new(".")).unwrap_err();
    assert!(matches!(err, MedflowError::InvalidConfiguration(_)), "{err:?}");
}

#[test]
fn config_root_of_bare_file_is_cwd() {
    assert_eq!(config_root(Path::new("p.json")), PathBuf::from("."));
    assert_eq!(config_root(Path::new("a/b/p.json")), PathBuf::from("a/b"));
}
