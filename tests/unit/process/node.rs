use super::*;

#[test]
fn param_values_deserialize_untagged() {
    let v: Vec<ParamValue> = serde_json::from_str(r#"[true, 3, 0.5, "z"]"#).unwrap();
    assert_eq!(
        v,
        vec![
            ParamValue::Bool(true),
            ParamValue::Int(3),
            ParamValue::Float(0.5),
            ParamValue::Text("z".to_string()),
        ]
    );
}

#[test]
fn numeric_accessors_convert_where_lossless() {
    assert_eq!(ParamValue::Int(3).as_f64(), Some(3.0));
    assert_eq!(ParamValue::Float(4.0).as_i64(), Some(4));
    assert_eq!(ParamValue::Float(4.5).as_i64(), None);
    assert_eq!(ParamValue::Int(-1).as_u32(), None);
    assert_eq!(ParamValue::Int(7).as_u32(), Some(7));
    assert_eq!(ParamValue::Text("x".into()).as_f64(), None);
    assert_eq!(ParamValue::from("y").as_str(), Some("y"));
    assert_eq!(ParamValue::from(true).as_bool(), Some(true));
}

#[test]
fn output_mode_dynamics() {
    assert!(!OutputMode::Static.is_dynamic());
    assert!(OutputMode::Stream.is_dynamic());
    assert!(OutputMode::FollowInputs.is_dynamic());
}

#[test]
fn parameter_errors_are_configuration_errors() {
    assert!(matches!(
        unknown_parameter("k", "p"),
        MedflowError::InvalidConfiguration(_)
    ));
    assert!(matches!(
        bad_parameter("k", "p", "an odd integer", &ParamValue::Int(2)),
        MedflowError::InvalidConfiguration(_)
    ));
}
