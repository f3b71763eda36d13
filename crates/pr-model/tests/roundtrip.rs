use pr_model::*;

fn sample() -> Vec<PipeSystemConfig> {
    let mut supply = PipeSystemConfig::new(
        "Cold supply",
        SystemType::ColdWater,
        Material::Pex,
        0.75,
        vec![
            PathPoint::new(0.0, 9.0, 0.0).with_fitting(Fitting::Cap),
            PathPoint::new(12.0, 9.0, 0.0).with_fitting(Fitting::Elbow90),
            PathPoint::new(12.0, 9.0, 30.0).with_fitting(Fitting::Cap),
        ],
    );
    supply.id = "ps-1".to_string();
    supply.pressure = Some(80.0);
    supply.insulated = Some(true);

    let mut vent = PipeSystemConfig::new(
        "Vent stack",
        SystemType::Vent,
        Material::Pvc,
        2.0,
        vec![PathPoint::new(4.0, 0.0, 4.0), PathPoint::new(4.0, 14.0, 4.0)],
    );
    vent.id = "ps-2".to_string();
    vec![supply, vent]
}

#[test]
fn roundtrip_json_file() {
    let configs = sample();
    let path = std::env::temp_dir().join("pr_model_roundtrip.json");
    save_json(&path, &configs).unwrap();
    let loaded = load_json(&path).unwrap();
    assert_eq!(configs, loaded);
}

#[test]
fn roundtrip_yaml_file() {
    let configs = sample();
    let path = std::env::temp_dir().join("pr_model_roundtrip.yaml");
    save_yaml(&path, &configs).unwrap();
    let loaded = load_yaml(&path).unwrap();
    assert_eq!(configs, loaded);
}

#[test]
fn interchange_json_loads() {
    let json = r#"[{
        "id": "abc", "name": "Gas line", "systemType": "gas", "material": "steel",
        "diameter": 1.0,
        "path": [{"x": 0, "y": 10, "z": 0, "fitting": "cap"}, {"x": 25, "y": 10, "z": 0, "fitting": "cap"}],
        "pressure": 5.0
    }]"#;
    let configs = from_json_str(json).unwrap();
    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0].material, Material::Steel);
    assert_eq!(configs[0].path[0].fitting, Fitting::Cap);
    assert!(validate(&configs[0]).valid);
}

#[test]
fn bad_json_is_an_error() {
    assert!(matches!(from_json_str("{"), Err(ModelError::Json(_))));
}

#[test]
fn bend_violation_references_middle_point() {
    // pex 1": min bend length 6 ft; middle segment is 2 ft
    let config = PipeSystemConfig::new(
        "tight",
        SystemType::HotWater,
        Material::Pex,
        1.0,
        vec![
            PathPoint::new(0.0, 0.0, 0.0),
            PathPoint::new(2.0, 0.0, 0.0),
            PathPoint::new(2.0, 0.0, 10.0),
        ],
    );
    let report = validate(&config);
    assert!(!report.valid);
    assert!(
        report
            .errors
            .iter()
            .any(|e| matches!(e, ValidationIssue::BendRadius { index: 1, .. }))
    );
}
