use wedm_project::*;

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("wedm_project_{}_{}", std::process::id(), name))
}

fn sample_project() -> Project {
    let mut project = Project::new("Roundtrip");
    project.environment.workpiece_height = 5.0;
    project.control_mode = ControlMode::Velocity;
    project.seed = Some(42);
    project.generator = Some(GeneratorSettings {
        target_voltage: 80.0,
        current_mode: "I7".parse().unwrap(),
        on_time: 2.0,
        off_time: 33.0,
    });
    project.modules.mechanics.axis = ServoAxis::Workpiece;
    project.modules.wire.compute_zone_mean = true;
    project
}

#[test]
fn roundtrip_yaml() {
    let project = sample_project();
    let path = temp_path("roundtrip.yaml");
    save_yaml(&path, &project).unwrap();
    let loaded = load_yaml(&path).unwrap();
    assert_eq!(project, loaded);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn roundtrip_json() {
    let project = sample_project();
    let path = temp_path("roundtrip.json");
    save_json(&path, &project).unwrap();
    let loaded = load(&path).unwrap();
    assert_eq!(project, loaded);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn save_refuses_invalid_project() {
    let mut project = sample_project();
    project.environment.wire_diameter = 0.0;
    let path = temp_path("invalid.yaml");
    let err = save_yaml(&path, &project).unwrap_err();
    assert!(matches!(err, ProjectError::Validation(_)));
    assert!(!path.exists());
}

#[test]
fn load_rejects_unknown_current_mode() {
    let path = temp_path("bad_mode.yaml");
    let yaml = "version: 1\nname: bad\ngenerator:\n  target_voltage: 80.0\n  current_mode: I25\n  on_time: 3.0\n  off_time: 80.0\n";
    std::fs::write(&path, yaml).unwrap();
    let err = load_yaml(&path).unwrap_err();
    assert!(matches!(err, ProjectError::Yaml(_)));
    assert!(err.to_string().contains("I25"));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn load_rejects_unknown_material() {
    let path = temp_path("bad_material.json");
    std::fs::write(
        &path,
        r#"{"version": 1, "name": "m", "environment": {"wire_material": "unobtainium"}}"#,
    )
    .unwrap();
    let err = load_json(&path).unwrap_err();
    assert!(matches!(
        err,
        ProjectError::Validation(ValidationError::UnknownMaterial { .. })
    ));
    let _ = std::fs::remove_file(&path);
}
