use impulse2d::{
    GridConfig, GridPhysicsManager, PhysicsConfig, PhysicsError, PhysicsManager, Simulation, Vec2,
};

#[test]
fn missing_fields_take_defaults() {
    let config: PhysicsConfig =
        serde_json::from_str(r#"{ "tick_rate": 120, "gravity": 9.8 }"#).unwrap();
    assert_eq!(config.tick_rate, 120);
    assert_eq!(config.gravity, 9.8);
    assert_eq!(config.global_friction, 0.0);
    assert_eq!(config.gravity_center, None);
    assert_eq!(config.gravity_center_scale, 20_000.0);
    assert_eq!(config.resting_threshold, 0.01);

    let grid: GridConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(grid, GridConfig::default());
}

#[test]
fn gravity_center_parses_as_point() {
    let text = r#"{ "gravity": 1.0, "gravity_center": { "x": 640.0, "y": 360.0 } }"#;
    let config: PhysicsConfig = serde_json::from_str(text).unwrap();
    assert_eq!(config.gravity_center, Some(Vec2::new(640.0, 360.0)));
}

#[test]
fn config_round_trips_through_json() {
    let config = PhysicsConfig {
        global_friction: 0.3,
        gravity_center: Some(Vec2::new(1.0, -1.0)),
        ..Default::default()
    };
    let text = serde_json::to_string(&config).unwrap();
    let parsed: PhysicsConfig = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn invalid_config_is_rejected_on_construction() {
    let config: PhysicsConfig = serde_json::from_str(r#"{ "tick_rate": 0 }"#).unwrap();
    assert!(matches!(PhysicsManager::new(config), Err(PhysicsError::InvalidConfig(_))));

    let grid: GridConfig = serde_json::from_str(r#"{ "columns": 0 }"#).unwrap();
    assert!(matches!(
        GridPhysicsManager::new(PhysicsConfig::default(), grid),
        Err(PhysicsError::InvalidConfig(_))
    ));
}

#[test]
fn loaded_config_drives_the_manager() {
    let config: PhysicsConfig = serde_json::from_str(r#"{ "tick_rate": 30 }"#).unwrap();
    let manager = PhysicsManager::new(config).unwrap();
    assert_eq!(manager.tick_interval(), std::time::Duration::from_secs_f64(1.0 / 30.0));
}
