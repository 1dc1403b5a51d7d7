use proptest::prelude::*;
use wedm_materials::MaterialDatabase;
use wedm_project::EnvironmentConfig;

proptest! {
    #[test]
    fn json_roundtrip_is_field_for_field(
        workpiece_height in 0.1f64..100.0,
        wire_diameter in 0.02f64..0.5,
        dt in 1u64..10,
        servo_interval in 1u64..5000,
        initial_gap in 1.0f64..200.0,
        target_cutting_distance in 1.0f64..5000.0,
        max_wire_temperature in 300.0f64..3000.0,
        min_gap_for_operation in 0.0f64..10.0,
    ) {
        let config = EnvironmentConfig {
            workpiece_height,
            wire_diameter,
            wire_material: "brass".to_string(),
            dt,
            servo_interval,
            initial_gap,
            target_cutting_distance,
            max_wire_temperature,
            min_gap_for_operation,
        };
        config.validate(&MaterialDatabase::builtin()).unwrap();
        let json = config.to_json().unwrap();
        prop_assert_eq!(&EnvironmentConfig::from_json(&json).unwrap(), &config);
        let value = config.to_value().unwrap();
        prop_assert_eq!(EnvironmentConfig::from_value(value).unwrap(), config);
    }
}
