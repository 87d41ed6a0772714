use std::path::PathBuf;
use w3pi_physics::{IsolationCut, MaskPolicy, OrderingConfig, TrigMode};
use w3pi_pipeline::{ProcessorConfig, SortMode};

#[test]
fn loads_default_config_file() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("configs/default.toml");
    let config = ProcessorConfig::from_file(&path).expect("load default config");

    assert_eq!(config, ProcessorConfig::default());
    assert_eq!(config.sort_mode, SortMode::Partitioned);
    assert_eq!(config.trig, TrigMode::Lut);
    assert_eq!(config.selection.eta_cut, 550);
    assert_eq!(config.ordering, OrderingConfig::default());
    assert_eq!(config.ordering.sort_width(), 216);
    assert!((config.isolation.dr_max - 0.4).abs() < f64::EPSILON);
    assert!((config.isolation.dr_veto - 0.1).abs() < f64::EPSILON);
    assert_eq!(config.isolation.mask_policy, MaskPolicy::Cone);
    assert_eq!(config.isolation.cut, IsolationCut::SelfPt);
    assert!(!config.enable_isolation);
}

#[test]
fn missing_config_file_is_an_io_error() {
    let err = ProcessorConfig::from_file("/nonexistent/w3pi.toml").unwrap_err();
    assert!(matches!(err, w3pi_core::W3piError::IoError(_)));
}
