use page_voice::config::{Config, EngineKind};
use page_voice::error::JobError;

#[test]
fn parse_example_config() {
    let raw = include_str!("../page-voice.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert_eq!(cfg.job.engine, EngineKind::Offline);
    assert_eq!(cfg.job.rate, 160);
    assert_eq!(cfg.job.chunk_size, 3500);
    assert!(!cfg.job.out_dir.as_os_str().is_empty());
    cfg.job.validate().expect("example config is valid");
}

#[test]
fn missing_sections_use_defaults() {
    let cfg: Config = toml::from_str("[job]\nengine = \"remote\"\n").expect("parse TOML");
    assert_eq!(cfg.job.engine, EngineKind::Remote);
    assert_eq!(cfg.job.rate, 160);
    assert_eq!(cfg.remote.lang, "en");
    assert_eq!(cfg.offline.program, "espeak-ng");
}

#[test]
fn unknown_engine_is_a_parse_error() {
    assert!(toml::from_str::<Config>("[job]\nengine = \"pyttsx3\"\n").is_err());
}

#[test]
fn bounds_are_inclusive() {
    let mut cfg = Config::default();
    for rate in [80, 300] {
        cfg.job.rate = rate;
        assert!(cfg.job.validate().is_ok());
    }
    cfg.job.rate = 160;
    for size in [1000, 15000] {
        cfg.job.chunk_size = size;
        assert!(cfg.job.validate().is_ok());
    }
    cfg.job.chunk_size = 500;
    assert!(matches!(cfg.job.validate(), Err(JobError::Config(_))));
}

#[test]
fn unicode_normalization_is_opt_in() {
    assert!(!Config::default().extract.normalize_unicode);
    let raw = include_str!("../page-voice.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert!(!cfg.extract.normalize_unicode);
    let cfg: Config = toml::from_str("[extract]\nnormalize_unicode = true\n").expect("parse TOML");
    assert!(cfg.extract.normalize_unicode);
}
