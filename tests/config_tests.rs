use scorefold::{Config, DEFAULT_BATCH_SIZE, Error};

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    assert_eq!(config.batch_size, 20);
    assert!(config.source_addr.is_none());
    assert!(config.event_name.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_builder() {
    let config = Config::builder()
        .batch_size(5)
        .source_addr("http://live-test-scores.herokuapp.com/scores")
        .event_name("score")
        .build()
        .unwrap();
    assert_eq!(config.batch_size, 5);
    assert_eq!(
        config.source_addr.as_deref(),
        Some("http://live-test-scores.herokuapp.com/scores")
    );
    assert_eq!(config.event_name.as_deref(), Some("score"));
}

#[test]
fn test_zero_batch_size_rejected() {
    let err = Config::builder().batch_size(0).build().unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
    assert!(err.to_string().contains("batch_size"));
}

#[test]
fn test_from_vars() {
    let config = Config::from_vars([
        ("SCOREFOLD_BATCH_SIZE", " 40 "),
        ("SCOREFOLD_SOURCE_ADDR", "http://localhost:9000/scores"),
        ("SCOREFOLD_EVENT_NAME", "score"),
        ("PATH", "/usr/bin"),
    ])
    .unwrap();
    assert_eq!(config.batch_size, 40);
    assert_eq!(config.source_addr.as_deref(), Some("http://localhost:9000/scores"));
    assert_eq!(config.event_name.as_deref(), Some("score"));
}

#[test]
fn test_from_vars_empty_is_default() {
    let config = Config::from_vars(Vec::<(String, String)>::new()).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_from_vars_bad_batch_size() {
    let err = Config::from_vars([("SCOREFOLD_BATCH_SIZE", "many")]).unwrap_err();
    assert!(err.to_string().contains("SCOREFOLD_BATCH_SIZE"), "{err}");
    assert!(Config::from_vars([("SCOREFOLD_BATCH_SIZE", "0")]).is_err());
}

#[test]
fn test_deserialize_partial() {
    let config: Config = serde_json::from_str(r#"{"batch_size": 8}"#).unwrap();
    assert_eq!(config.batch_size, 8);
    assert!(config.source_addr.is_none());
}
