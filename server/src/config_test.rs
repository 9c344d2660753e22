use super::*;

// =============================================================================
// env_parse
// =============================================================================

#[test]
fn env_parse_missing_returns_default() {
    let val: usize = env_parse("__TEST_NONEXISTENT_KEY_12345__", 42);
    assert_eq!(val, 42);
}

#[test]
fn env_parse_present_valid() {
    unsafe { std::env::set_var("__TEST_EP_VALID__", "99") };
    let val: usize = env_parse("__TEST_EP_VALID__", 0);
    assert_eq!(val, 99);
    unsafe { std::env::remove_var("__TEST_EP_VALID__") };
}

#[test]
fn env_parse_present_invalid_returns_default() {
    unsafe { std::env::set_var("__TEST_EP_INVALID__", "notanumber") };
    let val: usize = env_parse("__TEST_EP_INVALID__", 7);
    assert_eq!(val, 7);
    unsafe { std::env::remove_var("__TEST_EP_INVALID__") };
}

// =============================================================================
// PersistConfig
// =============================================================================

#[test]
fn persist_config_defaults_match_constants() {
    unsafe {
        std::env::remove_var("PERSIST_RETRIES");
        std::env::remove_var("PERSIST_RETRY_BASE_MS");
    }
    let config = PersistConfig::from_env();
    assert_eq!(config, PersistConfig::default());
    assert_eq!(config.retries, DEFAULT_PERSIST_RETRIES);
    assert_eq!(config.retry_base_ms, DEFAULT_PERSIST_RETRY_BASE_MS);
}
