//! Main test entry point for openarchive-console

mod common;
mod integration;
mod unit;

use test_log::test;

/// Test that common utilities are available
#[test]
fn test_common_utilities() {
    use common::{fixtures, logging};
    use openarchive_console::models::Role;

    logging::init_test_logging();
    logging::log_test_step("Testing common utilities");

    let session = fixtures::session(Role::Auditor);
    assert_eq!(session.org_id(), Some(fixtures::ORG_ID));
    assert_eq!(fixtures::session(Role::SuperAdmin).org_id(), None);

    let config = fixtures::config_for("http://127.0.0.1:9");
    assert_eq!(config.page_size, 20);

    logging::log_test_step("Common utilities test completed");
}
