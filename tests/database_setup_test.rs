//! Test database setup behaviour when no database is reachable

mod helpers;

use serial_test::serial;

use helpers::*;

const UNREACHABLE_URL: &str = "not-a-database-url";

#[tokio::test]
#[serial]
#[should_panic(expected = "Failed to set up test database")]
async fn test_unreachable_database_fails_the_suite() {
    std::env::set_var("TEST_DATABASE_URL", UNREACHABLE_URL);
    std::env::remove_var(SKIP_DB_TESTS_VAR);

    let _ = TestDatabase::try_new().await;
}

#[tokio::test]
#[serial]
async fn test_unreachable_database_skips_when_opted_out() {
    std::env::set_var("TEST_DATABASE_URL", UNREACHABLE_URL);
    std::env::set_var(SKIP_DB_TESTS_VAR, "1");

    let db = TestDatabase::try_new().await;
    std::env::remove_var(SKIP_DB_TESTS_VAR);

    assert!(db.is_none());
}

#[test]
#[serial]
fn test_skip_flag_values() {
    std::env::set_var(SKIP_DB_TESTS_VAR, "0");
    assert!(!skip_database_tests());
    std::env::set_var(SKIP_DB_TESTS_VAR, "");
    assert!(!skip_database_tests());
    std::env::set_var(SKIP_DB_TESTS_VAR, "true");
    assert!(skip_database_tests());
    std::env::remove_var(SKIP_DB_TESTS_VAR);
    assert!(!skip_database_tests());
}
