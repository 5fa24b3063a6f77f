#[path = "integration/common.rs"]
mod common;
#[path = "integration/security_violations_test.rs"]
mod security_violations_test;
