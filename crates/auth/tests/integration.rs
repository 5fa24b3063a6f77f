#[path = "integration/common.rs"]
mod common;
#[path = "integration/login_test.rs"]
mod login_test;
#[path = "integration/user_management_test.rs"]
mod user_management_test;
