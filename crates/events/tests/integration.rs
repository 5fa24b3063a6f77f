#[path = "integration/common.rs"]
mod common;
#[path = "integration/dedup_test.rs"]
mod dedup_test;
