//! Integration tests for binary-ledger

mod common;

mod admin_test;
mod concurrency_test;
mod custody_test;
mod lifecycle_test;
mod replay_test;
