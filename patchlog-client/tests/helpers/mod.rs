//! Shared helpers for patchlog-client integration tests

pub mod test_store;
