//! Integration tests for kontent-sync-http
//!
//! Uses wiremock to simulate the Sync API and verifies end-to-end behavior
//! of the reqwest transport driven by the core sync client: initialization,
//! delta paging, error classification, retries and cancellation.


mod test_delta;
mod test_errors;
mod test_init;
mod test_registry;
mod test_retry;
