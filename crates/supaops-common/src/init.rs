//! Global initialization utilities for the application

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize the application environment
///
/// Called once at process start to load environment variables from a
/// `.env` file (searching upward from the current directory). The script
/// corpus read env vars ad hoc per script; here loading happens exactly
/// once, before configuration is resolved.
///
/// Safe to call multiple times - will only run once
pub fn initialize_environment() {
    INIT.call_once(|| {
        dotenvy::dotenv().ok();
    });
}
