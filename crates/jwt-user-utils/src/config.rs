//! Configuration utilities

use std::path::PathBuf;

/// Load a `.env` file into the process environment if one exists.
///
/// Returns the path that was loaded. Variables already set in the
/// environment win over the file.
pub fn load_env() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => Some(path),
        Err(e) if e.not_found() => None,
        Err(e) => {
            tracing::warn!("Ignoring unreadable .env file: {}", e);
            None
        }
    }
}
