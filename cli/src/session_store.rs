//! Persists the cookie jar between runs.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use logbook_core::CookieJar;
use tracing::debug;

/// Load saved cookies; a missing file is an empty jar.
pub fn load(path: &Path) -> Result<CookieJar> {
    if !path.exists() {
        return Ok(CookieJar::new());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read session file {}", path.display()))?;
    let jar = serde_json::from_str(&raw)
        .with_context(|| format!("session file {} is corrupt", path.display()))?;
    debug!(path = %path.display(), "loaded saved session");
    Ok(jar)
}

/// Save cookies, removing the file when nothing is left to remember.
pub fn save(path: &Path, jar: &CookieJar) -> Result<()> {
    if jar.is_empty() {
        if path.exists() {
            fs::remove_file(path)
                .with_context(|| format!("failed to remove session file {}", path.display()))?;
        }
        return Ok(());
    }
    let raw = serde_json::to_string_pretty(jar)?;
    fs::write(path, raw).with_context(|| format!("failed to write session file {}", path.display()))?;
    Ok(())
}
