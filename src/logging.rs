use anyhow::{Context, Result};
use std::{fs::File, path::Path, sync::Mutex};
use tracing_subscriber::EnvFilter;

/// The terminal belongs to the presenter, so logs only ever go to a file.
/// Without a path nothing is installed and the macros are no-ops.
pub(crate) fn init(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_path_is_a_noop() {
        assert!(init(None).is_ok());
    }

    #[test]
    fn unwritable_path_is_reported() {
        let bad = Path::new("/nonexistent-rasterfx-dir/run.log");
        assert!(init(Some(bad)).is_err());
    }
}
