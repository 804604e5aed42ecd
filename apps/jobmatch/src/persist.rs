use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::errors::PipelineError;

/// Writes `path` as a whole: content goes to a temp file in the same
/// directory, is synced, then renamed over the target. Readers see either
/// the old file or the new one, never a partial write.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<(), PipelineError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), PipelineError>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| PipelineError::Io(e.error))?;

    debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.csv");
        fs::write(&path, "old").unwrap();

        write_atomic(&path, |w| {
            w.write_all(b"new")?;
            Ok(())
        })
        .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_failed_write_leaves_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.csv");
        fs::write(&path, "old").unwrap();

        let result = write_atomic(&path, |w| {
            w.write_all(b"partial")?;
            Err(PipelineError::ArtifactMismatch("boom".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
        // the temp file is cleaned up on drop
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_creates_missing_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("vectorizer.json");
        write_atomic(&path, |w| {
            w.write_all(b"{}")?;
            Ok(())
        })
        .unwrap();
        assert!(path.exists());
    }
}
