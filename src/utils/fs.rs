use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Write-then-rename so downstream gates never observe a half-written
/// artifact.
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let parent = path.parent().ok_or_else(|| {
        anyhow::anyhow!("artifact path {} has no parent directory", path.display())
    })?;

    if !parent.exists() {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create artifact directory {}", parent.display()))?;
    }

    let tmp = path.with_extension("tmp");

    let mut file = fs::File::create(&tmp)
        .with_context(|| format!("cannot create staging file {}", tmp.display()))?;

    file.write_all(content)
        .with_context(|| format!("cannot write staging file {}", tmp.display()))?;

    file.sync_all()
        .with_context(|| format!("cannot sync staging file {}", tmp.display()))?;

    fs::rename(&tmp, path).with_context(|| {
        format!(
            "cannot move {} into place at {}",
            tmp.display(),
            path.display()
        )
    })?;

    Ok(())
}

/// Count non-blank lines of a text artifact, for progress logging.
pub fn count_lines(path: &Path) -> usize {
    fs::read_to_string(path)
        .map(|body| body.lines().filter(|l| !l.trim().is_empty()).count())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn atomic_write_creates_parents_and_leaves_no_tmp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out.txt");
        atomic_write(&path, b"a.example.com\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a.example.com\n");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn atomic_write_rejects_a_rootless_path() {
        let err = atomic_write(Path::new("/"), b"x").unwrap_err();
        assert!(err.to_string().contains("no parent directory"));
    }

    #[test]
    fn count_lines_skips_blanks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subs.txt");
        fs::write(&path, "a.example.com\n\n  \nb.example.com\n").unwrap();
        assert_eq!(count_lines(&path), 2);
    }
}
