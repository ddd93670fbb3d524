use std::fs;
use std::path::Path;

use crate::core::models::{ArtifactKind, ArtifactSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Pass,
    Blocked { missing: ArtifactKind },
}

/// The canonical usability predicate: the path exists and has size > 0.
/// Evaluated fresh on every call, never cached.
pub fn artifact_usable(path: Option<&Path>) -> bool {
    match path {
        Some(p) => fs::metadata(p).map(|m| m.is_file() && m.len() > 0).unwrap_or(false),
        None => false,
    }
}

/// Check every required artifact immediately before launching a stage.
/// Reports the first missing prerequisite by kind so diagnostics can name it.
pub fn check(set: &ArtifactSet, required: &[ArtifactKind]) -> GateOutcome {
    for kind in required {
        if !artifact_usable(set.get(*kind)) {
            return GateOutcome::Blocked { missing: *kind };
        }
    }
    GateOutcome::Pass
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn missing_path_is_unusable() {
        assert!(!artifact_usable(Some(Path::new("/nonexistent/file.txt"))));
        assert!(!artifact_usable(None));
    }

    #[test]
    fn empty_file_is_unusable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        File::create(&path).unwrap();
        assert!(!artifact_usable(Some(&path)));
    }

    #[test]
    fn non_empty_file_passes_independent_of_call_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subs.txt");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "a.example.com").unwrap();
        assert!(artifact_usable(Some(&path)));
        assert!(artifact_usable(Some(&path)));
        // a gate that passed earlier must fail once the artifact is gone
        std::fs::remove_file(&path).unwrap();
        assert!(!artifact_usable(Some(&path)));
    }

    #[test]
    fn check_names_the_first_missing_artifact() {
        let dir = tempdir().unwrap();
        let merged = dir.path().join("merged.txt");
        std::fs::write(&merged, "a.example.com\n").unwrap();
        let set = ArtifactSet {
            merged_subdomains: Some(merged),
            alive_urls: None,
            alive_subdomains: Some(PathBuf::from("/nonexistent")),
            urls: None,
        };
        assert_eq!(
            check(&set, &[ArtifactKind::MergedSubdomains]),
            GateOutcome::Pass
        );
        assert_eq!(
            check(&set, &[ArtifactKind::MergedSubdomains, ArtifactKind::AliveSubdomains]),
            GateOutcome::Blocked { missing: ArtifactKind::AliveSubdomains }
        );
    }
}
