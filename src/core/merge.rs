use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::utils::fs::atomic_write;

#[derive(Debug)]
pub struct MergeReport {
    pub merged: PathBuf,
    /// Records counted per source *before* cross-source deduplication.
    pub per_source: Vec<(String, usize)>,
    pub total_before: usize,
    pub total_after: usize,
    pub duplicates_removed: usize,
}

/// Normalize one discovered record: trim, lowercase, strip scheme, truncate
/// at the first `/` and `?`. Records without a dot or containing spaces are
/// dropped, as are records that become empty.
pub fn normalize_host(line: &str) -> Option<String> {
    let mut host = line.trim().to_lowercase();
    if host.is_empty() || !host.contains('.') || host.contains(' ') {
        return None;
    }
    host = host
        .trim_start_matches("http://")
        .trim_start_matches("https://")
        .to_string();
    if let Some(idx) = host.find('/') {
        host.truncate(idx);
    }
    if let Some(idx) = host.find('?') {
        host.truncate(idx);
    }
    let host = host.trim();
    if host.is_empty() { None } else { Some(host.to_string()) }
}

/// Pure set union over N line-oriented source files, emitted in sorted
/// lexicographic order. Downstream stages rely on that ordering for
/// reproducible diffs; there is no first-writer-wins semantics.
pub fn merge<F>(sources: &[PathBuf], dest: &Path, normalize: F) -> Result<MergeReport>
where
    F: Fn(&str) -> Option<String>,
{
    let mut unique: BTreeSet<String> = BTreeSet::new();
    let mut per_source = Vec::new();

    for source in sources {
        let file = File::open(source)
            .with_context(|| format!("failed to open source file {}", source.display()))?;
        let label = source
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.split('_').next().unwrap_or(s).to_string())
            .unwrap_or_else(|| source.display().to_string());

        let mut count = 0usize;
        for line in BufReader::new(file).lines() {
            let line = line.unwrap_or_default();
            if let Some(record) = normalize(&line) {
                unique.insert(record);
                count += 1;
            }
        }
        per_source.push((label, count));
    }

    let total_before: usize = per_source.iter().map(|(_, c)| c).sum();
    let total_after = unique.len();

    let mut body = String::new();
    for record in &unique {
        body.push_str(record);
        body.push('\n');
    }
    atomic_write(dest, body.as_bytes())?;

    Ok(MergeReport {
        merged: dest.to_path_buf(),
        per_source,
        total_before,
        total_after,
        duplicates_removed: total_before.saturating_sub(total_after),
    })
}
