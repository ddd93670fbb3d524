use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};

use crate::utils::fs::atomic_write;

/// Derive the URL list from raw liveness output: first whitespace token per
/// line, `https://` prefixed when schemeless. One URL per line, input order
/// preserved.
pub fn extract_urls(alive_file: &Path, dest: &Path) -> Result<usize> {
    let file = File::open(alive_file)
        .with_context(|| format!("failed to open liveness output {}", alive_file.display()))?;

    let mut body = String::new();
    let mut count = 0usize;
    for line in BufReader::new(file).lines() {
        let line = line.unwrap_or_default();
        if let Some(token) = line.split_whitespace().next() {
            let url = if token.starts_with("http://") || token.starts_with("https://") {
                token.to_string()
            } else {
                format!("https://{}", token)
            };
            body.push_str(&url);
            body.push('\n');
            count += 1;
        }
    }

    atomic_write(dest, body.as_bytes())?;
    Ok(count)
}

/// Derive the alive-subdomain list: host component only, deduplicated,
/// sorted.
pub fn extract_alive_hosts(alive_file: &Path, dest: &Path) -> Result<usize> {
    let file = File::open(alive_file)
        .with_context(|| format!("failed to open liveness output {}", alive_file.display()))?;

    let mut hosts: BTreeSet<String> = BTreeSet::new();
    for line in BufReader::new(file).lines() {
        let line = line.unwrap_or_default();
        if let Some(token) = line.split_whitespace().next() {
            let host = token
                .trim_start_matches("http://")
                .trim_start_matches("https://")
                .split('/')
                .next()
                .unwrap_or("")
                .to_string();
            if !host.is_empty() {
                hosts.insert(host);
            }
        }
    }

    let mut body = String::new();
    for host in &hosts {
        body.push_str(host);
        body.push('\n');
    }
    atomic_write(dest, body.as_bytes())?;
    Ok(hosts.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn urls_take_first_token_and_gain_scheme() {
        let dir = tempdir().unwrap();
        let alive = dir.path().join("httpx_alive_t.txt");
        std::fs::write(&alive, "https://a.example.com 200\nb.example.com [301]\n\n").unwrap();
        let dest = dir.path().join("urls_t.txt");
        let count = extract_urls(&alive, &dest).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            std::fs::read_to_string(&dest).unwrap(),
            "https://a.example.com\nhttps://b.example.com\n"
        );
    }

    #[test]
    fn hosts_are_deduplicated_and_sorted() {
        let dir = tempdir().unwrap();
        let alive = dir.path().join("httpx_alive_t.txt");
        std::fs::write(
            &alive,
            "https://b.example.com/login 200\nhttp://a.example.com 200\nhttps://b.example.com 301\n",
        )
        .unwrap();
        let dest = dir.path().join("subdomain_alive_t.txt");
        let count = extract_alive_hosts(&alive, &dest).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            std::fs::read_to_string(&dest).unwrap(),
            "a.example.com\nb.example.com\n"
        );
    }
}
