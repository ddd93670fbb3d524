use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::config::types::{
    ExecutionPolicy, GateStrictness, GlobalConfig, ScanMode, ToolId,
};

/// Environment variable naming a JSON override file (written by an external
/// control surface). Malformed content is logged and ignored, never fatal.
pub const CONFIG_ENV: &str = "RECON_TOOL_CONFIG";

/// Partial overrides applied field-by-field on top of defaults + preset.
/// `tools_enabled` merges key-by-key rather than replacing the whole map.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(default)]
    pub tools_enabled: Option<HashMap<ToolId, bool>>,
    #[serde(default)]
    pub execution: Option<ExecutionOverride>,
    #[serde(default)]
    pub concurrency: Option<ConcurrencyOverride>,
    #[serde(default)]
    pub amass: Option<AmassOverride>,
    #[serde(default)]
    pub sublist3r: Option<Sublist3rOverride>,
    #[serde(default)]
    pub dirsearch: Option<DirsearchOverride>,
    #[serde(default)]
    pub waymore: Option<WaymoreOverride>,
    #[serde(default)]
    pub nuclei: Option<NucleiOverride>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutionOverride {
    pub policy: Option<ExecutionPolicy>,
    pub gate: Option<GateStrictness>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConcurrencyOverride {
    pub content_group: Option<usize>,
    pub archive_group: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AmassOverride {
    pub passive: Option<bool>,
    pub bruteforce: Option<bool>,
    pub wordlist: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sublist3rOverride {
    pub bruteforce: Option<bool>,
    pub threads: Option<u32>,
    pub engines: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirsearchOverride {
    pub wordlist: Option<PathBuf>,
    pub threads: Option<u32>,
    pub max_rate: Option<u32>,
    pub extensions: Option<String>,
    pub match_codes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaymoreOverride {
    pub mode: Option<String>,
    pub limit: Option<u32>,
    pub max_domains: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NucleiOverride {
    pub wordlist_file: Option<PathBuf>,
    pub rescan_after_archive: Option<bool>,
}

impl ConfigOverrides {
    pub fn apply(self, config: &mut GlobalConfig) {
        if let Some(enabled) = self.tools_enabled {
            for (tool, flag) in enabled {
                config.tools.set_enabled(tool, flag);
            }
        }
        if let Some(execution) = self.execution {
            if let Some(policy) = execution.policy {
                config.execution.policy = policy;
            }
            if let Some(gate) = execution.gate {
                config.execution.gate = gate;
            }
        }
        if let Some(concurrency) = self.concurrency {
            if let Some(content) = concurrency.content_group {
                config.concurrency.content_group = content;
            }
            if let Some(archive) = concurrency.archive_group {
                config.concurrency.archive_group = archive;
            }
        }
        if let Some(amass) = self.amass {
            let cfg = &mut config.tools.amass;
            if let Some(passive) = amass.passive {
                cfg.passive = passive;
            }
            if let Some(bruteforce) = amass.bruteforce {
                cfg.bruteforce = bruteforce;
            }
            if amass.wordlist.is_some() {
                cfg.wordlist = amass.wordlist;
            }
            if amass.config_file.is_some() {
                cfg.config_file = amass.config_file;
            }
        }
        if let Some(sublist3r) = self.sublist3r {
            let cfg = &mut config.tools.sublist3r;
            if let Some(bruteforce) = sublist3r.bruteforce {
                cfg.bruteforce = bruteforce;
            }
            if sublist3r.threads.is_some() {
                cfg.threads = sublist3r.threads;
            }
            if sublist3r.engines.is_some() {
                cfg.engines = sublist3r.engines;
            }
        }
        if let Some(dirsearch) = self.dirsearch {
            let cfg = &mut config.tools.dirsearch;
            if dirsearch.wordlist.is_some() {
                cfg.wordlist = dirsearch.wordlist;
            }
            if let Some(threads) = dirsearch.threads {
                cfg.threads = threads;
            }
            if dirsearch.max_rate.is_some() {
                cfg.max_rate = dirsearch.max_rate;
            }
            if let Some(extensions) = dirsearch.extensions {
                cfg.extensions = extensions;
            }
            if let Some(match_codes) = dirsearch.match_codes {
                cfg.match_codes = match_codes;
            }
        }
        if let Some(waymore) = self.waymore {
            let cfg = &mut config.tools.waymore;
            if let Some(mode) = waymore.mode {
                cfg.mode = mode;
            }
            if let Some(limit) = waymore.limit {
                cfg.limit = limit;
            }
            if let Some(max_domains) = waymore.max_domains {
                cfg.max_domains = max_domains;
            }
        }
        if let Some(nuclei) = self.nuclei {
            let cfg = &mut config.tools.nuclei;
            if nuclei.wordlist_file.is_some() {
                cfg.wordlist_file = nuclei.wordlist_file;
            }
            if let Some(rescan) = nuclei.rescan_after_archive {
                cfg.rescan_after_archive = rescan;
            }
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Layered build: compiled defaults -> mode preset -> env-referenced JSON
    /// override file. Later layers win field-by-field.
    pub fn load(mode: ScanMode) -> GlobalConfig {
        let mut config = GlobalConfig::default();
        mode.apply(&mut config.tools);
        tracing::info!("using '{:?}' mode: {}", mode, mode.describe());

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = Path::new(&path);
            if path.exists() {
                match Self::read_overrides(path) {
                    Ok(overrides) => {
                        tracing::info!("applying config overrides from {}", path.display());
                        overrides.apply(&mut config);
                    }
                    Err(err) => {
                        tracing::warn!(
                            "ignoring malformed override file {}: {:#}",
                            path.display(),
                            err
                        );
                    }
                }
            }
        }

        config
    }

    pub fn read_overrides(path: &Path) -> Result<ConfigOverrides> {
        let body = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&body)
            .with_context(|| format!("failed to parse {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn overrides_merge_enabled_map_key_by_key() {
        let mut config = GlobalConfig::default();
        ScanMode::Full.apply(&mut config.tools);

        let overrides: ConfigOverrides = serde_json::from_str(
            r#"{"tools_enabled": {"amass": false, "waymore": false}}"#,
        )
        .unwrap();
        overrides.apply(&mut config);

        assert!(!config.tools.enabled(ToolId::Amass));
        assert!(!config.tools.enabled(ToolId::Waymore));
        // untouched keys keep their preset value
        assert!(config.tools.enabled(ToolId::Dirsearch));
        assert!(config.tools.enabled(ToolId::Subfinder));
    }

    #[test]
    fn tool_specific_fields_override_field_by_field() {
        let mut config = GlobalConfig::default();
        let overrides: ConfigOverrides = serde_json::from_str(
            r#"{"dirsearch": {"threads": 12}, "nuclei": {"wordlist_file": "/tmp/wl.txt"}}"#,
        )
        .unwrap();
        overrides.apply(&mut config);

        assert_eq!(config.tools.dirsearch.threads, 12);
        // sibling fields keep their defaults
        assert_eq!(config.tools.dirsearch.match_codes, "200,301,302,403,405,500");
        assert_eq!(
            config.tools.nuclei.wordlist_file,
            Some(PathBuf::from("/tmp/wl.txt"))
        );
    }

    #[test]
    fn unknown_tool_key_rejects_the_override_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("override.json");
        std::fs::write(&path, r#"{"tools_enabled": {"subfindr": true}}"#).unwrap();
        assert!(ConfigLoader::read_overrides(&path).is_err());
    }

    #[test]
    fn malformed_json_rejects_the_override_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("override.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(ConfigLoader::read_overrides(&path).is_err());
    }
}
