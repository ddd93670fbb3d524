use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Closed set of known tools. Configuration keyed by anything else is a
/// construction-time error, not a silently-ignored typo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolId {
    Subfinder,
    Amass,
    Sublist3r,
    Httpx,
    Dirsearch,
    Katana,
    Urlfinder,
    Waybackurls,
    Waymore,
    Cloudenum,
    Nuclei,
}

impl ToolId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolId::Subfinder => "subfinder",
            ToolId::Amass => "amass",
            ToolId::Sublist3r => "sublist3r",
            ToolId::Httpx => "httpx",
            ToolId::Dirsearch => "dirsearch",
            ToolId::Katana => "katana",
            ToolId::Urlfinder => "urlfinder",
            ToolId::Waybackurls => "waybackurls",
            ToolId::Waymore => "waymore",
            ToolId::Cloudenum => "cloudenum",
            ToolId::Nuclei => "nuclei",
        }
    }

    /// Binary the adapter spawns; differs from the tool id only for
    /// cloud_enum.
    pub fn binary(&self) -> &'static str {
        match self {
            ToolId::Cloudenum => "cloud_enum",
            _ => self.as_str(),
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionPolicy {
    /// Every enabled stage-3 tool runs one after another.
    Sequential,
    /// Stage-3 tools run in bounded concurrency groups with an archive phase
    /// after the main group.
    Parallel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GateStrictness {
    /// Hard gate on the alive-subdomains artifact before stage 3; absence
    /// aborts the run rather than silently scanning unfiltered input.
    Strict,
    /// Per-dependent-stage soft gates; a missing prerequisite skips only the
    /// stage that needs it.
    Lenient,
}

/// Coarse bundles of enable flags for a scan intensity level, mirroring the
/// three observed presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Discovery + liveness + vulnerability scan, without amass.
    Fast,
    /// Same but with amass for deeper enumeration.
    Standard,
    /// Everything, including content discovery, archives and cloud
    /// enumeration.
    Full,
}

impl ScanMode {
    pub fn describe(&self) -> &'static str {
        match self {
            ScanMode::Fast => "fast scan - discovery, alive check, nuclei",
            ScanMode::Standard => "standard scan - discovery (with amass), alive check, nuclei",
            ScanMode::Full => "full flow - all tools including content discovery",
        }
    }

    pub fn apply(&self, tools: &mut ToolsConfig) {
        let content_discovery = matches!(self, ScanMode::Full);
        tools.amass.enabled = !matches!(self, ScanMode::Fast);
        tools.dirsearch.enabled = content_discovery;
        tools.katana.enabled = content_discovery;
        tools.urlfinder.enabled = content_discovery;
        tools.waybackurls.enabled = content_discovery;
        tools.waymore.enabled = content_discovery;
        tools.cloudenum.enabled = content_discovery;
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    pub concurrency: ConcurrencyConfig,
    pub execution: ExecutionConfig,
    pub tools: ToolsConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            concurrency: ConcurrencyConfig::default(),
            execution: ExecutionConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConcurrencyConfig {
    /// Bound for the content-discovery/scan group under the parallel policy.
    pub content_group: usize,
    /// Bound for the archive-harvest group.
    pub archive_group: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self { content_group: 4, archive_group: 2 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutionConfig {
    pub policy: ExecutionPolicy,
    pub gate: GateStrictness,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            policy: ExecutionPolicy::Sequential,
            gate: GateStrictness::Strict,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    pub subfinder: SubfinderConfig,
    pub amass: AmassConfig,
    pub sublist3r: Sublist3rConfig,
    pub httpx: HttpxConfig,
    pub dirsearch: DirsearchConfig,
    pub katana: KatanaConfig,
    pub urlfinder: UrlfinderConfig,
    pub waybackurls: WaybackurlsConfig,
    pub waymore: WaymoreConfig,
    pub cloudenum: CloudenumConfig,
    pub nuclei: NucleiConfig,
}

impl ToolsConfig {
    pub fn enabled(&self, tool: ToolId) -> bool {
        match tool {
            ToolId::Subfinder => self.subfinder.enabled,
            ToolId::Amass => self.amass.enabled,
            ToolId::Sublist3r => self.sublist3r.enabled,
            ToolId::Httpx => self.httpx.enabled,
            ToolId::Dirsearch => self.dirsearch.enabled,
            ToolId::Katana => self.katana.enabled,
            ToolId::Urlfinder => self.urlfinder.enabled,
            ToolId::Waybackurls => self.waybackurls.enabled,
            ToolId::Waymore => self.waymore.enabled,
            ToolId::Cloudenum => self.cloudenum.enabled,
            ToolId::Nuclei => self.nuclei.enabled,
        }
    }

    pub fn set_enabled(&mut self, tool: ToolId, enabled: bool) {
        match tool {
            ToolId::Subfinder => self.subfinder.enabled = enabled,
            ToolId::Amass => self.amass.enabled = enabled,
            ToolId::Sublist3r => self.sublist3r.enabled = enabled,
            ToolId::Httpx => self.httpx.enabled = enabled,
            ToolId::Dirsearch => self.dirsearch.enabled = enabled,
            ToolId::Katana => self.katana.enabled = enabled,
            ToolId::Urlfinder => self.urlfinder.enabled = enabled,
            ToolId::Waybackurls => self.waybackurls.enabled = enabled,
            ToolId::Waymore => self.waymore.enabled = enabled,
            ToolId::Cloudenum => self.cloudenum.enabled = enabled,
            ToolId::Nuclei => self.nuclei.enabled = enabled,
        }
    }

    pub fn all() -> &'static [ToolId] {
        &[
            ToolId::Subfinder,
            ToolId::Amass,
            ToolId::Sublist3r,
            ToolId::Httpx,
            ToolId::Dirsearch,
            ToolId::Katana,
            ToolId::Urlfinder,
            ToolId::Waybackurls,
            ToolId::Waymore,
            ToolId::Cloudenum,
            ToolId::Nuclei,
        ]
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubfinderConfig {
    pub enabled: bool,
}

impl Default for SubfinderConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AmassConfig {
    pub enabled: bool,
    pub passive: bool,
    pub bruteforce: bool,
    pub wordlist: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
}

impl Default for AmassConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            passive: true,
            bruteforce: false,
            wordlist: None,
            config_file: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Sublist3rConfig {
    pub enabled: bool,
    pub bruteforce: bool,
    pub threads: Option<u32>,
    pub engines: Option<String>,
}

impl Default for Sublist3rConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bruteforce: false,
            threads: None,
            engines: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpxConfig {
    pub enabled: bool,
}

impl Default for HttpxConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirsearchConfig {
    pub enabled: bool,
    pub wordlist: Option<PathBuf>,
    pub threads: u32,
    pub max_rate: Option<u32>,
    pub extensions: String,
    pub match_codes: String,
}

impl Default for DirsearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            wordlist: None,
            threads: 5,
            max_rate: Some(30),
            extensions: "all".to_string(),
            match_codes: "200,301,302,403,405,500".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct KatanaConfig {
    pub enabled: bool,
    pub depth: u32,
    pub rate_limit: u32,
}

impl Default for KatanaConfig {
    fn default() -> Self {
        Self { enabled: true, depth: 3, rate_limit: 10 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct UrlfinderConfig {
    pub enabled: bool,
    pub rate_limit: u32,
}

impl Default for UrlfinderConfig {
    fn default() -> Self {
        Self { enabled: true, rate_limit: 20 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaybackurlsConfig {
    pub enabled: bool,
    pub max_domains: usize,
}

impl Default for WaybackurlsConfig {
    fn default() -> Self {
        Self { enabled: true, max_domains: 10 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaymoreConfig {
    pub enabled: bool,
    pub mode: String,
    pub limit: u32,
    pub max_domains: usize,
}

impl Default for WaymoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: "U".to_string(),
            limit: 200,
            max_domains: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CloudenumConfig {
    pub enabled: bool,
}

impl Default for CloudenumConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct NucleiConfig {
    pub enabled: bool,
    pub concurrency: u32,
    pub rate_limit: u32,
    pub wordlist_file: Option<PathBuf>,
    /// Parallel policy only: re-run nuclei after archive harvesting has
    /// enlarged the target set.
    pub rescan_after_archive: bool,
}

impl Default for NucleiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            concurrency: 20,
            rate_limit: 10,
            wordlist_file: None,
            rescan_after_archive: false,
        }
    }
}
