use regex::Regex;
use std::sync::OnceLock;

/// Name of the per-run log file, timestamped at run start.
pub fn run_log_name() -> String {
    chrono::Local::now().format("recon_%Y%m%d_%H%M%S.log").to_string()
}

/// Replace characters that aren't safe for filenames.
pub fn sanitize_component(value: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let re = UNSAFE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9\-_\.]").unwrap());
    re.replace_all(value, "_").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_component("scope targets!"), "scope_targets_");
        assert_eq!(sanitize_component("example_com"), "example_com");
    }

    #[test]
    fn log_name_has_fixed_prefix_and_extension() {
        let name = run_log_name();
        assert!(name.starts_with("recon_"));
        assert!(name.ends_with(".log"));
    }
}
