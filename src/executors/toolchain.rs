use which::which;

use crate::config::types::{ToolsConfig, ToolId};

/// Probe every enabled tool binary before the run. A missing binary is a
/// warning, not a bailout: the stage will record a tool-local failure and the
/// rest of the pipeline continues.
pub fn check_tools(tools: &ToolsConfig) -> Vec<ToolId> {
    let mut missing = Vec::new();

    for tool in ToolsConfig::all() {
        if !tools.enabled(*tool) {
            continue;
        }
        match which(tool.binary()) {
            Ok(path) => {
                tracing::debug!("found {}: {:?}", tool.binary(), path);
            }
            Err(_) => {
                tracing::warn!(
                    "[{}] binary '{}' not found in PATH; its stage will fail",
                    tool,
                    tool.binary()
                );
                missing.push(*tool);
            }
        }
    }

    if missing.is_empty() {
        tracing::info!("all enabled tool binaries found");
    }
    missing
}
