use async_trait::async_trait;

use crate::config::GlobalConfig;
use crate::config::types::ToolId;
use crate::core::models::{ArtifactKind, ArtifactSet, RunContext, StageResult};
use crate::executors::command::ProcessRunner;
use crate::plugins::types::{Adapter, conclude};

pub struct Subfinder;

#[async_trait]
impl Adapter for Subfinder {
    fn id(&self) -> ToolId {
        ToolId::Subfinder
    }

    fn requires(&self) -> &'static [ArtifactKind] {
        &[]
    }

    async fn run(
        &self,
        _inputs: &ArtifactSet,
        ctx: &RunContext,
        _config: &GlobalConfig,
    ) -> StageResult {
        let output = ctx.artifact_path("subfinder");
        let mut argv = vec!["subfinder".to_string()];
        match (ctx.target.domain(), ctx.target.domain_list()) {
            (Some(domain), _) => {
                argv.extend(["-d", domain, "-all", "-silent"].map(String::from));
            }
            (_, Some(list)) => {
                argv.extend(["-dL".to_string(), list.display().to_string()]);
                argv.extend(["-all", "-silent", "-recursive"].map(String::from));
            }
            _ => return StageResult::failed(self.id().as_str(), "no domain or domain list"),
        }

        let runner = ProcessRunner::new(ctx.clone());
        let ok = runner.run_to_file(self.id().as_str(), &argv, &output, false, false).await;
        conclude(self.id(), ok, output)
    }
}
