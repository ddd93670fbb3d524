use std::sync::Arc;

use crate::plugins::amass::Amass;
use crate::plugins::cloudenum::Cloudenum;
use crate::plugins::dirsearch::Dirsearch;
use crate::plugins::httpx::Httpx;
use crate::plugins::katana::Katana;
use crate::plugins::nuclei::Nuclei;
use crate::plugins::subfinder::Subfinder;
use crate::plugins::sublist3r::Sublist3r;
use crate::plugins::types::Adapter;
use crate::plugins::urlfinder::Urlfinder;
use crate::plugins::waybackurls::Waybackurls;
use crate::plugins::waymore::Waymore;

/// The adapters the scheduler drives, grouped by pipeline phase. Fields are
/// public so tests can substitute fakes without touching the scheduler.
pub struct AdapterRegistry {
    pub discovery: Vec<Arc<dyn Adapter>>,
    pub liveness: Arc<dyn Adapter>,
    pub content: Vec<Arc<dyn Adapter>>,
    pub archive: Vec<Arc<dyn Adapter>>,
    pub cloud: Arc<dyn Adapter>,
    pub vuln: Arc<dyn Adapter>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self {
            discovery: vec![Arc::new(Subfinder), Arc::new(Amass), Arc::new(Sublist3r)],
            liveness: Arc::new(Httpx),
            content: vec![Arc::new(Dirsearch), Arc::new(Katana), Arc::new(Urlfinder)],
            archive: vec![Arc::new(Waybackurls), Arc::new(Waymore)],
            cloud: Arc::new(Cloudenum),
            vuln: Arc::new(Nuclei),
        }
    }
}
