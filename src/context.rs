use std::sync::Arc;

use crate::config::Config;
use crate::health::HealthProbe;
use crate::media::DiskAttachmentStore;
use crate::pipeline::MessagePipeline;

/// Application context containing shared dependencies of the HTTP handlers
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub pipeline: MessagePipeline,
    /// Serves `GET /media/{object}`
    pub media: Arc<DiskAttachmentStore>,
    pub health_probes: Vec<Arc<dyn HealthProbe>>,
}

impl AppContext {
    pub fn new(
        config: Arc<Config>,
        pipeline: MessagePipeline,
        media: Arc<DiskAttachmentStore>,
        health_probes: Vec<Arc<dyn HealthProbe>>,
    ) -> Self {
        Self {
            config,
            pipeline,
            media,
            health_probes,
        }
    }
}
