use std::time::Duration;

use async_trait::async_trait;
use log::info;

use crate::error::TutorResult;

/// Image enhancement service: image URL in, image URL out.
#[async_trait]
pub trait Enhancer: Send + Sync {
    async fn enhance(&self, image_url: &str) -> TutorResult<String>;
}

/// Stand-in for a real enhancement backend: waits, then hands the input back
/// unchanged.
pub struct DelayedEcho {
    delay: Duration,
}

impl DelayedEcho {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Enhancer for DelayedEcho {
    async fn enhance(&self, image_url: &str) -> TutorResult<String> {
        info!("Simulating image enhancement ({} chars)", image_url.len());
        tokio::time::sleep(self.delay).await;
        info!("Enhancement simulation complete");
        Ok(image_url.to_string())
    }
}
