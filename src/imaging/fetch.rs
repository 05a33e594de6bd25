use async_trait::async_trait;
use log::info;

use super::ImageFile;
use crate::error::{TutorError, TutorResult};

/// Retrieves remote example images.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> TutorResult<ImageFile>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> TutorResult<ImageFile> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| TutorError::Fetch(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TutorError::Fetch(format!("HTTP {status}")));
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "image/jpeg".to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|err| TutorError::Fetch(err.to_string()))?;

        info!("Fetched example image {url} ({} bytes)", bytes.len());
        Ok(ImageFile::new(file_name_from_url(url), mime_type, bytes.to_vec()))
    }
}

/// Last path segment without the query string, or `example.jpg`.
pub fn file_name_from_url(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    match without_query.rsplit('/').next() {
        Some(name) if !name.is_empty() && !name.contains(':') => name.to_string(),
        _ => "example.jpg".to_string(),
    }
}
