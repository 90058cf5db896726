//! Object storage adapter: resumable chunked upload with per-chunk progress.
//!
//! Protocol: initiate a resumable session (the provider answers with a session
//! URL in the Location header), then PUT sequential chunks with Content-Range
//! until the final chunk returns the stored object. Intermediate chunks are
//! acknowledged with 308.

use crate::domain::media::video_content_type;
use crate::domain::DomainError;
use crate::ports::{ProgressFn, StoragePort};
use serde::Deserialize;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

/// HTTP 308 as used by resumable uploads ("Resume Incomplete").
const RESUME_INCOMPLETE: u16 = 308;

pub struct ObjectStorageAdapter {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    chunk_size: usize,
}

impl ObjectStorageAdapter {
    /// # Arguments
    /// * `base_url` - storage API root, e.g. "https://firebasestorage.googleapis.com/v0"
    /// * `bucket` - bucket name videos are uploaded into
    /// * `chunk_size` - bytes per upload request
    pub fn new(base_url: String, bucket: String, chunk_size: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            bucket,
            chunk_size: chunk_size.max(1),
        }
    }

    async fn initiate_session(
        &self,
        dest_path: &str,
        content_type: &str,
        total: u64,
        token: &str,
    ) -> Result<String, DomainError> {
        let url = format!("{}/b/{}/o", self.base_url, self.bucket);
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .query(&[("uploadType", "resumable"), ("name", dest_path)])
            .header("X-Upload-Content-Type", content_type)
            .header("X-Upload-Content-Length", total.to_string())
            .send()
            .await
            .map_err(|e| DomainError::Storage(format!("initiate upload failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::Storage(format!(
                "initiate upload rejected {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| {
                DomainError::Storage("initiate upload: no session URL returned".to_string())
            })
    }

    fn download_url(&self, dest_path: &str) -> String {
        // Object names are path-encoded in the retrieval URL.
        let encoded = dest_path.replace('/', "%2F");
        format!(
            "{}/b/{}/o/{}?alt=media",
            self.base_url, self.bucket, encoded
        )
    }
}

#[derive(Deserialize)]
struct StoredObject {
    #[serde(rename = "mediaLink", default)]
    media_link: Option<String>,
}

/// Content-Range header value for one chunk.
fn content_range(offset: u64, len: u64, total: u64) -> String {
    format!("bytes {}-{}/{}", offset, offset + len - 1, total)
}

#[async_trait::async_trait]
impl StoragePort for ObjectStorageAdapter {
    async fn upload_video(
        &self,
        local: &Path,
        dest_path: &str,
        token: &str,
        on_progress: ProgressFn<'_>,
    ) -> Result<String, DomainError> {
        let total = tokio::fs::metadata(local)
            .await
            .map_err(|e| DomainError::Storage(format!("cannot read {}: {e}", local.display())))?
            .len();
        if total == 0 {
            return Err(DomainError::Storage(format!(
                "{} is empty",
                local.display()
            )));
        }

        let content_type = video_content_type(local).unwrap_or("video/mp4");
        let session_url = self
            .initiate_session(dest_path, content_type, total, token)
            .await?;
        debug!(path = %dest_path, total, "resumable upload session opened");

        let mut file = tokio::fs::File::open(local)
            .await
            .map_err(|e| DomainError::Storage(format!("cannot open {}: {e}", local.display())))?;

        let mut offset = 0u64;
        let mut buf = vec![0u8; self.chunk_size];
        let mut final_url = None;

        while offset < total {
            let read = file
                .read(&mut buf)
                .await
                .map_err(|e| DomainError::Storage(format!("read failed: {e}")))?;
            if read == 0 {
                return Err(DomainError::Storage(
                    "file truncated during upload".to_string(),
                ));
            }

            let chunk = buf[..read].to_vec();
            let response = self
                .client
                .put(&session_url)
                .header(
                    reqwest::header::CONTENT_RANGE,
                    content_range(offset, read as u64, total),
                )
                .body(chunk)
                .send()
                .await
                .map_err(|e| DomainError::Storage(format!("chunk upload failed: {e}")))?;

            let status = response.status();
            if status.as_u16() == RESUME_INCOMPLETE {
                // Intermediate chunk acknowledged.
            } else if status.is_success() {
                let stored: StoredObject = response.json().await.unwrap_or(StoredObject {
                    media_link: None,
                });
                final_url = Some(
                    stored
                        .media_link
                        .unwrap_or_else(|| self.download_url(dest_path)),
                );
            } else {
                let body = response.text().await.unwrap_or_default();
                return Err(DomainError::Storage(format!(
                    "chunk upload rejected {status}: {}",
                    body.chars().take(200).collect::<String>()
                )));
            }

            offset += read as u64;
            on_progress(offset, total);
        }

        let url = final_url.unwrap_or_else(|| self.download_url(dest_path));
        info!(path = %dest_path, bytes = total, "upload complete");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_range_covers_chunk_bounds() {
        assert_eq!(content_range(0, 100, 250), "bytes 0-99/250");
        assert_eq!(content_range(200, 50, 250), "bytes 200-249/250");
    }

    #[test]
    fn download_url_encodes_object_name() {
        let adapter = ObjectStorageAdapter::new(
            "https://storage.example/v0".to_string(),
            "bucket".to_string(),
            1024,
        );
        assert_eq!(
            adapter.download_url("videos/u1_clip.mp4"),
            "https://storage.example/v0/b/bucket/o/videos%2Fu1_clip.mp4?alt=media"
        );
    }
}
