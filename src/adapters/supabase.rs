use crate::domain::ports::Storage;
use crate::utils::error::{AppError, Result};

/// Supabase Storage over its REST surface. Objects live at
/// `{base}/storage/v1/object/{bucket}/{key}` and the service key goes in a
/// bearer header; anon access to uploads happens through the `public`
/// URL variant.
#[derive(Debug, Clone)]
pub struct SupabaseStorage {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl SupabaseStorage {
    pub fn new(client: reqwest::Client, base_url: String, service_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}", self.base_url, path)
    }
}

fn content_type_for(path: &str) -> &'static str {
    let lower = path.to_ascii_lowercase();
    if lower.ends_with(".wav") {
        "audio/wav"
    } else if lower.ends_with(".mid") || lower.ends_with(".midi") {
        "audio/midi"
    } else {
        "application/octet-stream"
    }
}

impl Storage for SupabaseStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.object_url(path))
            .bearer_auth(&self.service_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::StorageError {
                message: format!("download of {} failed with {}: {}", path, status, body),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let response = self
            .client
            .post(self.object_url(path))
            .bearer_auth(&self.service_key)
            .header(reqwest::header::CONTENT_TYPE, content_type_for(path))
            .body(data.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::StorageError {
                message: format!("upload of {} failed with {}: {}", path, status, body),
            });
        }

        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}", self.base_url, path)
    }
}
