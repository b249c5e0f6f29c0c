use crate::domain::model::{
    AudioAnalysis, AudioClip, ProcessRequest, ProcessedArtifacts, RenderedArtifacts,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Object storage. Paths are `bucket/key...`; the adapter decides what a
/// bucket means (a remote bucket, a local directory) and what a public URL
/// for an uploaded object looks like.
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn public_url(&self, path: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn audio_bucket(&self) -> &str;
    fn midi_bucket(&self) -> &str;
    fn processing_sample_rate(&self) -> u32;
    fn max_download_bytes(&self) -> usize;
    fn request_timeout_secs(&self) -> u64;
}

/// The four stages a processing request moves through.
#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn fetch(&self, request: &ProcessRequest) -> Result<AudioClip>;
    async fn analyze(&self, clip: &AudioClip) -> Result<AudioAnalysis>;
    async fn render(
        &self,
        clip: &AudioClip,
        analysis: &AudioAnalysis,
        request: &ProcessRequest,
    ) -> Result<RenderedArtifacts>;
    async fn publish(
        &self,
        request: &ProcessRequest,
        artifacts: RenderedArtifacts,
    ) -> Result<ProcessedArtifacts>;
}
