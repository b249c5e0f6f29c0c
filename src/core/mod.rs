pub mod engine;
pub mod pipeline;

pub use crate::domain::model::{
    AudioAnalysis, AudioClip, NoteEvent, ProcessRequest, ProcessedArtifacts, RenderedArtifacts,
};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;

pub use engine::ProcessingEngine;
pub use pipeline::AudioPipeline;
