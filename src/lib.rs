pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod dsp;
pub mod server;
pub mod utils;

pub use adapters::{LocalStorage, SupabaseStorage};
pub use config::{CliArgs, ServerConfig, StorageMode};
pub use core::{AudioPipeline, ProcessingEngine};
pub use server::{build_router, serve, AppState};
pub use utils::error::{AppError, Result};
