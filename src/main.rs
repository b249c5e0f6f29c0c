use clap::Parser;
use repitch::config::{LogFormat, StorageMode};
use repitch::utils::error::ErrorSeverity;
use repitch::utils::{logger, validation::Validate};
use repitch::{
    AppError, AppState, AudioPipeline, CliArgs, LocalStorage, ProcessingEngine, ServerConfig,
    SupabaseStorage,
};

fn main() {
    let args = CliArgs::parse();

    let config = match ServerConfig::load(&args) {
        Ok(config) => config,
        Err(e) => {
            // Logging is not up yet at this point, so plain stderr.
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(exit_code(&e));
        }
    };

    match config.log_format {
        LogFormat::Text => logger::init_server_logger(args.verbose),
        LogFormat::Json => logger::init_json_logger(),
    }

    tracing::info!("Starting repitch server");
    if args.verbose {
        tracing::debug!("Resolved config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(exit_code(&e));
    }

    if args.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("❌ Failed to start async runtime: {}", e);
            eprintln!("❌ Failed to start async runtime: {}", e);
            std::process::exit(3);
        }
    };
    tracing::info!("⚙️ Runtime started with {} worker threads", config.workers);

    if let Err(e) = runtime.block_on(run(config, args.monitor)) {
        tracing::error!(
            "❌ Server failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());

        let code = exit_code(&e);
        if code > 0 {
            std::process::exit(code);
        }
    }
}

async fn run(config: ServerConfig, monitor: bool) -> repitch::Result<()> {
    let port = config.port;
    let workers = config.workers;

    match config.storage.clone() {
        StorageMode::Supabase { url, service_key } => {
            tracing::info!("📦 Using Supabase storage at {}", url);
            let storage = SupabaseStorage::new(reqwest::Client::new(), url, service_key);
            let pipeline = AudioPipeline::new(storage, config);
            let engine = ProcessingEngine::new_with_monitoring(pipeline, monitor);
            repitch::serve(AppState::new(engine, workers), port).await
        }
        StorageMode::Local { base_path } => {
            tracing::info!("📦 Using local storage at {}", base_path);
            let storage = LocalStorage::new(base_path);
            let pipeline = AudioPipeline::new(storage, config);
            let engine = ProcessingEngine::new_with_monitoring(pipeline, monitor);
            repitch::serve(AppState::new(engine, workers), port).await
        }
    }
}

fn exit_code(e: &AppError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}
