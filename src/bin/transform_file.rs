use clap::Parser;
use repitch::domain::model::{MAX_DESIRED_TEMPO, MIN_DESIRED_TEMPO};
use repitch::dsp;
use repitch::utils::error::{AppError, ErrorSeverity};
use repitch::utils::logger;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "transform-file")]
#[command(about = "Offline audio tool: analyze a WAV, retune it, and export MIDI")]
struct Args {
    /// Input WAV file
    input: PathBuf,

    /// Target tempo in BPM
    #[arg(long)]
    tempo: Option<f32>,

    /// Target key, e.g. "D Minor"
    #[arg(long)]
    key: Option<String>,

    /// Output directory (defaults to the input file's directory)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Only report the estimated tempo and key, write nothing
    #[arg(long)]
    analyze_only: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    logger::init_server_logger(args.verbose);

    if let Err(e) = run(&args) {
        tracing::error!(
            "❌ Transform failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        // A one-shot run has no partial success: a failure wrote nothing,
        // so even low-severity errors exit non-zero.
        std::process::exit(exit_code.max(1));
    }
}

fn run(args: &Args) -> repitch::Result<()> {
    if let Some(tempo) = args.tempo {
        if !tempo.is_finite() || !(MIN_DESIRED_TEMPO..=MAX_DESIRED_TEMPO).contains(&tempo) {
            return Err(AppError::ValidationError {
                field: "tempo".to_string(),
                message: format!(
                    "must be between {} and {} BPM",
                    MIN_DESIRED_TEMPO, MAX_DESIRED_TEMPO
                ),
            });
        }
    }

    tracing::info!("📁 Reading {}", args.input.display());
    let bytes = std::fs::read(&args.input)?;
    let clip = dsp::wav::decode_wav(&bytes)?;
    println!(
        "📥 Loaded {:.2}s of audio at {} Hz",
        clip.duration_secs(),
        clip.sample_rate
    );

    let tempo_bpm = dsp::tempo::estimate_tempo(&clip.samples, clip.sample_rate);
    let key = dsp::key::estimate_key(&clip.samples, clip.sample_rate);
    println!("🎼 Estimated tempo: {:.1} BPM", tempo_bpm);
    println!("🎼 Estimated key:   {}", key);

    if args.analyze_only {
        return Ok(());
    }

    let mut modified = clip.samples.clone();
    if let Some(tempo) = args.tempo {
        if (tempo - tempo_bpm).abs() / tempo_bpm > 1e-3 {
            let rate = tempo / tempo_bpm;
            println!("🎛 Stretching tempo {:.1} -> {:.1} BPM", tempo_bpm, tempo);
            modified = dsp::stretch::time_stretch(&modified, rate);
        } else {
            println!("🎛 Tempo already at {:.1} BPM, skipping stretch", tempo);
        }
    }
    if let Some(desired) = args.key.as_deref() {
        if !desired.is_empty() && desired != key {
            let steps = dsp::key::semitone_shift(&key, desired);
            println!("🎛 Shifting key {} -> {} ({:+} semitones)", key, desired, steps);
            modified = dsp::pitch::pitch_shift(&modified, steps as f32);
        }
    }

    let notes = dsp::transcribe::transcribe(&clip.samples, clip.sample_rate);
    println!("🎹 Transcribed {} note events", notes.len());

    let out_dir = match &args.out_dir {
        Some(dir) => dir.clone(),
        // A bare file name has an empty parent, which create_dir_all rejects.
        None => match args.input.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        },
    };
    std::fs::create_dir_all(&out_dir)?;

    let stem = args
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());

    let wav_path = out_dir.join(format!("modified_{}.wav", stem));
    let midi_path = out_dir.join(format!("midi_{}.mid", stem));

    let wav_bytes = dsp::wav::encode_wav_mono(&modified, clip.sample_rate)?;
    std::fs::write(&wav_path, wav_bytes)?;
    let midi_bytes = dsp::midi::encode_midi(&notes, tempo_bpm)?;
    std::fs::write(&midi_path, midi_bytes)?;

    println!("✅ Wrote {}", wav_path.display());
    println!("✅ Wrote {}", midi_path.display());
    Ok(())
}
