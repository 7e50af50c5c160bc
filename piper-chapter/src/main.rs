//! piper-chapter - Synthesize a chapter of text into a tagged audio file with Piper TTS

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use piper_chapter::tts::RateValue;
use piper_chapter::{AudioTags, PiperChapterConfig, PiperProvider, ToneEngine};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "piper-chapter")]
#[command(about = "Synthesize a chapter of text into a tagged audio file with Piper TTS", long_about = None)]
#[command(version)]
struct Args {
    /// Enable debug output
    #[arg(short, long, global = true, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synthesize a text file into one audio file
    Synth(SynthArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Debug)]
struct SynthArgs {
    /// Path to the chapter text ("-" reads stdin)
    text_file: PathBuf,

    /// Output file path (default: <text-name>.<format>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Chapter index, written as the track number
    #[arg(long, default_value_t = 1)]
    index: usize,

    /// Chapter title (default: text file name)
    #[arg(long)]
    title: Option<String>,

    /// Book author, written as the artist tag
    #[arg(long)]
    author: Option<String>,

    /// Book title, written as the album tag
    #[arg(long)]
    book_title: Option<String>,

    /// Piper model (.onnx)
    #[arg(long)]
    model: Option<String>,

    /// Speaker id for multi-speaker models
    #[arg(long)]
    speaker: Option<String>,

    /// Speech rate multiplier (invalid values fall back to 1.0)
    #[arg(long)]
    rate: Option<String>,

    /// Output format (opus, mp3, m4a, flac, ogg, wav)
    #[arg(long)]
    format: Option<String>,

    /// Text language, used for chunking
    #[arg(long)]
    language: Option<String>,

    /// Maximum characters per chunk
    #[arg(long)]
    max_chars: Option<usize>,

    /// Generate test tones instead of running piper
    #[arg(long)]
    dry_run: bool,

    /// Fail if the output file could not be tagged
    #[arg(long)]
    require_tags: bool,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set the piper executable path
    SetPiper {
        /// Path to piper
        path: PathBuf,
    },
    /// Set the default model
    SetModel {
        /// Path to the .onnx model
        model: String,
    },
    /// Set the default speaker id
    SetSpeaker {
        /// Speaker id
        speaker: String,
    },
    /// Set the default speech rate
    SetRate {
        /// Rate multiplier (e.g. 1.2)
        rate: String,
    },
    /// Set the default output format
    SetFormat {
        /// Format name (opus, mp3, ...)
        format: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    match &args.command {
        Commands::Synth(synth_args) => synth(synth_args).await,
        Commands::Config { action } => handle_config_command(action),
    }
}

async fn synth(args: &SynthArgs) -> Result<()> {
    let mut config = PiperChapterConfig::load().context("Failed to load configuration")?;
    apply_overrides(&mut config, args);

    let text = read_text(&args.text_file)?;

    let provider = if args.dry_run {
        PiperProvider::with_engine(&config, Arc::new(ToneEngine::new()))
    } else {
        PiperProvider::new(&config)
    };
    provider.validate_config()?;

    let output = args.output.clone().unwrap_or_else(|| {
        default_output_path(&args.text_file, provider.output_file_extension())
    });
    let title = args
        .title
        .clone()
        .unwrap_or_else(|| file_title(&args.text_file));

    let mut tags = AudioTags::new(args.index, title);
    if let Some(ref author) = args.author {
        tags = tags.with_author(author);
    }
    if let Some(ref book_title) = args.book_title {
        tags = tags.with_book_title(book_title);
    }

    info!("Using {}", provider);
    info!(
        "Text: {} characters, estimated cost ${:.2}",
        text.chars().count(),
        provider.estimate_cost(text.chars().count())
    );

    let outcome = provider
        .text_to_speech(&text, &output, &tags)
        .await
        .context("Synthesis failed")?;

    eprintln!(
        "Output: {} ({} chunks, {:.1}s)",
        outcome.output.display(),
        outcome.chunks,
        outcome.duration.as_secs_f64()
    );

    if let Err(e) = outcome.tagging {
        if args.require_tags {
            return Err(e).context("Output was written but could not be tagged");
        }
        eprintln!("Warning: {}", e);
    }

    Ok(())
}

fn apply_overrides(config: &mut PiperChapterConfig, args: &SynthArgs) {
    if let Some(ref model) = args.model {
        config.voice.model = Some(model.clone());
    }
    if let Some(ref speaker) = args.speaker {
        config.voice.speaker = Some(speaker.clone());
    }
    if let Some(ref rate) = args.rate {
        config.voice.rate = Some(RateValue::Text(rate.clone()));
    }
    if let Some(ref format) = args.format {
        config.voice.output_format = Some(format.clone());
    }
    if let Some(ref language) = args.language {
        config.voice.language = Some(language.clone());
    }
    if let Some(max_chars) = args.max_chars {
        config.max_chunk_chars = max_chars;
    }
}

fn read_text(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        return std::io::read_to_string(std::io::stdin()).context("Failed to read text from stdin");
    }
    if !path.exists() {
        anyhow::bail!("Text file not found: {}", path.display());
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn default_output_path(text_file: &Path, extension: &str) -> PathBuf {
    if text_file == Path::new("-") {
        return PathBuf::from(format!("chapter.{}", extension));
    }
    text_file.with_extension(extension)
}

fn file_title(text_file: &Path) -> String {
    text_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty() && s != "-")
        .unwrap_or_else(|| "Chapter".to_string())
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    let mut config = PiperChapterConfig::load()?;

    match action {
        ConfigAction::Show => {
            println!("Configuration file: {:?}", PiperChapterConfig::config_path()?);
            println!();
            println!("piper_path = \"{}\"", config.piper_path.display());
            println!("ffmpeg_path = \"{}\"", config.ffmpeg_path.display());
            println!("max_chunk_chars = {}", config.max_chunk_chars);
            println!("pass_rate_and_pause = {}", config.pass_rate_and_pause);
            println!("voice = {}", config.voice());
            return Ok(());
        }
        ConfigAction::SetPiper { path } => config.piper_path = path.clone(),
        ConfigAction::SetModel { model } => config.voice.model = Some(model.clone()),
        ConfigAction::SetSpeaker { speaker } => config.voice.speaker = Some(speaker.clone()),
        ConfigAction::SetRate { rate } => config.voice.rate = Some(RateValue::Text(rate.clone())),
        ConfigAction::SetFormat { format } => config.voice.output_format = Some(format.clone()),
    }

    config.save()?;
    println!("Saved. Voice is now: {}", config.voice());
    Ok(())
}
