use std::{fs, path::Path};

use clap::{Parser, ValueEnum};
use scamlens::{
    analyzers::{
        deepfake::DeepfakeClient,
        email::{analyze_headers, email_evidence},
        image::{analyze_image, image_evidence, ImageInput},
        message::{analyze_message, message_evidence},
        profile::{analyze_profile, profile_evidence, ProfileInput},
        video::{analyze_video, video_evidence, VideoInput},
    },
    config::load_config,
    core::{
        error::LensError,
        output::{write_session, OutputFormat},
        session::SessionManager,
        store::JsonFileStore,
        types::{ContactOrigin, ScanContext},
    },
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "scamlens",
    about = "Heuristic scam triage over messages, emails, profiles and media"
)]
struct Cli {
    /// Path to config file (TOML). Default: config/scamlens.toml
    #[arg(long)]
    config: Option<String>,
    /// Suspicious message text to analyze
    #[arg(long)]
    message: Option<String>,
    /// File containing the suspicious message text
    #[arg(long)]
    message_file: Option<String>,
    /// File containing raw email headers
    #[arg(long)]
    headers_file: Option<String>,
    /// Sender profile details (JSON file)
    #[arg(long)]
    profile_file: Option<String>,
    /// Shared image metadata (JSON file)
    #[arg(long)]
    image_file: Option<String>,
    /// Shared video metadata (JSON file)
    #[arg(long)]
    video_file: Option<String>,
    /// Raw video bytes to send for deepfake analysis (needs [deepfake] config)
    #[arg(long)]
    video_media: Option<String>,
    /// How the sender first made contact
    #[arg(long, value_enum)]
    origin: Option<OriginArg>,
    /// Session store path (overrides config)
    #[arg(long)]
    store: Option<String>,
    /// Output format for the report
    #[arg(long, default_value = "json", value_enum)]
    format: FormatArg,
    /// Optional report file path; stdout always gets the JSON session
    #[arg(long)]
    output: Option<String>,
    /// Increase verbosity (info, debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Optional log file path
    #[arg(long, default_value = "data/scamlens.log")]
    log_file: String,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OriginArg {
    Email,
    Dm,
    Social,
    Website,
    Phone,
    Other,
}

impl From<OriginArg> for ContactOrigin {
    fn from(value: OriginArg) -> Self {
        match value {
            OriginArg::Email => ContactOrigin::Email,
            OriginArg::Dm => ContactOrigin::DirectMessage,
            OriginArg::Social => ContactOrigin::SocialMedia,
            OriginArg::Website => ContactOrigin::Website,
            OriginArg::Phone => ContactOrigin::PhoneCall,
            OriginArg::Other => ContactOrigin::Other,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Json,
    Md,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Md => OutputFormat::Markdown,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), LensError> {
    let cli = Cli::parse();

    init_tracing(&cli)?;

    let cfg = load_config(cli.config.as_deref())?;
    let store_path = cli.store.clone().unwrap_or_else(|| cfg.store_path.clone());
    let store = JsonFileStore::new(Path::new(&store_path))?;
    let mut manager = SessionManager::new(Box::new(store));

    let context = ScanContext {
        origin: cli.origin.map(ContactOrigin::from),
        ..Default::default()
    };
    let session_id = manager.create_session(context);
    tracing::info!("session {} started", session_id);

    let message_text = match (&cli.message, &cli.message_file) {
        (Some(text), _) => Some(text.clone()),
        (None, Some(path)) => Some(read_input(path)?),
        (None, None) => None,
    };
    if let Some(text) = message_text {
        let analysis = analyze_message(&text);
        manager.add_evidence(message_evidence(&text, &analysis));
    }

    if let Some(path) = &cli.headers_file {
        let raw = read_input(path)?;
        let analysis = analyze_headers(&raw);
        manager.add_evidence(email_evidence(&raw, &analysis));
    }

    if let Some(path) = &cli.profile_file {
        let input: ProfileInput = parse_input(path)?;
        let analysis = analyze_profile(&input);
        manager.add_evidence(profile_evidence(&input, &analysis));
    }

    if let Some(path) = &cli.image_file {
        let input: ImageInput = parse_input(path)?;
        let analysis = analyze_image(&input);
        manager.add_evidence(image_evidence(&input, &analysis));
    }

    if let Some(path) = &cli.video_file {
        let input: VideoInput = parse_input(path)?;
        // Any provider failure just drops the deepfake signal; the metadata
        // heuristics still run.
        let verdict = if cfg.deepfake.enabled {
            match &cli.video_media {
                Some(media_path) => {
                    let bytes =
                        fs::read(media_path).map_err(|e| LensError::Config(e.to_string()))?;
                    let client = DeepfakeClient::new(&cfg.deepfake)?;
                    match client.analyze(bytes, &input.filename).await {
                        Ok(verdict) => Some(verdict),
                        Err(err) => {
                            tracing::warn!("deepfake analysis unavailable: {}", err);
                            None
                        }
                    }
                }
                None => None,
            }
        } else {
            None
        };
        let analysis = analyze_video(&input, verdict.as_ref());
        manager.add_evidence(video_evidence(&input, &analysis));
    }

    let session = manager
        .current_session()
        .ok_or(LensError::Unknown)?
        .clone();

    if let Some(out) = &cli.output {
        let out_path = Path::new(out);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| LensError::Config(e.to_string()))?;
        }
        write_session(&session, cli.format.into(), out_path)?;
        tracing::info!("report written to {}", out_path.display());
    }

    let json = serde_json::to_string_pretty(&session)?;
    println!("{json}");
    Ok(())
}

fn read_input(path: &str) -> Result<String, LensError> {
    fs::read_to_string(path).map_err(|e| LensError::Config(format!("{}: {}", path, e)))
}

fn parse_input<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, LensError> {
    let raw = read_input(path)?;
    serde_json::from_str(&raw).map_err(|e| LensError::Config(format!("{}: {}", path, e)))
}

fn init_tracing(cli: &Cli) -> Result<(), LensError> {
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let log_path = Path::new(&cli.log_file);
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent).map_err(|e| LensError::Config(e.to_string()))?;
    }
    if log_path.exists() {
        if let Ok(meta) = fs::metadata(log_path) {
            if meta.len() > 1_000_000 {
                let rotated = log_path.with_extension("log.1");
                let _ = fs::rename(log_path, rotated);
            }
        }
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|e| LensError::Config(e.to_string()))?;

    let file_layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(false);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| LensError::Config(e.to_string()))
}
