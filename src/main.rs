//! Voicebot - Voice-driven conversational assistant
//!
//! Listens for a phrase, decides whether it ends the session, opens
//! something, or goes to the language model, and speaks the answer.

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use voicebot::asr::{ListenParams, MicListener, WyomingClient};
use voicebot::config::{self, Config};
use voicebot::controller::{SessionEnd, TurnController};
use voicebot::dialogue::{DialogueSession, GeminiClient};
use voicebot::launcher::{NativeLauncher, OsFamily};
use voicebot::tts::system::SystemEngineFactory;
use voicebot::tts::{SpeechOutput, VoicePrefs};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Audio input device index
    #[arg(short, long)]
    device: Option<usize>,

    /// List audio input devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Wyoming ASR server host
    #[arg(long)]
    wyoming_host: Option<String>,

    /// Wyoming ASR server port
    #[arg(long)]
    wyoming_port: Option<u16>,

    /// Gemini model name
    #[arg(short, long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    dotenvy::dotenv().ok();

    let mut config = Config::load()?;
    if args.device.is_some() {
        config.audio_device = args.device;
    }
    if let Some(host) = args.wyoming_host {
        config.wyoming_host = host;
    }
    if let Some(port) = args.wyoming_port {
        config.wyoming_port = port;
    }
    if let Some(model) = args.model {
        config.gemini_model = model;
    }

    // Setup logging
    let level = if args.verbose {
        Level::DEBUG
    } else {
        config.log_level.parse().unwrap_or(Level::INFO)
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.list_devices {
        for (i, name) in voicebot::audio::list_input_devices()?.iter().enumerate() {
            println!("  [{}] {}", i, name);
        }
        return Ok(());
    }

    info!("🤖 Voicebot v{} starting...", env!("CARGO_PKG_VERSION"));

    // Missing credentials abort before the loop starts
    let api_key = config::api_key_from_env()?;

    let output = SpeechOutput::new(Box::new(SystemEngineFactory), VoicePrefs::from(&config))?;

    let model = GeminiClient::from_config(&config, &api_key);
    let session = DialogueSession::start(Box::new(model), &config.persona);
    info!("🧠 Conversation model: {}", config.gemini_model);

    let client = WyomingClient::new(&config.wyoming_host, config.wyoming_port);
    if !client.health_check().await {
        warn!(
            "⚠️ Wyoming server at {}:{} is not reachable yet; turns will be empty until it is",
            config.wyoming_host, config.wyoming_port
        );
    }
    let mut capture = MicListener::new(config.audio_device, client);

    let mut controller = TurnController::new(
        session,
        output,
        Box::new(NativeLauncher::new()),
        OsFamily::current(),
    );

    println!("\n=== AI Chatbot Started ===");
    println!("Say 'bye' to end the conversation.\n");

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            warn!("Could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    match controller
        .run_session(&mut capture, &ListenParams::from(&config), shutdown)
        .await
    {
        SessionEnd::Terminated => info!("✅ Session ended by user"),
        SessionEnd::Interrupted => info!("✅ Session interrupted"),
    }

    Ok(())
}
