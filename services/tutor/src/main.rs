use anyhow::{Context, Result};
use clap::Parser;
use speakgenie_core::language::{SUPPORTED_LANGUAGES, find_language};
use speakgenie_core::scenario::Scenario;
use speakgenie_core::speech::{RecognitionError, SpeechBridge};
use speakgenie_core::tutor::{ConversationMode, TutorError, VoiceTutor};
use speakgenie_core::{Translator, TutorSession};
use speakgenie_service::config::Config;
use speakgenie_service::console_speech::{ConsoleRecognizer, ConsoleSynthesizer};
use std::sync::Arc;
use tracing_subscriber::fmt::time::ChronoLocal;

/// Practice spoken English with an AI tutor from the terminal.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Roleplay scenario id (school, store, home). Omit for free-flow conversation.
    #[arg(long)]
    scenario: Option<String>,

    /// Language the tutor answers in (en, hi, mr, gu, ta).
    #[arg(long, default_value = "en")]
    language: String,

    /// Print the available scenarios and languages, then exit.
    #[arg(long)]
    list_scenarios: bool,
}

fn print_catalogue() {
    println!("Scenarios:");
    for s in Scenario::all() {
        println!("  {:<8} {} - {}", s.id, s.title, s.description);
    }
    println!("Languages:");
    for l in SUPPORTED_LANGUAGES.iter() {
        println!("  {:<8} {}", l.code, l.name);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    if args.list_scenarios {
        print_catalogue();
        return Ok(());
    }

    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Configuration loaded successfully. Starting SpeakGenie tutor...");

    if find_language(&args.language).is_none() {
        tracing::warn!(
            "Language '{}' is not in the catalogue; replies will still be translated",
            args.language
        );
    }

    // --- 3. Wire the tutor ---
    let generator = speakgenie_service::build_generator(&config);
    let speech = SpeechBridge::new()
        .with_recognizer(Arc::new(ConsoleRecognizer::stdin()))
        .with_synthesizer(Arc::new(ConsoleSynthesizer::stdout()));
    let mut tutor = VoiceTutor::new(
        TutorSession::new(generator.clone()),
        Translator::new(generator),
        speech,
    );
    tutor.set_language(&args.language);

    let mode = args
        .scenario
        .as_deref()
        .map(ConversationMode::parse)
        .unwrap_or(ConversationMode::FreeFlow);

    // --- 4. Conversation loop ---
    if let Err(e) = tutor.start(&mode).await {
        // An unknown scenario is a usage error, not something to retry.
        tutor.end();
        return Err(e).context("Failed to start the conversation");
    }
    println!("(type what you would say; 'quit' to finish)");

    loop {
        match tutor.take_turn().await {
            Ok(reply) => {
                if !reply.spoken {
                    println!("Tutor: {}", reply.display_text());
                }
            }
            Err(TutorError::Recognition(RecognitionError::Aborted)) => break,
            Err(TutorError::Recognition(RecognitionError::NoSpeech)) => continue,
            Err(e) => {
                tracing::warn!("Turn failed: {}", e);
                println!("{}", e.friendly_message());
            }
        }
    }

    tutor.end();
    println!("Goodbye! Keep practicing!");
    Ok(())
}
