//! Confab voice assistant binary.
//!
//! Wires the production backends (microphone recorder, OpenAI-compatible
//! transcription/chat/TTS, rodio playback, local speech fallback) into the
//! conversational loop. The loop runs on a blocking thread because the VAD
//! and audio-output handles are not `Send`; CTRL-C flips a shared flag the
//! loop observes within its current operation.

use confab_voice::{
    AssistantConfig, ChannelEventSink, CommandSpeech, EventSink, OpenAiChat, OpenAiTranscriber,
    OpenAiTts, RodioPlayback, SessionSummary, SpeechOutput, TracingEventSink, UtteranceRecorder,
    VoiceAssistant, VoiceError, VoiceResult,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[confab] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AssistantConfig::from_env();
    let shutdown = Arc::new(AtomicBool::new(false));

    let (sink, mut events) = ChannelEventSink::new();
    let observer = tokio::spawn(async move {
        let log = TracingEventSink;
        while let Some(event) = events.recv().await {
            log.emit(event);
        }
    });

    let session_shutdown = Arc::clone(&shutdown);
    let mut session = tokio::task::spawn_blocking(move || -> VoiceResult<SessionSummary> {
        // The VAD and rodio handles are !Send; everything audio lives on
        // this thread.
        let recorder = UtteranceRecorder::new(&config, Arc::clone(&session_shutdown))?;
        let transcriber = OpenAiTranscriber::from_env()?;
        let chat = OpenAiChat::from_env()?;
        let tts = OpenAiTts::from_env(config.synthesis_timeout)?;
        let playback = RodioPlayback::new()?;
        let speech = SpeechOutput::new(
            Box::new(tts),
            Box::new(CommandSpeech::from_env()),
            Box::new(playback),
            config.tts_lang.clone(),
            Arc::clone(&session_shutdown),
        );
        let mut assistant =
            VoiceAssistant::new(config, recorder, transcriber, chat, speech, Box::new(sink));
        assistant.run()
    });

    let result = tokio::select! {
        result = &mut session => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("CTRL-C received; stopping after the current operation");
            shutdown.store(true, Ordering::Relaxed);
            session.await
        }
    };

    // The sink is gone once the session task finishes, so the observer drains
    // and exits on its own.
    let _ = observer.await;

    match result {
        Ok(Ok(summary)) => {
            tracing::info!(
                rounds = summary.rounds_completed,
                reason = ?summary.reason,
                "assistant stopped"
            );
        }
        Ok(Err(VoiceError::Interrupted)) => {
            tracing::info!("assistant interrupted, shut down cleanly");
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "assistant failed");
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!(error = %e, "assistant task panicked");
            std::process::exit(1);
        }
    }
}
