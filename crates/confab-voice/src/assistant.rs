//! Turn-taking orchestrator: the conversational round state machine.
//!
//! One round runs `RoundStart → Recording → Transcribing → Responding →
//! Speaking → AwaitingContinuation`, then either loops into the next round
//! or ends. Collaborators are injected so the loop is testable without a
//! microphone or network; the binary wires the production backends.

use crate::chat::ChatBackend;
use crate::config::AssistantConfig;
use crate::error::{VoiceError, VoiceResult};
use crate::events::{EndReason, EventSink, TurnEvent};
use crate::recorder::{Utterance, UtteranceSource};
use crate::speech::SpeechOutput;
use crate::stt::TranscriptionBackend;
use crate::wav;
use chrono::Utc;
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::{info, warn};

const CONTINUE_PROMPT: &str = "Would you like to continue the chat? Please say Yes or No.";
const FAREWELL: &str = "Good-bye!";

/// Parsed continuation answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    Continue,
    Stop,
    Unclear,
}

fn yes_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*y(es)?\b").unwrap())
}

fn no_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*n(o)?\b").unwrap())
}

/// Classify a continuation answer. Leading whitespace and case are ignored;
/// the match is anchored at the start with a word boundary, so "yes please"
/// continues but "nope" does not count as no. Anything unrecognized is
/// `Unclear`, which the loop treats as stop.
pub fn parse_continuation(answer: &str) -> Continuation {
    if yes_pattern().is_match(answer) {
        Continuation::Continue
    } else if no_pattern().is_match(answer) {
        Continuation::Stop
    } else {
        Continuation::Unclear
    }
}

/// How a completed session finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Rounds that ran to completion (transcript, reply, and playback).
    pub rounds_completed: u32,
    pub reason: EndReason,
}

/// A voice assistant session. Built explicitly from config plus injected
/// collaborators; owns no process-wide state.
pub struct VoiceAssistant<R, T, C> {
    config: AssistantConfig,
    recorder: R,
    transcriber: T,
    chat: C,
    speech: SpeechOutput,
    events: Box<dyn EventSink>,
}

impl<R, T, C> VoiceAssistant<R, T, C>
where
    R: UtteranceSource,
    T: TranscriptionBackend,
    C: ChatBackend,
{
    pub fn new(
        config: AssistantConfig,
        recorder: R,
        transcriber: T,
        chat: C,
        speech: SpeechOutput,
        events: Box<dyn EventSink>,
    ) -> Self {
        Self {
            config,
            recorder,
            transcriber,
            chat,
            speech,
            events,
        }
    }

    /// Run the conversational loop until the user declines, nothing is
    /// heard, or the session is interrupted.
    pub fn run(&mut self) -> VoiceResult<SessionSummary> {
        self.prepare_out_dir()?;
        let result = self.run_rounds();
        if let Err(VoiceError::Interrupted) = &result {
            self.events.emit(TurnEvent::SessionEnded {
                rounds_completed: 0,
                reason: EndReason::Interrupted,
            });
            info!("session interrupted");
        }
        result
    }

    /// Clear and recreate the artifact directory so each session starts
    /// from a clean slate.
    fn prepare_out_dir(&self) -> VoiceResult<()> {
        let dir = &self.config.out_dir;
        if dir.exists() {
            std::fs::remove_dir_all(dir)?;
        }
        std::fs::create_dir_all(dir)?;
        Ok(())
    }

    fn run_rounds(&mut self) -> VoiceResult<SessionSummary> {
        let mut round = 1u32;
        loop {
            self.events.emit(TurnEvent::RoundStarted {
                round,
                timestamp: Utc::now(),
            });

            let Some(utterance) = self.recorder.record(self.config.end_silence)? else {
                return self.finish(round - 1, EndReason::NoSpeech);
            };

            let stamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
            let wav_path = self.artifact(&format!("speech_{}.wav", stamp));
            wav::write_wav(&wav_path, &utterance.samples, utterance.sample_rate)?;
            self.events.emit(TurnEvent::UtteranceCaptured {
                round,
                duration: utterance.duration(),
                wav_path: wav_path.display().to_string(),
            });

            let transcript = self.process_utterance(&utterance, &stamp)?;
            if transcript.is_empty() {
                warn!(round, "transcription heard nothing");
                return self.finish(round - 1, EndReason::EmptyTranscript);
            }
            self.events.emit(TurnEvent::Transcribed {
                round,
                text: transcript.clone(),
            });

            let reply = self.chat.complete(&self.config.system_prompt, &transcript)?;
            std::fs::write(
                self.artifact(&format!("speech_{}.reply.txt", stamp)),
                &reply,
            )?;
            self.events.emit(TurnEvent::ReplyReady {
                round,
                text: reply.clone(),
            });

            self.events.emit(TurnEvent::SpeakingStarted { round });
            self.speech
                .speak(&reply, &self.artifact(&format!("speech_{}.mp3", stamp)))?;
            self.events.emit(TurnEvent::SpeakingFinished { round });

            match self.ask_continuation(round)? {
                Continuation::Continue => round += 1,
                Continuation::Stop => {
                    let stamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
                    self.speech
                        .speak(FAREWELL, &self.artifact(&format!("goodbye_{}.mp3", stamp)))?;
                    return self.finish(round, EndReason::Declined);
                }
                Continuation::Unclear => {
                    return self.finish(round, EndReason::UnclearAnswer);
                }
            }
        }
    }

    /// Transcribe one utterance and persist the transcript next to its WAV,
    /// keyed by the same timestamp. Also usable by hosts embedding the
    /// assistant outside the round loop.
    pub fn process_utterance(&mut self, utterance: &Utterance, stamp: &str) -> VoiceResult<String> {
        let transcript = self.transcriber.transcribe(utterance)?;
        std::fs::write(
            self.artifact(&format!("speech_{}.txt", stamp)),
            &transcript,
        )?;
        Ok(transcript)
    }

    /// Speak the continuation prompt, record the short answer, transcribe
    /// it in memory, and classify. No artifact pair is written for the
    /// answer itself.
    fn ask_continuation(&mut self, round: u32) -> VoiceResult<Continuation> {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        self.speech.speak(
            CONTINUE_PROMPT,
            &self.artifact(&format!("prompt_{}.mp3", stamp)),
        )?;

        let Some(answer) = self.recorder.record(self.config.answer_silence)? else {
            return Ok(Continuation::Unclear);
        };
        let text = self.transcriber.transcribe(&answer)?;
        self.events.emit(TurnEvent::ContinuationHeard {
            round,
            answer: text.clone(),
        });
        Ok(parse_continuation(&text))
    }

    fn finish(&self, rounds_completed: u32, reason: EndReason) -> VoiceResult<SessionSummary> {
        self.events.emit(TurnEvent::SessionEnded {
            rounds_completed,
            reason,
        });
        info!(rounds = rounds_completed, ?reason, "conversation finished");
        Ok(SessionSummary {
            rounds_completed,
            reason,
        })
    }

    fn artifact(&self, name: &str) -> PathBuf {
        self.config.out_dir.join(name)
    }
}
