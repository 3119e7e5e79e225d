//! End-to-end conversational loop scenarios with scripted collaborators.
//!
//! No microphone, network, or audio device: the recorder, transcriber,
//! chat, and speech backends are all stubs, so these tests pin down the
//! round state machine itself.

use confab_voice::{
    AssistantConfig, Continuation, EndReason, EventSink, LocalSpeech, Playback, SpeechOutput,
    TranscriptionBackend, TtsBackend, TurnEvent, Utterance, UtteranceSource, VoiceAssistant,
    VoiceResult,
};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

struct ScriptedSource {
    recordings: VecDeque<Option<Utterance>>,
}

impl ScriptedSource {
    fn new(recordings: Vec<Option<Utterance>>) -> Self {
        Self {
            recordings: recordings.into(),
        }
    }
}

impl UtteranceSource for ScriptedSource {
    fn record(&mut self, _silence_timeout: Duration) -> VoiceResult<Option<Utterance>> {
        Ok(self.recordings.pop_front().unwrap_or(None))
    }
}

struct ScriptedTranscriber {
    transcripts: RefCell<VecDeque<String>>,
    calls: Rc<Cell<u32>>,
}

impl ScriptedTranscriber {
    fn new(transcripts: Vec<&str>, calls: Rc<Cell<u32>>) -> Self {
        Self {
            transcripts: RefCell::new(transcripts.iter().map(|s| s.to_string()).collect()),
            calls,
        }
    }
}

impl TranscriptionBackend for ScriptedTranscriber {
    fn transcribe(&self, _utterance: &Utterance) -> VoiceResult<String> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.transcripts.borrow_mut().pop_front().unwrap_or_default())
    }
}

struct FixedChat {
    reply: String,
    calls: Rc<Cell<u32>>,
}

impl confab_voice::ChatBackend for FixedChat {
    fn complete(&self, _system_prompt: &str, _user_text: &str) -> VoiceResult<String> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.reply.clone())
    }
}

struct FixedTts(Vec<u8>);

impl TtsBackend for FixedTts {
    fn synthesize(&self, _text: &str, _lang: &str) -> VoiceResult<Vec<u8>> {
        Ok(self.0.clone())
    }
}

struct FailingTts;

impl TtsBackend for FailingTts {
    fn synthesize(&self, _text: &str, _lang: &str) -> VoiceResult<Vec<u8>> {
        Err(confab_voice::VoiceError::Synthesis("503".to_string()))
    }
}

struct CountingLocal {
    calls: Rc<Cell<u32>>,
}

impl LocalSpeech for CountingLocal {
    fn say(&self, _text: &str) -> VoiceResult<()> {
        self.calls.set(self.calls.get() + 1);
        Ok(())
    }
}

struct NullPlayback;

impl Playback for NullPlayback {
    fn play_blocking(&self, _bytes: &[u8], _shutdown: &AtomicBool) -> VoiceResult<()> {
        Ok(())
    }
}

struct CollectingSink {
    events: Rc<RefCell<Vec<TurnEvent>>>,
}

impl EventSink for CollectingSink {
    fn emit(&self, event: TurnEvent) {
        self.events.borrow_mut().push(event);
    }
}

fn spoken_utterance() -> Utterance {
    Utterance {
        samples: vec![1000i16; 16000],
        sample_rate: 16000,
    }
}

struct Harness {
    config: AssistantConfig,
    transcriber_calls: Rc<Cell<u32>>,
    chat_calls: Rc<Cell<u32>>,
    local_calls: Rc<Cell<u32>>,
    events: Rc<RefCell<Vec<TurnEvent>>>,
    _dir: tempfile::TempDir,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = AssistantConfig {
            out_dir: dir.path().join("audio"),
            ..Default::default()
        };
        Self {
            config,
            transcriber_calls: Rc::new(Cell::new(0)),
            chat_calls: Rc::new(Cell::new(0)),
            local_calls: Rc::new(Cell::new(0)),
            events: Rc::new(RefCell::new(Vec::new())),
            _dir: dir,
        }
    }

    fn assistant(
        &self,
        recordings: Vec<Option<Utterance>>,
        transcripts: Vec<&str>,
        tts: Box<dyn TtsBackend>,
    ) -> VoiceAssistant<ScriptedSource, ScriptedTranscriber, FixedChat> {
        let speech = SpeechOutput::new(
            tts,
            Box::new(CountingLocal {
                calls: Rc::clone(&self.local_calls),
            }),
            Box::new(NullPlayback),
            "en",
            Arc::new(AtomicBool::new(false)),
        );
        VoiceAssistant::new(
            self.config.clone(),
            ScriptedSource::new(recordings),
            ScriptedTranscriber::new(transcripts, Rc::clone(&self.transcriber_calls)),
            FixedChat {
                reply: "Rust is a systems language.".to_string(),
                calls: Rc::clone(&self.chat_calls),
            },
            speech,
            Box::new(CollectingSink {
                events: Rc::clone(&self.events),
            }),
        )
    }

    fn artifact_names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.config.out_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

fn has_artifact(names: &[String], prefix: &str, suffix: &str) -> bool {
    names
        .iter()
        .any(|n| n.starts_with(prefix) && n.ends_with(suffix))
}

#[test]
fn silent_session_ends_without_any_processing() {
    let harness = Harness::new();
    let mut assistant = harness.assistant(vec![None], vec![], Box::new(FixedTts(b"a".to_vec())));

    let summary = assistant.run().unwrap();

    assert_eq!(summary.reason, EndReason::NoSpeech);
    assert_eq!(summary.rounds_completed, 0);
    assert_eq!(harness.transcriber_calls.get(), 0);
    assert_eq!(harness.chat_calls.get(), 0);
    assert!(
        harness.artifact_names().is_empty(),
        "no artifacts for a session with no speech"
    );
}

#[test]
fn single_round_with_decline_persists_all_artifacts() {
    let harness = Harness::new();
    let mut assistant = harness.assistant(
        vec![Some(spoken_utterance()), Some(spoken_utterance())],
        vec!["what is rust", "no"],
        Box::new(FixedTts(b"mp3".to_vec())),
    );

    let summary = assistant.run().unwrap();

    assert_eq!(summary.reason, EndReason::Declined);
    assert_eq!(summary.rounds_completed, 1);
    assert_eq!(harness.chat_calls.get(), 1);
    // Utterance plus continuation answer.
    assert_eq!(harness.transcriber_calls.get(), 2);

    let names = harness.artifact_names();
    assert!(has_artifact(&names, "speech_", ".wav"));
    assert!(has_artifact(&names, "speech_", ".txt"));
    assert!(has_artifact(&names, "speech_", ".reply.txt"));
    assert!(has_artifact(&names, "speech_", ".mp3"));
    assert!(has_artifact(&names, "prompt_", ".mp3"));
    assert!(has_artifact(&names, "goodbye_", ".mp3"));

    let transcript_file = names
        .iter()
        .find(|n| n.starts_with("speech_") && n.ends_with(".txt") && !n.ends_with(".reply.txt"))
        .unwrap();
    let text = std::fs::read_to_string(Path::new(&harness.config.out_dir).join(transcript_file))
        .unwrap();
    assert_eq!(text, "what is rust");
}

#[test]
fn affirmative_continuation_increments_the_round() {
    let harness = Harness::new();
    let mut assistant = harness.assistant(
        vec![
            Some(spoken_utterance()),
            Some(spoken_utterance()),
            Some(spoken_utterance()),
            Some(spoken_utterance()),
        ],
        vec!["first question", "yes please", "second question", "no"],
        Box::new(FixedTts(b"mp3".to_vec())),
    );

    let summary = assistant.run().unwrap();

    assert_eq!(summary.reason, EndReason::Declined);
    assert_eq!(summary.rounds_completed, 2);
    assert_eq!(harness.chat_calls.get(), 2);

    let rounds_started: Vec<u32> = harness
        .events
        .borrow()
        .iter()
        .filter_map(|e| match e {
            TurnEvent::RoundStarted { round, .. } => Some(*round),
            _ => None,
        })
        .collect();
    assert_eq!(rounds_started, vec![1, 2]);
}

#[test]
fn empty_transcript_ends_like_no_speech() {
    let harness = Harness::new();
    let mut assistant = harness.assistant(
        vec![Some(spoken_utterance())],
        vec![""],
        Box::new(FixedTts(b"mp3".to_vec())),
    );

    let summary = assistant.run().unwrap();

    assert_eq!(summary.reason, EndReason::EmptyTranscript);
    assert_eq!(summary.rounds_completed, 0);
    assert_eq!(harness.chat_calls.get(), 0);
    // The WAV and (empty) transcript are still persisted for inspection.
    let names = harness.artifact_names();
    assert!(has_artifact(&names, "speech_", ".wav"));
}

#[test]
fn unrecognized_answer_fails_closed() {
    let harness = Harness::new();
    let mut assistant = harness.assistant(
        vec![Some(spoken_utterance()), Some(spoken_utterance())],
        vec!["what is rust", "nope"],
        Box::new(FixedTts(b"mp3".to_vec())),
    );

    let summary = assistant.run().unwrap();

    assert_eq!(summary.reason, EndReason::UnclearAnswer);
    assert_eq!(summary.rounds_completed, 1);
}

#[test]
fn no_answer_to_the_prompt_fails_closed() {
    let harness = Harness::new();
    let mut assistant = harness.assistant(
        vec![Some(spoken_utterance()), None],
        vec!["what is rust"],
        Box::new(FixedTts(b"mp3".to_vec())),
    );

    let summary = assistant.run().unwrap();

    assert_eq!(summary.reason, EndReason::UnclearAnswer);
    assert_eq!(summary.rounds_completed, 1);
}

#[test]
fn remote_synthesis_failure_is_recovered_locally() {
    let harness = Harness::new();
    let mut assistant = harness.assistant(
        vec![Some(spoken_utterance()), Some(spoken_utterance())],
        vec!["what is rust", "no"],
        Box::new(FailingTts),
    );

    let summary = assistant.run().unwrap();

    assert_eq!(summary.reason, EndReason::Declined);
    // Reply, continuation prompt, and farewell each fell back exactly once.
    assert_eq!(harness.local_calls.get(), 3);
    let names = harness.artifact_names();
    assert!(
        !has_artifact(&names, "speech_", ".mp3"),
        "failed synthesis leaves no audio artifact"
    );
}

#[test]
fn continuation_parsing_matches_word_boundaries() {
    assert_eq!(confab_voice::parse_continuation("yes please"), Continuation::Continue);
    assert_eq!(confab_voice::parse_continuation("  Yes"), Continuation::Continue);
    assert_eq!(confab_voice::parse_continuation("nope"), Continuation::Unclear);
    assert_eq!(confab_voice::parse_continuation(""), Continuation::Unclear);
    assert_eq!(confab_voice::parse_continuation("No."), Continuation::Stop);
}
