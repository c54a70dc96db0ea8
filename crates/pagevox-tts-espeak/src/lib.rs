//! eSpeak narrator engine implementation for PageVox
//!
//! Drives the `espeak`/`espeak-ng` command line, one utterance at a time,
//! playing through the engine's default audio output. Submissions are
//! serialized by a single playback task, so concurrent `speak` calls come
//! out as one audio stream in submission order.
//!
//! The CLI exposes no progress callbacks, so per-word `Progress` events
//! are emitted on a schedule estimated from the configured speaking rate.
//! Character offsets in those events are exact; their timing is not.

use async_trait::async_trait;
use pagevox_tts::{
    next_speech_handle, EngineEvent, EngineEventKind, NarratorConfig, NarratorEngine,
    SpeechHandle, TtsError, TtsResult, VoiceInfo,
};
use regex::Regex;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, warn};


pub struct EspeakNarrator {
    config: NarratorConfig,
    events: mpsc::Sender<EngineEvent>,
    command: Option<String>,
    voice: Option<VoiceInfo>,
    available_voices: Vec<VoiceInfo>,
    player_tx: Option<mpsc::Sender<PlayRequest>>,
    cancel_tx: watch::Sender<u64>,
    generation: u64,
}

struct PlayRequest {
    handle: SpeechHandle,
    args: Vec<String>,
    /// (position, count) per word, in char offsets into the utterance.
    schedule: Vec<(u32, u32)>,
    word_gap: Duration,
    generation: u64,
}

impl EspeakNarrator {
    /// Engine events (progress/completion) are delivered on `events`;
    /// the receiving end belongs in the coordinator's select loop.
    pub fn new(config: NarratorConfig, events: mpsc::Sender<EngineEvent>) -> Self {
        let (cancel_tx, _) = watch::channel(0u64);
        Self {
            config,
            events,
            command: None,
            voice: None,
            available_voices: Vec::new(),
            player_tx: None,
            cancel_tx,
            generation: 0,
        }
    }

    /// Resolve the espeak command name (espeak or espeak-ng).
    async fn resolve_command() -> Option<String> {
        for candidate in ["espeak", "espeak-ng"] {
            if Command::new(candidate)
                .arg("--version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await
                .is_ok()
            {
                return Some(candidate.to_string());
            }
        }
        None
    }

    /// Select a voice for the requested language tag: exact or prefix
    /// language match first, then the configured default voice, then the
    /// engine default.
    fn select_voice(&self, language: &str) -> VoiceInfo {
        if let Some(voice) = self
            .available_voices
            .iter()
            .find(|v| language_matches(&v.language, language))
        {
            return voice.clone();
        }
        if let Some(default_id) = &self.config.default_voice {
            if let Some(voice) = self.available_voices.iter().find(|v| &v.id == default_id) {
                return voice.clone();
            }
        }
        VoiceInfo {
            id: "default".to_string(),
            name: "eSpeak default".to_string(),
            language: language.to_string(),
        }
    }

    /// Build espeak command arguments for one utterance.
    fn build_args(&self, text: &str) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(voice) = &self.voice {
            if voice.id != "default" {
                args.push("-v".to_string());
                args.push(voice.id.clone());
            }
        }

        args.push("-s".to_string());
        args.push(self.config.speech_rate.to_string());

        // espeak amplitude range is 0-200
        let amplitude = ((self.config.volume * 200.0) as u32).min(200);
        args.push("-a".to_string());
        args.push(amplitude.to_string());

        args.push(text.to_string());
        args
    }

    fn ensure_player(&mut self) {
        if self.player_tx.is_some() {
            return;
        }
        // Resolved before configure() returns Ok, so unreachable fallback.
        let command = self.command.clone().unwrap_or_else(|| "espeak".to_string());
        let (tx, rx) = mpsc::channel::<PlayRequest>(32);
        let events = self.events.clone();
        let cancel_rx = self.cancel_tx.subscribe();
        tokio::spawn(run_player(command, rx, events, cancel_rx));
        self.player_tx = Some(tx);
    }
}

#[async_trait]
impl NarratorEngine for EspeakNarrator {
    fn name(&self) -> &str {
        "eSpeak"
    }

    async fn is_available(&self) -> bool {
        Self::resolve_command().await.is_some()
    }

    async fn configure(&mut self, language: &str) -> TtsResult<VoiceInfo> {
        let command = Self::resolve_command().await.ok_or_else(|| {
            TtsError::EngineNotAvailable(
                "eSpeak not found. Please install espeak or espeak-ng.".to_string(),
            )
        })?;

        let output = Command::new(&command)
            .arg("--voices")
            .output()
            .await
            .map_err(|e| TtsError::Configuration(format!("Failed to list voices: {}", e)))?;
        self.available_voices = parse_voice_list(&String::from_utf8_lossy(&output.stdout));
        debug!("Loaded {} espeak voices", self.available_voices.len());

        self.command = Some(command);
        let voice = self.select_voice(language);
        debug!("Selected voice {:?} for language {:?}", voice.id, language);
        self.voice = Some(voice.clone());
        self.ensure_player();
        Ok(voice)
    }

    async fn speak(&mut self, text: &str) -> TtsResult<SpeechHandle> {
        let player = self.player_tx.as_ref().ok_or(TtsError::NotConfigured)?;

        let handle = next_speech_handle();
        let rate = self.config.speech_rate.max(1);
        let request = PlayRequest {
            handle,
            args: self.build_args(text),
            schedule: word_schedule(text),
            word_gap: Duration::from_millis(60_000 / rate as u64),
            generation: self.generation,
        };
        player
            .send(request)
            .await
            .map_err(|_| TtsError::Synthesis("playback task terminated".to_string()))?;
        Ok(handle)
    }

    async fn cancel_all(&mut self) -> TtsResult<()> {
        // Every request submitted so far carries a lower generation; the
        // player skips queued ones and kills the active child. Nothing is
        // emitted for abandoned utterances.
        self.generation += 1;
        let _ = self.cancel_tx.send(self.generation);
        Ok(())
    }
}

/// Single playback task: plays requests in arrival order, one child
/// process at a time.
async fn run_player(
    command: String,
    mut rx: mpsc::Receiver<PlayRequest>,
    events: mpsc::Sender<EngineEvent>,
    mut cancel_rx: watch::Receiver<u64>,
) {
    while let Some(request) = rx.recv().await {
        if *cancel_rx.borrow() > request.generation {
            debug!("Skipping cancelled utterance {}", request.handle);
            continue;
        }
        play_one(&command, request, &events, &mut cancel_rx).await;
    }
    debug!("espeak playback task finished");
}

async fn play_one(
    command: &str,
    request: PlayRequest,
    events: &mpsc::Sender<EngineEvent>,
    cancel_rx: &mut watch::Receiver<u64>,
) {
    let mut child = match Command::new(command)
        .args(&request.args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            // Retire the utterance like a finished one; the user can
            // re-hover to retry.
            error!("Failed to spawn {}: {}", command, e);
            let _ = events
                .send(EngineEvent {
                    handle: request.handle,
                    kind: EngineEventKind::Completed,
                })
                .await;
            return;
        }
    };

    let ticker = async {
        for (position, count) in &request.schedule {
            let _ = events
                .send(EngineEvent {
                    handle: request.handle,
                    kind: EngineEventKind::Progress {
                        position: *position,
                        count: *count,
                    },
                })
                .await;
            tokio::time::sleep(request.word_gap).await;
        }
        // Hold the branch open until the child exits.
        std::future::pending::<()>().await
    };
    tokio::pin!(ticker);

    let cancelled = tokio::select! {
        status = child.wait() => {
            match status {
                Ok(status) if !status.success() => {
                    // Mid-speech engine errors retire the fragment like a
                    // normal completion.
                    warn!("espeak exited with {}", status);
                }
                Err(e) => warn!("Failed to wait for espeak: {}", e),
                _ => {}
            }
            false
        }
        _ = cancelled_at(cancel_rx, request.generation) => true,
        _ = &mut ticker => false,
    };

    if cancelled {
        let _ = child.kill().await;
        debug!("Cancelled utterance {}", request.handle);
    } else {
        let _ = events
            .send(EngineEvent {
                handle: request.handle,
                kind: EngineEventKind::Completed,
            })
            .await;
    }
}

/// Resolves once the cancel generation passes `generation`.
async fn cancelled_at(cancel_rx: &mut watch::Receiver<u64>, generation: u64) {
    loop {
        if *cancel_rx.borrow() > generation {
            return;
        }
        if cancel_rx.changed().await.is_err() {
            // Engine dropped; nobody can cancel this utterance anymore.
            std::future::pending::<()>().await;
        }
    }
}

/// Per-word (position, count) pairs in char offsets, in text order.
fn word_schedule(text: &str) -> Vec<(u32, u32)> {
    let mut schedule = Vec::new();
    let mut word_start: Option<u32> = None;
    let mut offset = 0u32;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if let Some(start) = word_start.take() {
                schedule.push((start, offset - start));
            }
        } else if word_start.is_none() {
            word_start = Some(offset);
        }
        offset += 1;
    }
    if let Some(start) = word_start {
        schedule.push((start, offset - start));
    }
    schedule
}

/// Parse espeak `--voices` output.
///
/// Format: `Pty Language Age/Gender VoiceName File Other`, e.g.
/// `5  en-us          M  english-us           en/en-us`.
fn parse_voice_list(output: &str) -> Vec<VoiceInfo> {
    let voice_regex = match Regex::new(r"^\s*\d+\s+([\w-]+)\s+[\w\-+]*\s+([\w\-_]+)\s+") {
        Ok(re) => re,
        Err(e) => {
            error!("Invalid voice list regex: {}", e);
            return Vec::new();
        }
    };

    let mut voices = Vec::new();
    for line in output.lines().skip(1) {
        if let Some(captures) = voice_regex.captures(line) {
            let language = captures.get(1).map_or("unknown", |m| m.as_str()).to_string();
            let voice_id = captures.get(2).map_or("unknown", |m| m.as_str()).to_string();
            voices.push(VoiceInfo {
                name: format!("{} ({})", voice_id, language),
                id: voice_id,
                language,
            });
        }
    }
    voices
}

/// Case-insensitive language tag prefix match: "de" serves "de-AT" and
/// vice versa.
fn language_matches(voice_language: &str, requested: &str) -> bool {
    let voice = voice_language.to_ascii_lowercase();
    let requested = requested.to_ascii_lowercase();
    voice == requested
        || voice.starts_with(&format!("{requested}-"))
        || requested.starts_with(&format!("{voice}-"))
}
