//! Speech through the default audio output: text is synthesized by an
//! HTTP text-to-speech service and played on a dedicated audio thread.

use std::io::Cursor;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    mpsc::{self, RecvTimeoutError, Sender},
    Arc, Mutex,
};
use std::thread;
use std::time::Duration;

use log::{error, warn};
use rodio::{Decoder, OutputStream, Sink};
use serde::Serialize;
use tokio::sync::oneshot;

use super::engine::{SpeechCompletion, SpeechEnd, SpeechEngine, Utterance};
use crate::config::NarrationSettings;
use crate::error::{TutorError, TutorResult};
use crate::log_debug;

const ENABLE_LOGS: bool = false;

const COMPLETION_POLL: Duration = Duration::from_millis(50);

type Done = oneshot::Sender<TutorResult<SpeechEnd>>;

struct Clip {
    audio: Vec<u8>,
    volume: f32,
    speed: f32,
    done: Done,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Control {
    Pause,
    Resume,
    Stop,
    SetVolume(f32),
}

enum AudioCommand {
    Play(Clip),
    Control(Control),
}

/// What the audio thread must do to its sink, if it has one.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SinkAction {
    Pause,
    Play,
    Halt,
    Volume(f32),
}

/// Playback intent kept apart from the sink. A pause that lands while the
/// clip is still being synthesized must hold once the clip arrives.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Transport {
    paused: bool,
}

impl Transport {
    /// Whether a clip arriving now starts paused.
    fn starts_paused(&self) -> bool {
        self.paused
    }

    fn control(&mut self, control: Control) -> SinkAction {
        match control {
            Control::Pause => {
                self.paused = true;
                SinkAction::Pause
            }
            Control::Resume => {
                self.paused = false;
                SinkAction::Play
            }
            Control::Stop => {
                self.paused = false;
                SinkAction::Halt
            }
            Control::SetVolume(volume) => SinkAction::Volume(volume.clamp(0.0, 1.0)),
        }
    }
}

#[derive(Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language_code: Option<&'a str>,
}

pub struct SpeakerEngine {
    tx: Arc<Mutex<Option<Sender<AudioCommand>>>>,
    /// Bumped by every speak and cancel; a synthesized clip only plays if
    /// its generation is still current.
    generation: Arc<AtomicU64>,
    client: reqwest::Client,
    settings: NarrationSettings,
}

impl SpeakerEngine {
    pub fn new(client: reqwest::Client, settings: NarrationSettings) -> Self {
        Self {
            tx: Arc::new(Mutex::new(None)),
            generation: Arc::new(AtomicU64::new(0)),
            client,
            settings,
        }
    }

    fn ensure_thread(&self) -> Result<Sender<AudioCommand>, String> {
        let mut guard = self.tx.lock().map_err(|e| e.to_string())?;
        if let Some(tx) = guard.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<AudioCommand>();

        // OutputStream is !Send, so it lives and dies on this thread.
        thread::Builder::new()
            .name("narration-audio".to_string())
            .spawn(move || {
                let mut _stream: Option<OutputStream> = None;
                let mut sink: Option<Sink> = None;
                let mut done: Option<Done> = None;
                let mut transport = Transport::default();

                fn finish(done: &mut Option<Done>, outcome: TutorResult<SpeechEnd>) {
                    if let Some(tx) = done.take() {
                        let _ = tx.send(outcome);
                    }
                }

                loop {
                    match rx.recv_timeout(COMPLETION_POLL) {
                        Ok(AudioCommand::Play(clip)) => {
                            log_debug!("Audio thread received a {} byte clip", clip.audio.len());
                            if let Some(old) = sink.take() {
                                old.stop();
                            }
                            finish(&mut done, Ok(SpeechEnd::Cancelled));

                            let paused = transport.starts_paused();
                            let started = (|| -> Result<(OutputStream, Sink), String> {
                                let (stream, handle) = OutputStream::try_default()
                                    .map_err(|e| format!("no audio output: {e}"))?;
                                let new_sink = Sink::try_new(&handle)
                                    .map_err(|e| format!("failed to create audio sink: {e}"))?;
                                let source = Decoder::new(Cursor::new(clip.audio))
                                    .map_err(|e| format!("undecodable speech audio: {e}"))?;
                                if paused {
                                    new_sink.pause();
                                }
                                new_sink.set_volume(clip.volume.clamp(0.0, 1.0));
                                new_sink.set_speed(clip.speed);
                                new_sink.append(source);
                                Ok((stream, new_sink))
                            })();

                            match started {
                                Ok((stream, new_sink)) => {
                                    _stream = Some(stream);
                                    sink = Some(new_sink);
                                    done = Some(clip.done);
                                }
                                Err(message) => {
                                    let _ = clip.done.send(Err(TutorError::Playback(message)));
                                }
                            }
                        }
                        Ok(AudioCommand::Control(control)) => {
                            log_debug!("Audio thread received {control:?}");
                            match transport.control(control) {
                                SinkAction::Pause => {
                                    if let Some(ref s) = sink {
                                        s.pause();
                                    }
                                }
                                SinkAction::Play => {
                                    if let Some(ref s) = sink {
                                        s.play();
                                    }
                                }
                                SinkAction::Halt => {
                                    if let Some(old) = sink.take() {
                                        old.stop();
                                    }
                                    _stream = None;
                                    finish(&mut done, Ok(SpeechEnd::Cancelled));
                                }
                                SinkAction::Volume(volume) => {
                                    if let Some(ref s) = sink {
                                        s.set_volume(volume);
                                    }
                                }
                            }
                        }
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => break,
                    }

                    if sink.as_ref().is_some_and(|s| s.empty()) {
                        sink = None;
                        _stream = None;
                        finish(&mut done, Ok(SpeechEnd::Finished));
                    }
                }
            })
            .map_err(|e| e.to_string())?;

        *guard = Some(tx.clone());
        Ok(tx)
    }

    fn send(&self, command: AudioCommand) {
        match self.ensure_thread() {
            Ok(tx) => {
                if let Err(err) = tx.send(command) {
                    error!("Audio thread is gone: {err}");
                }
            }
            Err(err) => error!("Failed to start audio thread: {err}"),
        }
    }
}

async fn synthesize(
    client: &reqwest::Client,
    settings: &NarrationSettings,
    api_key: &str,
    utterance: &Utterance,
) -> TutorResult<Vec<u8>> {
    let url = format!(
        "{}/text-to-speech/{}",
        settings.tts_base_url.trim_end_matches('/'),
        settings.voice_id
    );
    let language = utterance.language.split('-').next().filter(|l| !l.is_empty());
    let response = client
        .post(url)
        .header("xi-api-key", api_key)
        .header(reqwest::header::ACCEPT, "audio/mpeg")
        .json(&TtsRequest {
            text: &utterance.text,
            model_id: &settings.tts_model,
            language_code: language,
        })
        .send()
        .await
        .map_err(|e| TutorError::Playback(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(TutorError::Playback(format!("text-to-speech HTTP {status}")));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| TutorError::Playback(e.to_string()))?;
    Ok(bytes.to_vec())
}

impl SpeechEngine for SpeakerEngine {
    fn is_supported(&self) -> bool {
        self.settings.tts_api_key.is_some()
    }

    fn speak(&self, utterance: Utterance) -> TutorResult<SpeechCompletion> {
        let api_key = self
            .settings
            .tts_api_key
            .clone()
            .ok_or(TutorError::UnsupportedCapability)?;
        let tx = self.ensure_thread().map_err(TutorError::Playback)?;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current = self.generation.clone();
        let client = self.client.clone();
        let settings = self.settings.clone();
        let (done_tx, done_rx) = oneshot::channel();

        tokio::spawn(async move {
            let audio = match synthesize(&client, &settings, &api_key, &utterance).await {
                Ok(audio) => audio,
                Err(err) => {
                    let _ = done_tx.send(Err(err));
                    return;
                }
            };

            if current.load(Ordering::SeqCst) != generation {
                let _ = done_tx.send(Ok(SpeechEnd::Cancelled));
                return;
            }

            let command = AudioCommand::Play(Clip {
                audio,
                volume: utterance.volume,
                speed: utterance.rate,
                done: done_tx,
            });
            if let Err(err) = tx.send(command) {
                warn!("Audio thread dropped narration: {err}");
            }
        });

        Ok(done_rx)
    }

    fn pause(&self) {
        self.send(AudioCommand::Control(Control::Pause));
    }

    fn resume(&self) {
        self.send(AudioCommand::Control(Control::Resume));
    }

    fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.send(AudioCommand::Control(Control::Stop));
    }

    fn set_volume(&self, volume: f32) {
        self.send(AudioCommand::Control(Control::SetVolume(volume)));
    }
}
