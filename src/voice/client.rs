//! Voice API WebSocket client.
//!
//! # Session Flow
//!
//! 1. `initialize()` - Build the socket URL and hand over an audio source
//! 2. `open_and_start_recognition()` - Open the socket, send `StartRecognition`
//! 3. On `RecognitionStarted` the audio source is pumped as binary frames
//! 4. The first terminal message, close or failure reports one status
//! 5. `close()` - Stop early; nothing is reported for a manual close
//!
//! All state lives in a session loop task that owns the reducer state, the
//! audio source and the socket's outgoing queue. The socket and audio pump
//! run as their own tasks and only talk to the loop through events.

use std::sync::Once;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tokio_tungstenite::{
    connect_async_with_config,
    tungstenite::{
        protocol::{frame::coding::CloseCode, CloseFrame},
        Message,
    },
};
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

use super::audio::{AudioSource, AudioStreamConfig};
use super::protocol::{ClientMessage, ServerMessage, ABNORMAL_CLOSE, VOICE_API_VERSION};
use super::state_machine::{reduce, Effect, Event, State};
use crate::api_string::{to_query_map, voice_language_code};
use crate::config::ClientConfig;
use crate::error::{ApiError, VoiceClientError, W3wError, W3wResult, NETWORK_ERROR_CODE};
use crate::text::suggestions_to_domain;
use crate::types::{AutosuggestOptions, Language, Suggestion};

/// Connection timeout for the WebSocket handshake
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// How long to wait for the server to acknowledge our close frame
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Close code reported when the server sends a close frame without one
const NO_STATUS_CLOSE: u16 = 1005;

/// Receives the terminal status of one connection attempt.
pub type StatusCallback = Box<dyn FnOnce(W3wResult<Vec<Suggestion>>) + Send + 'static>;

enum Command {
    Initialize {
        url: Url,
        audio: Box<dyn AudioSource>,
    },
    Open {
        session: Uuid,
        on_status: StatusCallback,
    },
    Close {
        reason: String,
    },
}

/// Client for the voice autosuggest endpoint.
///
/// Methods never block; they queue a command for the session loop, which is
/// spawned on the current Tokio runtime by the first `initialize()`. Outside a
/// runtime `initialize()` fails with [`VoiceClientError::NoRuntime`].
pub struct VoiceClient {
    api_key: String,
    voice_host: String,
    commands: Option<mpsc::UnboundedSender<Command>>,
    state_tx: Option<watch::Sender<State>>,
    state_rx: watch::Receiver<State>,
    initialized: bool,
    /// An audio source is waiting for the next open.
    armed: bool,
}

impl VoiceClient {
    pub fn new(config: &ClientConfig) -> Self {
        let (state_tx, state_rx) = watch::channel(State::Idle);
        Self {
            api_key: config.api_key.clone(),
            voice_host: config.voice_host.clone(),
            commands: None,
            state_tx: Some(state_tx),
            state_rx,
            initialized: false,
            armed: false,
        }
    }

    /// Prepare the next session. The audio source is owned by that session
    /// and closed when it ends.
    pub fn initialize(
        &mut self,
        language: &Language,
        options: Option<&AutosuggestOptions>,
        audio: impl AudioSource,
    ) -> Result<&mut Self, VoiceClientError> {
        let url = voice_url(&self.voice_host, &self.api_key, language, options)?;
        log::debug!("Voice request prepared for {}", url.path());

        if self.commands.is_none() {
            self.spawn_loop()?;
        }
        self.send(Command::Initialize {
            url,
            audio: Box::new(audio),
        });
        self.initialized = true;
        self.armed = true;
        Ok(self)
    }

    /// Open the socket and start recognition.
    ///
    /// `on_status` runs at most once, on the session task, with the
    /// suggestions or the error that ended the session. A live session is
    /// closed first and reports nothing.
    pub fn open_and_start_recognition(
        &mut self,
        on_status: impl FnOnce(W3wResult<Vec<Suggestion>>) + Send + 'static,
    ) -> Result<(), VoiceClientError> {
        if !self.armed {
            return Err(VoiceClientError::NotInitialized);
        }
        self.armed = false;

        let session = Uuid::new_v4();
        log::info!("Opening voice session {}", session);
        self.send(Command::Open {
            session,
            on_status: Box::new(on_status),
        });
        Ok(())
    }

    /// Close the audio source and the socket. Idempotent; the session's
    /// status callback is not invoked.
    pub fn close(&mut self, reason: &str) -> Result<(), VoiceClientError> {
        if !self.initialized {
            return Err(VoiceClientError::NotInitialized);
        }
        self.armed = false;
        self.send(Command::Close {
            reason: reason.to_string(),
        });
        Ok(())
    }

    pub fn state(&self) -> State {
        self.state_rx.borrow().clone()
    }

    /// Watch state transitions, e.g. to await `Terminated`.
    pub fn subscribe(&self) -> watch::Receiver<State> {
        self.state_rx.clone()
    }

    fn send(&mut self, command: Command) {
        let delivered = self
            .commands
            .as_ref()
            .is_some_and(|commands| commands.send(command).is_ok());
        if !delivered {
            log::error!("Voice session loop is gone; command dropped");
        }
    }

    fn spawn_loop(&mut self) -> Result<(), VoiceClientError> {
        let runtime = Handle::try_current().map_err(|_| VoiceClientError::NoRuntime)?;
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let state_tx = self
            .state_tx
            .take()
            .unwrap_or_else(|| watch::channel(State::Idle).0);
        // Detached: dropping the client closes the command channel, and the
        // loop tears the session down before exiting.
        runtime.spawn(run_session_loop(commands_rx, state_tx));
        self.commands = Some(commands_tx);
        Ok(())
    }
}

/// Socket URL for a session:
/// `{base}/v1/autosuggest[-with-coordinates]?{options}&voice-language=..&key=..`.
pub fn voice_url(
    voice_host: &str,
    api_key: &str,
    language: &Language,
    options: Option<&AutosuggestOptions>,
) -> Result<Url, VoiceClientError> {
    let base = if voice_host.contains("://") {
        voice_host.to_string()
    } else {
        format!("wss://{}", voice_host)
    };
    let mut url = Url::parse(&base)
        .map_err(|e| VoiceClientError::InvalidEndpoint(format!("{}: {}", base, e)))?;

    let endpoint = match options {
        Some(o) if o.include_coordinates => "autosuggest-with-coordinates",
        _ => "autosuggest",
    };
    url.path_segments_mut()
        .map_err(|_| VoiceClientError::InvalidEndpoint(base.clone()))?
        .pop_if_empty()
        .push(VOICE_API_VERSION)
        .push(endpoint);

    {
        let mut query = url.query_pairs_mut();
        if let Some(options) = options {
            for (key, value) in to_query_map(options) {
                query.append_pair(key, &value);
            }
        }
        query.append_pair("voice-language", &voice_language_code(language));
        query.append_pair("key", api_key);
    }

    Ok(url)
}

// ============================================================================
// Session loop
// ============================================================================

struct SessionLoop {
    state: State,
    state_tx: watch::Sender<State>,
    events_tx: mpsc::UnboundedSender<Event>,
    url: Option<Url>,
    /// Audio handed over by the last `initialize()`, not yet bound to a session.
    pending_audio: Option<Box<dyn AudioSource>>,
    /// Audio of the live session until the pump takes it.
    session_audio: Option<Box<dyn AudioSource>>,
    audio_config: AudioStreamConfig,
    pump: Option<CancellationToken>,
    outgoing: Option<mpsc::UnboundedSender<Message>>,
    on_status: Option<StatusCallback>,
}

async fn run_session_loop(
    mut commands: mpsc::UnboundedReceiver<Command>,
    state_tx: watch::Sender<State>,
) {
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let mut ctx = SessionLoop {
        state: State::default(),
        state_tx,
        events_tx,
        url: None,
        pending_audio: None,
        session_audio: None,
        audio_config: AudioStreamConfig::default(),
        pump: None,
        outgoing: None,
        on_status: None,
    };
    log::debug!("Voice session loop started");

    loop {
        let event = tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Initialize { url, audio }) => {
                    ctx.url = Some(url);
                    if let Some(mut replaced) = ctx.pending_audio.replace(audio) {
                        replaced.close();
                    }
                    Event::Initialize
                }
                Some(Command::Open { session, on_status }) => {
                    ctx.on_status = Some(on_status);
                    Event::Open { session }
                }
                Some(Command::Close { reason }) => Event::ManualClose { reason },
                None => {
                    ctx.apply(Event::ManualClose {
                        reason: "Client dropped".to_string(),
                    });
                    ctx.discard_pending_audio();
                    break;
                }
            },
            Some(event) = events.recv() => event,
        };
        ctx.apply(event);
    }

    log::debug!("Voice session loop ended");
}

impl SessionLoop {
    fn apply(&mut self, event: Event) {
        let old_discriminant = std::mem::discriminant(&self.state);
        let (next, effects) = reduce(&self.state, event);
        if old_discriminant != std::mem::discriminant(&next) {
            log::info!("Voice state transition: {:?} -> {:?}", self.state, next);
        }
        self.state = next;

        for effect in effects {
            self.execute(effect);
        }
        if self.state == State::Terminated {
            // Manual close: the caller asked for it, so it hears nothing.
            self.on_status = None;
        }
        self.state_tx.send_replace(self.state.clone());

        // A request prepared while the last session was live still awaits
        // its open.
        if self.state == State::Terminated && self.pending_audio.is_some() {
            self.apply(Event::Initialize);
        }
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Connect { session } => self.connect(session),
            Effect::SendStartRecognition => {
                let message = ClientMessage::start_recognition(&self.audio_config);
                match serde_json::to_string(&message) {
                    Ok(json) => self.send_frame(Message::Text(json)),
                    Err(e) => log::error!("Failed to encode StartRecognition: {}", e),
                }
            }
            Effect::StartAudio => match (self.session_audio.take(), self.state.session()) {
                (Some(audio), Some(session)) => {
                    let token = CancellationToken::new();
                    self.pump = Some(token.clone());
                    tokio::spawn(pump_audio(session, audio, token, self.events_tx.clone()));
                }
                _ => log::warn!("StartAudio without an audio source"),
            },
            Effect::SendAudio { frame } => self.send_frame(Message::Binary(frame)),
            Effect::StopAudio => {
                if let Some(token) = self.pump.take() {
                    token.cancel();
                }
                if let Some(mut audio) = self.session_audio.take() {
                    audio.close();
                }
            }
            Effect::DiscardAudio => self.discard_pending_audio(),
            Effect::CloseSocket { code, reason } => {
                if let Some(outgoing) = self.outgoing.take() {
                    let frame = CloseFrame {
                        code: CloseCode::from(code),
                        reason: reason.into(),
                    };
                    // The socket task may already be gone.
                    let _ = outgoing.send(Message::Close(Some(frame)));
                }
            }
            Effect::EmitStatus(status) => match self.on_status.take() {
                Some(on_status) => on_status(status),
                None => log::warn!("Terminal status with no listener: {:?}", status),
            },
        }
    }

    fn connect(&mut self, session: Uuid) {
        let (url, audio) = match (self.url.clone(), self.pending_audio.take()) {
            (Some(url), Some(audio)) => (url, audio),
            _ => {
                let _ = self.events_tx.send(Event::Failed {
                    session,
                    error: W3wError::unknown("voice session opened without a prepared request"),
                });
                return;
            }
        };
        self.audio_config = audio.config();
        self.session_audio = Some(audio);

        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        self.outgoing = Some(outgoing_tx);
        tokio::spawn(run_socket(session, url, outgoing_rx, self.events_tx.clone()));
    }

    fn send_frame(&self, message: Message) {
        match &self.outgoing {
            Some(outgoing) => {
                if outgoing.send(message).is_err() {
                    log::debug!("Socket task gone; frame dropped");
                }
            }
            None => log::warn!("No open socket; frame dropped"),
        }
    }

    fn discard_pending_audio(&mut self) {
        if let Some(mut audio) = self.pending_audio.take() {
            audio.close();
        }
    }
}

// ============================================================================
// Socket and audio tasks
// ============================================================================

static CRYPTO_PROVIDER: Once = Once::new();

fn install_crypto_provider() {
    CRYPTO_PROVIDER.call_once(|| {
        if rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
        {
            log::debug!("TLS crypto provider already installed");
        }
    });
}

fn connection_error(message: impl Into<String>) -> W3wError {
    W3wError::Connection(ApiError::new(NETWORK_ERROR_CODE, message))
}

/// Owns the WebSocket for one session: writes what the loop queues, reads
/// server frames and reports them as events.
async fn run_socket(
    session: Uuid,
    url: Url,
    mut outgoing: mpsc::UnboundedReceiver<Message>,
    events: mpsc::UnboundedSender<Event>,
) {
    install_crypto_provider();

    let connect = timeout(
        CONNECTION_TIMEOUT,
        connect_async_with_config(url.as_str(), None, false),
    );
    tokio::pin!(connect);

    let ws_stream = loop {
        tokio::select! {
            result = &mut connect => match result {
                Ok(Ok((ws_stream, _response))) => break ws_stream,
                Ok(Err(e)) => {
                    log::warn!("Voice socket connection failed: {}", e);
                    let _ = events.send(Event::Failed { session, error: connection_error(e.to_string()) });
                    return;
                }
                Err(_) => {
                    log::warn!("Voice socket connection timed out");
                    let _ = events.send(Event::Failed { session, error: connection_error("Connection timeout") });
                    return;
                }
            },
            message = outgoing.recv() => match message {
                Some(Message::Close(_)) | None => {
                    log::info!("Session {} closed before the socket opened", session);
                    return;
                }
                Some(_) => log::warn!("Dropping frame queued before the socket opened"),
            },
        }
    };

    log::info!("Voice socket open for session {}", session);
    let _ = events.send(Event::SocketOpened { session });
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            message = outgoing.recv() => match message {
                Some(message) => {
                    let closing = matches!(message, Message::Close(_));
                    if let Err(e) = write.send(message).await {
                        log::warn!("Voice socket write failed: {}", e);
                        let _ = events.send(Event::Failed { session, error: connection_error(e.to_string()) });
                        break;
                    }
                    if closing {
                        // Let the server acknowledge; nothing it says matters now.
                        let _ = timeout(CLOSE_TIMEOUT, async {
                            while let Some(Ok(_)) = read.next().await {}
                        })
                        .await;
                        break;
                    }
                }
                None => {
                    let _ = write.close().await;
                    break;
                }
            },
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if let Some(event) = decode_server_message(session, &text) {
                        let _ = events.send(event);
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.into_owned()))
                        .unwrap_or((NO_STATUS_CLOSE, String::new()));
                    log::info!("Voice socket closed by server ({}): {}", code, reason);
                    let _ = events.send(Event::SocketClosed { session, code, reason });
                    break;
                }
                Some(Ok(_)) => {} // Ignore ping/pong/binary
                Some(Err(e)) => {
                    log::warn!("Voice socket error: {}", e);
                    let _ = events.send(Event::Failed { session, error: connection_error(e.to_string()) });
                    break;
                }
                None => {
                    let _ = events.send(Event::SocketClosed {
                        session,
                        code: ABNORMAL_CLOSE,
                        reason: String::new(),
                    });
                    break;
                }
            },
        }
    }

    log::debug!("Voice socket task for session {} exiting", session);
}

/// Map one text frame to the event it stands for; `None` for messages that
/// do not affect the session.
fn decode_server_message(session: Uuid, text: &str) -> Option<Event> {
    match serde_json::from_str::<ServerMessage>(text) {
        Ok(ServerMessage::RecognitionStarted) => Some(Event::RecognitionStarted { session }),
        Ok(ServerMessage::Suggestions { suggestions }) => {
            Some(match suggestions_to_domain(&suggestions) {
                Ok(suggestions) => Event::SuggestionsReceived {
                    session,
                    suggestions,
                },
                Err(e) => Event::Failed {
                    session,
                    error: e.into(),
                },
            })
        }
        Ok(ServerMessage::Error { kind, code, reason }) => Some(Event::Failed {
            session,
            error: W3wError::Streaming { kind, code, reason },
        }),
        Ok(ServerMessage::W3wError { error }) => Some(Event::Failed {
            session,
            error: W3wError::from_code(&error.code, error.message),
        }),
        Ok(ServerMessage::Unknown) => {
            log::debug!("Ignoring voice message: {}", text);
            None
        }
        Err(e) => {
            log::warn!("Failed to parse voice message: {}", e);
            Some(Event::Failed {
                session,
                error: W3wError::unknown(format!("failed to decode voice message: {}", e)),
            })
        }
    }
}

async fn pump_audio(
    session: Uuid,
    mut audio: Box<dyn AudioSource>,
    token: CancellationToken,
    events: mpsc::UnboundedSender<Event>,
) {
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            buffer = audio.next_buffer() => match buffer {
                Some(samples) => {
                    if events.send(Event::AudioCaptured { session, samples }).is_err() {
                        break;
                    }
                }
                None => {
                    let _ = events.send(Event::AudioExhausted { session });
                    break;
                }
            },
        }
    }
    audio.close();
}
