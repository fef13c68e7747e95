//! Voice client state machine.
//!
//! Every transition of a [`VoiceClient`](super::VoiceClient) goes through
//! [`reduce`], which returns the next state plus the effects the session loop
//! must carry out. Socket and audio tasks only ever report [`Event`]s back, so
//! the loop is the single writer of the state.
//!
//! `EmitStatus` is produced only on the transition into `Terminated`, and
//! `Terminated` absorbs every later session event; that is what makes the
//! status callback fire at most once per connection attempt.

use uuid::Uuid;

use super::protocol::{close_error, pcm_frame, NORMAL_CLOSE};
use crate::error::{W3wError, W3wResult};
use crate::types::Suggestion;

pub const ABORTED_BY_NEW_REQUEST: &str = "Aborted by new request";
pub const RECOGNITION_COMPLETE: &str = "Recognition complete";
pub const RECOGNITION_FAILED: &str = "Recognition failed";

#[derive(Debug, Clone, PartialEq, Default)]
pub enum State {
    /// No request has been built.
    #[default]
    Idle,
    /// Request and audio source are ready; nothing is connected.
    Initialized,
    /// Socket is being opened (`socket_open == false`) or is open and waiting
    /// for `RecognitionStarted`.
    Connecting { session: Uuid, socket_open: bool },
    /// Audio is flowing.
    Streaming { session: Uuid },
    Terminated,
}

impl State {
    pub fn session(&self) -> Option<Uuid> {
        match self {
            State::Connecting { session, .. } | State::Streaming { session } => Some(*session),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    /// A request was (re)built with a fresh audio source.
    Initialize,
    /// Caller asked to open a socket for a new session.
    Open { session: Uuid },
    /// Caller asked to stop; no status is reported for this.
    ManualClose { reason: String },

    // Socket events
    SocketOpened { session: Uuid },
    RecognitionStarted { session: Uuid },
    SuggestionsReceived {
        session: Uuid,
        suggestions: Vec<Suggestion>,
    },
    /// Server reported an error, a frame failed to decode, or the transport broke.
    Failed { session: Uuid, error: W3wError },
    SocketClosed {
        session: Uuid,
        code: u16,
        reason: String,
    },

    // Audio events
    AudioCaptured { session: Uuid, samples: Vec<i16> },
    AudioExhausted { session: Uuid },
}

impl Event {
    fn session(&self) -> Option<Uuid> {
        use Event::*;
        match self {
            Initialize | Open { .. } | ManualClose { .. } => None,
            SocketOpened { session }
            | RecognitionStarted { session }
            | SuggestionsReceived { session, .. }
            | Failed { session, .. }
            | SocketClosed { session, .. }
            | AudioCaptured { session, .. }
            | AudioExhausted { session } => Some(*session),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Effect {
    /// Open the socket for `session`, handing it the pending audio source.
    Connect { session: Uuid },
    SendStartRecognition,
    /// Start pumping the session's audio source.
    StartAudio,
    SendAudio { frame: Vec<u8> },
    /// Stop the pump and close the session's audio source.
    StopAudio,
    /// Close the initialized-but-never-opened audio source.
    DiscardAudio,
    CloseSocket { code: u16, reason: String },
    /// Deliver the terminal status to the caller.
    EmitStatus(W3wResult<Vec<Suggestion>>),
}

/// Reducer function: (state, event) -> (next_state, effects)
///
/// Session events whose id does not match the live session are dropped.
pub fn reduce(state: &State, event: Event) -> (State, Vec<Effect>) {
    use Effect::*;
    use Event::*;
    use State::*;

    let current = state.session();
    if let Some(eid) = event.session() {
        if current != Some(eid) {
            log::debug!("Dropping stale event for session {}", eid);
            return (state.clone(), vec![]);
        }
    }

    let teardown = |status: W3wResult<Vec<Suggestion>>, reason: &str| {
        vec![
            StopAudio,
            CloseSocket {
                code: NORMAL_CLOSE,
                reason: reason.to_string(),
            },
            EmitStatus(status),
        ]
    };

    match (state, event) {
        // -----------------
        // Idle
        // -----------------
        (Idle, Initialize) => (Initialized, vec![]),
        (Idle, ManualClose { .. }) => (Idle, vec![]),

        // -----------------
        // Initialized
        // -----------------
        (Initialized, Initialize) => (Initialized, vec![]),
        (Initialized, Open { session }) => (
            Connecting {
                session,
                socket_open: false,
            },
            vec![Connect { session }],
        ),
        (Initialized, ManualClose { .. }) => (Terminated, vec![DiscardAudio]),

        // -----------------
        // Connecting / Streaming
        // -----------------
        (Connecting { .. } | Streaming { .. }, Initialize) => (state.clone(), vec![]),
        (Connecting { .. } | Streaming { .. }, Open { session }) => (
            Connecting {
                session,
                socket_open: false,
            },
            vec![
                StopAudio,
                CloseSocket {
                    code: NORMAL_CLOSE,
                    reason: ABORTED_BY_NEW_REQUEST.to_string(),
                },
                Connect { session },
            ],
        ),
        (Connecting { .. } | Streaming { .. }, ManualClose { reason }) => (
            Terminated,
            vec![
                StopAudio,
                DiscardAudio,
                CloseSocket {
                    code: NORMAL_CLOSE,
                    reason,
                },
            ],
        ),
        (
            Connecting {
                session,
                socket_open: false,
            },
            SocketOpened { .. },
        ) => (
            Connecting {
                session: *session,
                socket_open: true,
            },
            vec![SendStartRecognition],
        ),
        (Connecting { session, .. }, RecognitionStarted { .. }) => {
            (Streaming { session: *session }, vec![StartAudio])
        }
        (Connecting { .. } | Streaming { .. }, SuggestionsReceived { suggestions, .. }) => {
            (Terminated, teardown(Ok(suggestions), RECOGNITION_COMPLETE))
        }
        (Connecting { .. } | Streaming { .. }, Failed { error, .. }) => {
            (Terminated, teardown(Err(error), RECOGNITION_FAILED))
        }
        (Connecting { .. } | Streaming { .. }, SocketClosed { code, reason, .. }) => (
            Terminated,
            teardown(Err(close_error(code, &reason)), RECOGNITION_COMPLETE),
        ),
        (Streaming { .. }, AudioCaptured { samples, .. }) => (
            state.clone(),
            vec![SendAudio {
                frame: pcm_frame(&samples),
            }],
        ),
        (Streaming { session }, AudioExhausted { .. }) => {
            log::debug!("Audio source for session {} is exhausted", session);
            (state.clone(), vec![])
        }

        // -----------------
        // Terminated
        // -----------------
        (Terminated, Initialize) => (Initialized, vec![]),
        (Terminated, ManualClose { .. }) => (Terminated, vec![]),

        // Catch-all: ignore unexpected events
        (s, e) => {
            log::debug!("Ignoring event {:?} in state {:?}", e, s);
            (s.clone(), vec![])
        }
    }
}
