//! Audio input for voice sessions.
//!
//! A session pulls buffers of 16-bit PCM from an [`AudioSource`] until it
//! returns `None`, then closes it. [`AudioStream`] is the stock source: a
//! bounded channel that any capture backend can feed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Sample encoding announced to the server in `StartRecognition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AudioEncoding {
    #[default]
    PcmS16le,
    PcmF32le,
    Mulaw,
}

impl AudioEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioEncoding::PcmS16le => "pcm_s16le",
            AudioEncoding::PcmF32le => "pcm_f32le",
            AudioEncoding::Mulaw => "mulaw",
        }
    }

    /// Parse a wire name, falling back to `pcm_s16le` for anything unknown.
    pub fn from_name(name: &str) -> Self {
        match name {
            "pcm_f32le" => AudioEncoding::PcmF32le,
            "mulaw" => AudioEncoding::Mulaw,
            _ => AudioEncoding::PcmS16le,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioStreamConfig {
    pub encoding: AudioEncoding,
    pub sample_rate: u32,
}

impl Default for AudioStreamConfig {
    fn default() -> Self {
        Self {
            encoding: AudioEncoding::PcmS16le,
            sample_rate: 44_100,
        }
    }
}

/// A pull-based source of PCM buffers owned by one voice session at a time.
#[async_trait]
pub trait AudioSource: Send + 'static {
    fn config(&self) -> AudioStreamConfig;

    /// Next buffer of samples, or `None` once the source is exhausted or closed.
    async fn next_buffer(&mut self) -> Option<Vec<i16>>;

    /// Stop producing. Must be idempotent.
    fn close(&mut self);
}

/// Channel-fed [`AudioSource`].
///
/// ```no_run
/// # use w3w_wrapper::voice::{AudioStream, AudioStreamConfig};
/// # async fn feed() {
/// let (stream, producer) = AudioStream::channel(AudioStreamConfig::default(), 16);
/// producer.send(vec![0i16; 1024]).await.ok();
/// drop(producer); // ends the stream
/// # drop(stream);
/// # }
/// ```
pub struct AudioStream {
    config: AudioStreamConfig,
    rx: mpsc::Receiver<Vec<i16>>,
}

impl AudioStream {
    /// Create a stream and the sender that feeds it. Dropping every sender
    /// exhausts the stream; closing the stream makes further sends fail.
    pub fn channel(config: AudioStreamConfig, capacity: usize) -> (Self, mpsc::Sender<Vec<i16>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { config, rx }, tx)
    }
}

#[async_trait]
impl AudioSource for AudioStream {
    fn config(&self) -> AudioStreamConfig {
        self.config
    }

    async fn next_buffer(&mut self) -> Option<Vec<i16>> {
        self.rx.recv().await
    }

    fn close(&mut self) {
        self.rx.close();
    }
}
