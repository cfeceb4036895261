use thiserror::Error;

use consona_core::voices::VoiceManagerInitError;

mod config;
pub use config::*;

mod ticker;
pub use ticker::*;

mod realtime_piano;
pub use realtime_piano::*;

mod event_senders;
pub use event_senders::*;

#[derive(Debug, Error)]
pub enum RealtimeInitError {
    #[error("Failed to set up the voices: {0}")]
    Voices(#[from] VoiceManagerInitError),

    #[error("Tick framerate must be a positive number, got {0}")]
    InvalidFramerate(f64),

    #[error("Failed to spawn the tick thread: {0}")]
    Thread(#[from] std::io::Error),
}
