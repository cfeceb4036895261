use consona_core::voices::VoiceManagerConfig;

/// Options for initializing a new RealtimePiano.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RealtimeConfig {
    /// The voice manager options. Its framerate is also the rate of the
    /// tick thread.
    pub voices: VoiceManagerConfig,

    /// The name of the tick thread.
    ///
    /// Default: `consona_tick`
    pub thread_name: String,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            voices: Default::default(),
            thread_name: "consona_tick".to_string(),
        }
    }
}
