use crate::{consonance::ConsonanceConfig, voice::EnvelopeDescriptor};

/// Options for initializing a new VoiceManager.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct VoiceManagerConfig {
    /// The note range and dissonance table parameters.
    /// See the `ConsonanceConfig` documentation for more information.
    pub consonance: ConsonanceConfig,

    /// The envelope applied to every voice, in seconds.
    /// See the `EnvelopeDescriptor` documentation for more information.
    pub envelope: EnvelopeDescriptor,

    /// How many times per second `tick` gets called. Used to convert the
    /// envelope times to ticks.
    ///
    /// Default: `60.0`
    pub framerate: f64,
}

impl Default for VoiceManagerConfig {
    fn default() -> Self {
        Self {
            consonance: Default::default(),
            envelope: Default::default(),
            framerate: 60.0,
        }
    }
}
