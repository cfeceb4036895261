use thiserror::Error;

use super::Voice;

/// The stages of a voice's envelope
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EnvelopeStage {
    /// Ramping from the previous volume up to the velocity
    Attack,
    /// Ramping from the velocity down to the sustain level
    Decay,
    /// Holding the sustain level until released
    Sustain,
    /// Fading to zero. Goes to this stage when released, or right after
    /// the attack when the sustain is not held
    Release,
    /// Silent, the voice gets removed on the next tick
    Finished,
}

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Framerate must be a positive number, got {0}")]
    InvalidFramerate(f64),

    #[error("The {stage} time must be a non-negative number of seconds, got {seconds}")]
    NegativeDuration { stage: &'static str, seconds: f64 },

    #[error("Sustain level must be between 0 and 1, got {0}")]
    InvalidSustain(f64),
}

/// The envelope of a voice, with its times in seconds.
/// Use `to_envelope_params` to convert it to ticks of a given framerate.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct EnvelopeDescriptor {
    pub attack: f64,          // Seconds
    pub decay: f64,           // Seconds
    pub sustain_percent: f64, // % of the velocity (0-1)
    pub release: f64,         // Seconds

    /// If true, a voice holds its sustain level after attack and decay until it gets
    /// released. If false (pluck mode) there are no decay and sustain stages, the
    /// release starts right after the attack.
    pub hold_sustain: bool,
}

impl Default for EnvelopeDescriptor {
    fn default() -> Self {
        EnvelopeDescriptor {
            attack: 0.15,
            decay: 0.5,
            sustain_percent: 0.65,
            release: 1.0,
            hold_sustain: true,
        }
    }
}

fn seconds_to_ticks(
    stage: &'static str,
    seconds: f64,
    framerate: f64,
) -> Result<u32, EnvelopeError> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(EnvelopeError::NegativeDuration { stage, seconds });
    }
    // Whole ticks only, a started tick is not counted
    Ok((seconds * framerate).floor() as u32)
}

impl EnvelopeDescriptor {
    #[allow(clippy::wrong_self_convention)]
    pub fn to_envelope_params(
        &self,
        framerate: f64,
    ) -> Result<EnvelopeParameters, EnvelopeError> {
        if !framerate.is_finite() || framerate <= 0.0 {
            return Err(EnvelopeError::InvalidFramerate(framerate));
        }

        EnvelopeParameters::new(
            seconds_to_ticks("attack", self.attack, framerate)?,
            seconds_to_ticks("decay", self.decay, framerate)?,
            self.sustain_percent,
            seconds_to_ticks("release", self.release, framerate)?,
            self.hold_sustain,
        )
    }
}

/// Linear ramp from `from` to `to`. A zero length ramp is already at its end.
#[inline(always)]
fn lerp(from: f64, to: f64, elapsed: u32, duration: u32) -> f64 {
    if duration == 0 {
        to
    } else {
        from + (to - from) * (elapsed as f64 / duration as f64)
    }
}

/// The envelope in ticks, used to calculate the volume of voices.
/// Use `EnvelopeDescriptor` to create it from times in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParameters {
    attack: u32,
    decay: u32,
    sustain: f64,
    release: u32,
    hold_sustain: bool,
}

impl EnvelopeParameters {
    pub fn new(
        attack: u32,
        decay: u32,
        sustain: f64,
        release: u32,
        hold_sustain: bool,
    ) -> Result<EnvelopeParameters, EnvelopeError> {
        if !(0.0..=1.0).contains(&sustain) {
            return Err(EnvelopeError::InvalidSustain(sustain));
        }

        Ok(EnvelopeParameters {
            attack,
            decay,
            sustain,
            release,
            hold_sustain,
        })
    }

    pub fn attack(&self) -> u32 {
        self.attack
    }

    pub fn decay(&self) -> u32 {
        self.decay
    }

    pub fn sustain(&self) -> f64 {
        self.sustain
    }

    pub fn release(&self) -> u32 {
        self.release
    }

    pub fn hold_sustain(&self) -> bool {
        self.hold_sustain
    }

    /// Value of the attack ramp at `time`. Starts at the volume the voice had when it
    /// was (re)triggered rather than at 0.
    fn attack_value(&self, voice: &Voice, time: u32) -> f64 {
        lerp(
            voice.previous_volume(),
            voice.initial_velocity(),
            time,
            self.attack,
        )
    }

    /// Value of the decay ramp at `time`, or the sustain level once it is over.
    fn held_value(&self, voice: &Voice, time: u32) -> f64 {
        let velocity = voice.initial_velocity();
        if time <= self.attack.saturating_add(self.decay) {
            lerp(
                velocity,
                velocity * self.sustain,
                time - self.attack,
                self.decay,
            )
        } else {
            velocity * self.sustain
        }
    }

    /// Pluck mode: fading out from the velocity right after the attack.
    fn pluck_value(&self, voice: &Voice) -> f64 {
        let elapsed = voice.holdtime() - self.attack;
        voice.initial_velocity() * self.fade(elapsed)
    }

    /// Factor for a release that has been going on for `elapsed` ticks.
    fn fade(&self, elapsed: u32) -> f64 {
        lerp(1.0, 0.0, elapsed, self.release)
    }

    /// The current volume of the voice (0-1).
    pub fn volume(&self, voice: &Voice) -> f64 {
        let holdtime = voice.holdtime();

        let volume = if !voice.is_released() {
            if holdtime <= self.attack {
                self.attack_value(voice, holdtime)
            } else if self.hold_sustain {
                self.held_value(voice, holdtime)
            } else {
                self.pluck_value(voice)
            }
        } else {
            let releasedtime = voice.releasedtime();
            let fade = self.fade(holdtime - releasedtime);

            if releasedtime <= self.attack {
                self.attack_value(voice, releasedtime) * fade
            } else if self.hold_sustain {
                self.held_value(voice, releasedtime) * fade
            } else {
                // The release already started after the attack
                self.pluck_value(voice)
            }
        };

        // Ramps go below zero past their end
        volume.max(0.0)
    }

    /// The stage the voice is in.
    pub fn stage(&self, voice: &Voice) -> EnvelopeStage {
        if self.volume(voice) <= 0.0 && voice.holdtime() > 0 {
            return EnvelopeStage::Finished;
        }

        let holdtime = voice.holdtime();
        if voice.is_released() {
            EnvelopeStage::Release
        } else if holdtime <= self.attack {
            EnvelopeStage::Attack
        } else if !self.hold_sustain {
            EnvelopeStage::Release
        } else if holdtime <= self.attack.saturating_add(self.decay) {
            EnvelopeStage::Decay
        } else {
            EnvelopeStage::Sustain
        }
    }
}
