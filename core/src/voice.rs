mod envelopes;
pub use envelopes::*;

/// One sounding (or fading) note.
///
/// Only tracks time in ticks, the volume gets derived from it by `EnvelopeParameters`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voice {
    key: u8,
    initial_velocity: f64,
    previous_volume: f64,
    holdtime: u32,
    releasedtime: u32,
    released: bool,
}

impl Voice {
    /// A new voice, attacking from silence.
    pub fn new(key: u8, velocity: f64) -> Self {
        Voice::with_previous_volume(key, velocity, 0.0)
    }

    /// A new voice, attacking from `previous_volume`.
    pub fn with_previous_volume(key: u8, velocity: f64, previous_volume: f64) -> Self {
        Voice {
            key,
            initial_velocity: velocity,
            previous_volume,
            holdtime: 0,
            releasedtime: 0,
            released: false,
        }
    }

    /// Restarts the envelope. The attack starts at `previous_volume`, the volume the
    /// voice had at the moment it got struck again.
    pub fn retrigger(&mut self, velocity: f64, previous_volume: f64) {
        self.initial_velocity = velocity;
        self.previous_volume = previous_volume;
        self.holdtime = 0;
        self.releasedtime = 0;
        self.released = false;
    }

    /// Starts the release. Only possible once per trigger, returns false if the
    /// voice was already released.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        self.releasedtime = self.holdtime;
        true
    }

    pub fn increment_holdtime(&mut self) {
        self.holdtime = self.holdtime.saturating_add(1);
    }

    pub fn key(&self) -> u8 {
        self.key
    }

    /// The velocity of the last (re)trigger, 0-1.
    pub fn initial_velocity(&self) -> f64 {
        self.initial_velocity
    }

    /// The volume at the moment of the last (re)trigger, 0-1.
    pub fn previous_volume(&self) -> f64 {
        self.previous_volume
    }

    /// Ticks since the last (re)trigger.
    pub fn holdtime(&self) -> u32 {
        self.holdtime
    }

    /// The holdtime at the moment of the release. Only meaningful once released.
    pub fn releasedtime(&self) -> u32 {
        self.releasedtime
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}
