#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoiceEvent {
    /// Starts a new voice, or retriggers a sounding one. Velocity is between 0 and 1
    NoteOn { key: u8, vel: f64 },
    /// Releases a voice
    NoteOff { key: u8 },
    /// Releases all voices in range
    AllNotesOff,
    /// Control event for the voices
    Control(ControlEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// A raw MIDI control change, controller and value.
    /// Only the damper pedal (64) and All Notes Off (123) are handled
    Raw(u8, u8),

    /// Holds or lifts the sustain pedal
    Sustain(bool),
}
