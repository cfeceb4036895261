use thiserror::Error;

/// An error reported by a note output or display.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Output is unavailable: {0}")]
    Unavailable(String),

    #[error("No element exists for note {0}")]
    NoElement(u8),

    #[error("{0}")]
    Other(String),
}

/// Sends notes to an external sound generator (e.g. over MIDI or OSC).
pub trait NoteOutput: Sync + Send {
    /// Turns on the given note. `velocity` is between 0 and 1.
    fn note_on(&self, key: u8, velocity: f64) -> Result<(), OutputError>;

    /// Turns off the given note.
    fn note_off(&self, key: u8) -> Result<(), OutputError>;

    /// Sets the damper pedal, between 0 and 1.
    fn sustain(&self, value: f64) -> Result<(), OutputError>;
}

/// Visualizes the notes in range, one element per note.
pub trait NoteDisplay: Sync + Send {
    /// Marks the element of the note as pressed or not.
    fn set_active(&self, key: u8, active: bool) -> Result<(), OutputError>;

    /// Sets the strength to draw the element of the note with, in (0, 1].
    /// Receives the consonance of the note on every tick.
    fn set_strength(&self, key: u8, strength: f64) -> Result<(), OutputError>;
}

/// Discards everything. Used when no display or note output is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOutput;

impl NoteOutput for NoOutput {
    fn note_on(&self, _key: u8, _velocity: f64) -> Result<(), OutputError> {
        Ok(())
    }

    fn note_off(&self, _key: u8) -> Result<(), OutputError> {
        Ok(())
    }

    fn sustain(&self, _value: f64) -> Result<(), OutputError> {
        Ok(())
    }
}

impl NoteDisplay for NoOutput {
    fn set_active(&self, _key: u8, _active: bool) -> Result<(), OutputError> {
        Ok(())
    }

    fn set_strength(&self, _key: u8, _strength: f64) -> Result<(), OutputError> {
        Ok(())
    }
}
