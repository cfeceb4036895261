use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::voice::{EnvelopeParameters, Voice};

/// The state of a single note: its voice, if any, and whether a release is
/// waiting for the sustain pedal to be lifted.
#[derive(Debug, Default)]
pub(super) struct KeyData {
    voice: Option<Voice>,
    release_scheduled: bool,
}

impl KeyData {
    /// Starts a voice, or retriggers the existing one from its current volume.
    /// Returns true if an existing voice got retriggered.
    pub fn note_on(&mut self, key: u8, velocity: f64, envelope: &EnvelopeParameters) -> bool {
        // A new strike cancels a release deferred by the sustain pedal
        self.release_scheduled = false;

        match &mut self.voice {
            Some(voice) => {
                let previous_volume = envelope.volume(voice);
                // No downward attack, a voice louder than the new velocity keeps its level
                voice.retrigger(velocity.max(previous_volume), previous_volume);
                true
            }
            None => {
                self.voice = Some(Voice::new(key, velocity));
                false
            }
        }
    }

    /// Releases the voice, or schedules the release while `sustained`.
    /// Returns false if there is no voice that is not released yet.
    pub fn release(&mut self, sustained: bool) -> bool {
        match &mut self.voice {
            Some(voice) if !voice.is_released() => {
                if sustained {
                    self.release_scheduled = true;
                } else {
                    voice.release();
                }
                true
            }
            _ => false,
        }
    }

    /// Performs a release deferred by the sustain pedal.
    pub fn flush_scheduled_release(&mut self) {
        if std::mem::take(&mut self.release_scheduled) {
            if let Some(voice) = &mut self.voice {
                voice.release();
            }
        }
    }

    /// Advances the voice by one tick and returns its new volume.
    /// A voice that became silent is removed.
    pub fn advance(&mut self, envelope: &EnvelopeParameters) -> Option<f64> {
        let voice = self.voice.as_mut()?;
        voice.increment_holdtime();

        let volume = envelope.volume(voice);
        if volume <= 0.0 {
            self.voice = None;
            self.release_scheduled = false;
            None
        } else {
            Some(volume)
        }
    }

    pub fn voice(&self) -> Option<&Voice> {
        self.voice.as_ref()
    }

    pub fn is_release_scheduled(&self) -> bool {
        self.release_scheduled
    }
}

/// A lock per note, so producers on different notes never contend, and the
/// tick only ever holds one of them at a time.
#[derive(Debug, Default)]
pub(super) struct Key {
    data: Mutex<KeyData>,
}

impl Key {
    pub fn lock(&self) -> MutexGuard<'_, KeyData> {
        // KeyData is valid after any panic, as no method leaves it half updated
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope() -> EnvelopeParameters {
        EnvelopeParameters::new(9, 30, 0.65, 60, true).unwrap()
    }

    #[test]
    fn test_voice_removed_when_silent() {
        let envelope = envelope();
        let mut data = KeyData::default();

        assert!(!data.note_on(60, 1.0, &envelope));
        assert!(data.advance(&envelope).is_some());
        assert!(data.release(false));

        for _ in 0..59 {
            assert!(data.advance(&envelope).is_some());
        }
        assert_eq!(data.advance(&envelope), None);
        assert!(data.voice().is_none());
        assert_eq!(data.advance(&envelope), None);
    }

    #[test]
    fn test_scheduled_release() {
        let envelope = envelope();
        let mut data = KeyData::default();
        data.note_on(60, 1.0, &envelope);

        assert!(data.release(true));
        assert!(data.is_release_scheduled());
        assert!(!data.voice().unwrap().is_released());

        data.flush_scheduled_release();
        assert!(!data.is_release_scheduled());
        assert!(data.voice().unwrap().is_released());
        assert!(!data.release(false));
    }

    #[test]
    fn test_retrigger_keeps_louder_level() {
        let envelope = envelope();
        let mut data = KeyData::default();
        data.note_on(60, 1.0, &envelope);
        for _ in 0..9 {
            data.advance(&envelope);
        }

        assert!(data.note_on(60, 0.2, &envelope));
        let voice = data.voice().unwrap();
        assert_eq!(voice.holdtime(), 0);
        assert!((voice.previous_volume() - 1.0).abs() < 1e-9);
        assert!((voice.initial_velocity() - 1.0).abs() < 1e-9);
    }
}
