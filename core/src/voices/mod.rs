use std::{
    collections::HashMap,
    ops::RangeInclusive,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use atomic_refcell::AtomicRefCell;
use log::{debug, info, warn};
use thiserror::Error;
use to_vec::ToVec;

use crate::{
    consonance::{ConsonanceEngine, ConsonanceInitError, ConsonanceMap},
    helpers::midi_value_to_unit,
    output::{NoteDisplay, NoteOutput, OutputError},
    voice::{EnvelopeError, EnvelopeParameters, EnvelopeStage, Voice},
};

mod config;
pub use config::*;

mod event;
pub use event::*;

mod key;
use key::*;

mod params;
pub use params::*;

#[derive(Debug, Error)]
pub enum VoiceManagerInitError {
    #[error("Failed to set up the consonance engine: {0}")]
    Consonance(#[from] ConsonanceInitError),

    #[error("Invalid envelope: {0}")]
    Envelope(#[from] EnvelopeError),
}

fn log_failure(action: &str, key: Option<u8>, result: Result<(), OutputError>) {
    if let Err(err) = result {
        match key {
            Some(key) => warn!("{action} failed for note {key}: {err}"),
            None => warn!("{action} failed: {err}"),
        }
    }
}

/// Owns the voices of every note in range and turns note events into
/// envelope state.
///
/// Note events may come from any number of threads at once. `tick` advances
/// all voices by one step, calculates the consonances of the sounding notes
/// and pushes them to the display. Each note has its own lock, held only for
/// the few instructions that touch its voice, so the tick never waits on
/// a producer for longer than that, and collaborators are never called with
/// a lock held.
pub struct VoiceManager {
    keys: Box<[Key]>,
    consonance: ConsonanceEngine,
    envelope: EnvelopeParameters,

    sustain: AtomicBool,

    /// Scratch space for the volumes of one tick.
    voice_values: AtomicRefCell<HashMap<u8, f64>>,

    display: Arc<dyn NoteDisplay>,
    output: Option<Arc<dyn NoteOutput>>,

    stats: VoiceManagerStats,
}

impl VoiceManager {
    /// Initializes a new manager, building the dissonance table and converting
    /// the envelope to ticks at the configured framerate.
    ///
    /// See the `VoiceManagerConfig` documentation for the available options.
    pub fn new(
        config: VoiceManagerConfig,
        display: Arc<dyn NoteDisplay>,
    ) -> Result<Self, VoiceManagerInitError> {
        let envelope = config.envelope.to_envelope_params(config.framerate)?;
        let consonance = ConsonanceEngine::new(config.consonance)?;

        info!(
            "Voice manager set up at {} fps, envelope {:?}",
            config.framerate, envelope
        );

        Ok(Self::with_engine(consonance, envelope, display))
    }

    /// Creates a manager from an existing engine, so several managers can share
    /// one dissonance table.
    pub fn with_engine(
        consonance: ConsonanceEngine,
        envelope: EnvelopeParameters,
        display: Arc<dyn NoteDisplay>,
    ) -> Self {
        let keys = consonance.note_range().map(|_| Key::default()).to_vec();

        VoiceManager {
            keys: keys.into_boxed_slice(),
            consonance,
            envelope,
            sustain: AtomicBool::new(false),
            voice_values: AtomicRefCell::new(HashMap::new()),
            display,
            output: None,
            stats: VoiceManagerStats::new(),
        }
    }

    /// Forwards note and sustain events to `output` from now on.
    pub fn with_output(mut self, output: Arc<dyn NoteOutput>) -> Self {
        self.output = Some(output);
        self
    }

    fn slot(&self, key: u8) -> Option<&Key> {
        let index = key.checked_sub(self.consonance.notestart())?;
        self.keys.get(index as usize)
    }

    /// Strikes a note. A sounding voice is retriggered from its current volume,
    /// and keeps that volume if it is louder than `velocity`.
    ///
    /// Returns false, without any side effects, for notes outside the range.
    pub fn note_on(&self, key: u8, velocity: f64) -> bool {
        let Some(slot) = self.slot(key) else {
            return false;
        };

        let velocity = if velocity.is_nan() {
            0.0
        } else {
            velocity.clamp(0.0, 1.0)
        };

        let retriggered = slot.lock().note_on(key, velocity, &self.envelope);
        if retriggered {
            debug!("Retriggered note {key} at velocity {velocity}");
        }

        log_failure("Activating", Some(key), self.display.set_active(key, true));
        if let Some(output) = &self.output {
            log_failure("Note on", Some(key), output.note_on(key, velocity));
        }

        true
    }

    /// Releases a note, or schedules the release while the sustain pedal is held.
    ///
    /// The display and output are told about the release even if nothing is
    /// sounding. Returns false if the note had no voice left to release, and
    /// true if it got released or, with the pedal held, scheduled for release.
    pub fn release_voice(&self, key: u8) -> bool {
        let Some(slot) = self.slot(key) else {
            return false;
        };

        log_failure("Deactivating", Some(key), self.display.set_active(key, false));
        if let Some(output) = &self.output {
            log_failure("Note off", Some(key), output.note_off(key));
        }

        let sustained = self.sustain.load(Ordering::Acquire);
        slot.lock().release(sustained)
    }

    /// Holds or lifts the sustain pedal. Releases deferred while it was held
    /// happen on the next tick after lifting it.
    pub fn set_sustain(&self, held: bool) {
        self.apply_sustain(held, if held { 1.0 } else { 0.0 });
    }

    fn apply_sustain(&self, held: bool, output_value: f64) {
        let was_held = self.sustain.swap(held, Ordering::AcqRel);
        if was_held != held {
            debug!("Sustain {}", if held { "held" } else { "lifted" });
        }

        if let Some(output) = &self.output {
            log_failure("Sustain", None, output.sustain(output_value));
        }
    }

    /// Releases every note in range.
    pub fn all_notes_off(&self) {
        for key in self.note_range() {
            self.release_voice(key);
        }
    }

    /// Advances every voice by one tick and returns the consonance of every
    /// note in range, which is also pushed to the display.
    ///
    /// # Panics
    ///
    /// If called again while another call is still running. Ticks come from a
    /// single clock.
    pub fn tick(&self) -> ConsonanceMap {
        let sustained = self.sustain.load(Ordering::Acquire);

        let consonances = {
            let mut voice_values = self.voice_values.borrow_mut();
            voice_values.clear();

            for (key, slot) in self.note_range().zip(self.keys.iter()) {
                let mut data = slot.lock();
                if !sustained {
                    data.flush_scheduled_release();
                }
                if let Some(volume) = data.advance(&self.envelope) {
                    voice_values.insert(key, volume);
                }
            }

            self.stats
                .voice_counter
                .store(voice_values.len() as u64, Ordering::Relaxed);

            self.consonance.calculate(&voice_values)
        };

        for (&key, &consonance) in consonances.iter() {
            log_failure("Drawing", Some(key), self.display.set_strength(key, consonance));
        }

        self.stats.tick_counter.fetch_add(1, Ordering::Relaxed);
        consonances
    }

    pub fn send_event(&self, event: VoiceEvent) {
        self.push_events_iter(std::iter::once(event));
    }

    pub fn push_events_iter<T: Iterator<Item = VoiceEvent>>(&self, iter: T) {
        for event in iter {
            match event {
                VoiceEvent::NoteOn { key, vel } => {
                    self.note_on(key, vel);
                }
                VoiceEvent::NoteOff { key } => {
                    self.release_voice(key);
                }
                VoiceEvent::AllNotesOff => self.all_notes_off(),
                VoiceEvent::Control(control) => self.process_control_event(control),
            }
        }
    }

    pub fn process_control_event(&self, event: ControlEvent) {
        match event {
            ControlEvent::Sustain(held) => self.set_sustain(held),
            ControlEvent::Raw(controller, value) => match controller {
                0x40 => {
                    // Damper / Sustain
                    self.apply_sustain(value >= 64, midi_value_to_unit(value));
                }
                0x7B => {
                    // All Notes Off
                    if value == 0 {
                        self.all_notes_off();
                    }
                }
                _ => {}
            },
        }
    }

    /// A copy of the voice of the note, if it has one.
    pub fn voice(&self, key: u8) -> Option<Voice> {
        self.slot(key)?.lock().voice().copied()
    }

    /// The envelope volume of the note as of the last tick.
    pub fn volume(&self, key: u8) -> Option<f64> {
        self.voice(key).map(|voice| self.envelope.volume(&voice))
    }

    pub fn stage(&self, key: u8) -> Option<EnvelopeStage> {
        self.voice(key).map(|voice| self.envelope.stage(&voice))
    }

    pub fn is_release_scheduled(&self, key: u8) -> bool {
        self.slot(key)
            .map(|slot| slot.lock().is_release_scheduled())
            .unwrap_or(false)
    }

    /// The number of notes that currently have a voice.
    pub fn voice_count(&self) -> usize {
        self.keys
            .iter()
            .filter(|slot| slot.lock().voice().is_some())
            .count()
    }

    pub fn is_sustained(&self) -> bool {
        self.sustain.load(Ordering::Acquire)
    }

    pub fn note_range(&self) -> RangeInclusive<u8> {
        self.consonance.note_range()
    }

    pub fn consonance(&self) -> &ConsonanceEngine {
        &self.consonance
    }

    pub fn envelope(&self) -> &EnvelopeParameters {
        &self.envelope
    }

    /// Returns a reader for the voice and tick counters.
    pub fn get_stats(&self) -> VoiceManagerStatsReader {
        VoiceManagerStatsReader::new(self.stats.clone())
    }
}
