use std::{
    collections::{BTreeMap, HashMap},
    ops::RangeInclusive,
    sync::Arc,
};

use thiserror::Error;
use to_vec::ToVec;

mod config;
pub use config::*;

mod rational;
pub use rational::*;

mod table;
pub use table::*;

/// The count of addressable MIDI notes.
pub const MIDI_NOTE_COUNT: usize = 128;

#[derive(Debug, Error)]
pub enum ConsonanceInitError {
    #[error("The note range must contain at least one note")]
    EmptyNoteRange,

    #[error("Note range starting at {notestart} with {notecount} notes exceeds the MIDI note range")]
    NoteRangeOutOfBounds { notestart: u8, notecount: usize },

    #[error("Bell width must be a positive number, got {0}")]
    InvalidBellWidth(f64),
}

/// Consonance values by MIDI note number, for every note in range.
pub type ConsonanceMap = BTreeMap<u8, f64>;

/// Calculates the consonances for a range of notes on the 12-TET scale, given a
/// set of sounding notes with their volumes.
///
/// The dissonance between two notes is looked up in a `DissonanceTable` built once
/// at construction. The consonance of a note is the inverse of the summed
/// dissonances it has with all other sounding notes, weighted by their volumes.
/// The harmonic content of the sounds actually produced is not taken into account.
#[derive(Debug, Clone)]
pub struct ConsonanceEngine {
    notestart: u8,
    table: Arc<DissonanceTable>,
}

fn check_note_range(notestart: u8, notecount: usize) -> Result<(), ConsonanceInitError> {
    if notecount == 0 {
        return Err(ConsonanceInitError::EmptyNoteRange);
    }
    if notestart as usize + notecount > MIDI_NOTE_COUNT {
        return Err(ConsonanceInitError::NoteRangeOutOfBounds {
            notestart,
            notecount,
        });
    }
    Ok(())
}

impl ConsonanceEngine {
    /// Creates a new engine, building its dissonance table.
    /// See the `ConsonanceConfig` documentation for the available options.
    pub fn new(config: ConsonanceConfig) -> Result<Self, ConsonanceInitError> {
        check_note_range(config.notestart, config.notecount)?;
        let table = DissonanceTable::new(config.notecount, config.maxfrac, config.bell_width)?;

        Ok(ConsonanceEngine {
            notestart: config.notestart,
            table: Arc::new(table),
        })
    }

    /// Creates an engine from an already built table. The note range covers
    /// as many notes as the table has entries.
    pub fn with_table(
        notestart: u8,
        table: Arc<DissonanceTable>,
    ) -> Result<Self, ConsonanceInitError> {
        check_note_range(notestart, table.len())?;
        Ok(ConsonanceEngine { notestart, table })
    }

    pub fn notestart(&self) -> u8 {
        self.notestart
    }

    pub fn notecount(&self) -> usize {
        self.table.len()
    }

    /// The notes a consonance gets calculated for.
    pub fn note_range(&self) -> RangeInclusive<u8> {
        // The constructors make sure this stays within 0..=127
        let last = self.notestart as usize + self.table.len() - 1;
        self.notestart..=last as u8
    }

    pub fn contains(&self, key: u8) -> bool {
        self.note_range().contains(&key)
    }

    pub fn table(&self) -> &DissonanceTable {
        &self.table
    }

    /// Calculates the consonance of every note in range.
    ///
    /// `voice_values` maps the sounding notes to their volumes (0-1). Notes missing from
    /// the map are silent, notes outside of the range are ignored. The result holds a
    /// value in (0, 1] for every note in range, 1 meaning no other note is sounding.
    pub fn calculate(&self, voice_values: &HashMap<u8, f64>) -> ConsonanceMap {
        // Walk the range in a fixed order so the sums don't depend on the map's order
        let volumes = self
            .note_range()
            .map(|key| voice_values.get(&key).copied())
            .to_vec();

        (0..volumes.len())
            .map(|target| {
                // Starts at 1 so that the consonance never exceeds 1
                let mut combo_dissonance = 1.0;
                for (other, volume) in volumes.iter().enumerate() {
                    // Each note sounds at most once, so it is never dissonant with itself
                    if other == target {
                        continue;
                    }
                    if let Some(volume) = volume {
                        // Saturates, so far away notes can't push the consonance to 0
                        combo_dissonance = (combo_dissonance
                            + self.table[target.abs_diff(other)] * volume)
                            .min(f64::MAX);
                    }
                }
                (self.notestart + target as u8, 1.0 / combo_dissonance)
            })
            .collect()
    }
}
