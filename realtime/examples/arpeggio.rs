use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use consona_core::{NoteDisplay, OutputError};
use consona_realtime::{RealtimeConfig, RealtimePiano};

/// Keeps the latest strength of every note, for printing from the main thread.
#[derive(Default)]
struct Strengths {
    values: Mutex<BTreeMap<u8, f64>>,
}

impl NoteDisplay for Strengths {
    fn set_active(&self, key: u8, active: bool) -> Result<(), OutputError> {
        println!("{key} {}", if active { "on" } else { "off" });
        Ok(())
    }

    fn set_strength(&self, key: u8, strength: f64) -> Result<(), OutputError> {
        self.values
            .lock()
            .map_err(|_| OutputError::Unavailable("poisoned".to_string()))?
            .insert(key, strength);
        Ok(())
    }
}

fn note_on(key: u8, vel: u8) -> u32 {
    0x90 | (key as u32) << 8 | (vel as u32) << 16
}

fn note_off(key: u8) -> u32 {
    0x80 | (key as u32) << 8
}

pub fn main() {
    env_logger::init();

    let display = Arc::new(Strengths::default());
    let piano = match RealtimePiano::open(RealtimeConfig::default(), display.clone()) {
        Ok(piano) => piano,
        Err(err) => {
            println!("Failed to open the piano: {err}");
            return;
        }
    };
    let sender = piano.get_senders();

    // Sustain pedal down, C major then a tritone on top
    sender.send_event_u32(0xB0 | 0x40 << 8 | 127 << 16);
    for key in [48, 55, 60, 64, 67, 73] {
        sender.send_event_u32(note_on(key, 100));
        thread::sleep(Duration::from_millis(400));
        sender.send_event_u32(note_off(key));

        let values = display.values.lock().map(|v| v.clone()).unwrap_or_default();
        let line = [48, 55, 60, 64, 67, 73]
            .iter()
            .filter_map(|key| values.get(key).map(|value| format!("{key}:{value:.3}")))
            .collect::<Vec<_>>()
            .join(" ");
        println!("{line}");
    }
    sender.reset();
    thread::sleep(Duration::from_millis(1500));

    let stats = piano.get_stats();
    println!(
        "Voices: {}, ticks: {}, average load: {:.4}",
        stats.voice_count(),
        stats.tick_count(),
        stats.ticker().average_load()
    );
}
