use std::sync::Arc;

use log::info;

use consona_core::{
    voices::{VoiceEvent, VoiceManager, VoiceManagerStatsReader},
    NoOutput, NoteDisplay, NoteOutput,
};

use crate::{
    config::RealtimeConfig, RealtimeEventSender, RealtimeInitError, TickThread,
    TickThreadStatsReader,
};

pub struct RealtimePianoStatsReader {
    voice_stats: VoiceManagerStatsReader,
    tick_stats: TickThreadStatsReader,
}

impl RealtimePianoStatsReader {
    pub fn voice_count(&self) -> u64 {
        self.voice_stats.voice_count()
    }

    pub fn tick_count(&self) -> u64 {
        self.voice_stats.tick_count()
    }

    pub fn ticker(&self) -> &TickThreadStatsReader {
        &self.tick_stats
    }
}

/// The voices of every note in range, advanced and analyzed by a tick thread
/// at the configured framerate.
///
/// Stops ticking when dropped.
pub struct RealtimePiano {
    // Dropped first, so no tick runs once the rest is gone
    ticker: TickThread,

    manager: Arc<VoiceManager>,
    event_senders: RealtimeEventSender,
}

impl RealtimePiano {
    /// Opens a piano without a display or note output, with the default options.
    pub fn open_with_all_defaults() -> Result<Self, RealtimeInitError> {
        RealtimePiano::open(Default::default(), Arc::new(NoOutput))
    }

    /// Opens a piano that pushes the consonance of every note to `display` on each tick.
    pub fn open(
        config: RealtimeConfig,
        display: Arc<dyn NoteDisplay>,
    ) -> Result<Self, RealtimeInitError> {
        let manager = VoiceManager::new(config.voices, display)?;
        RealtimePiano::start(config, manager)
    }

    /// Like `open`, also forwarding note and sustain events to `output`.
    pub fn open_with_output(
        config: RealtimeConfig,
        display: Arc<dyn NoteDisplay>,
        output: Arc<dyn NoteOutput>,
    ) -> Result<Self, RealtimeInitError> {
        let manager = VoiceManager::new(config.voices, display)?.with_output(output);
        RealtimePiano::start(config, manager)
    }

    fn start(config: RealtimeConfig, manager: VoiceManager) -> Result<Self, RealtimeInitError> {
        let manager = Arc::new(manager);

        let ticker = {
            let manager = manager.clone();
            TickThread::spawn(config.thread_name, config.voices.framerate, move || {
                manager.tick();
            })?
        };

        info!("Realtime piano opened for notes {:?}", manager.note_range());

        Ok(RealtimePiano {
            ticker,
            event_senders: RealtimeEventSender::new(manager.clone()),
            manager,
        })
    }

    /// Sends a VoiceEvent to the voices.
    ///
    /// See the `VoiceEvent` documentation for more information.
    pub fn send_event(&self, event: VoiceEvent) {
        self.event_senders.send_event(event);
    }

    pub fn get_senders(&self) -> RealtimeEventSender {
        self.event_senders.clone()
    }

    pub fn get_stats(&self) -> RealtimePianoStatsReader {
        RealtimePianoStatsReader {
            voice_stats: self.manager.get_stats(),
            tick_stats: self.ticker.get_stats(),
        }
    }

    /// Stops advancing the voices. Note events are still applied.
    pub fn pause(&self) {
        self.ticker.pause();
    }

    pub fn resume(&self) {
        self.ticker.resume();
    }

    /// The voice manager, for inspecting the voices.
    pub fn voices(&self) -> &Arc<VoiceManager> {
        &self.manager
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use consona_core::voices::VoiceManagerConfig;

    use super::*;

    fn config(framerate: f64) -> RealtimeConfig {
        RealtimeConfig {
            voices: VoiceManagerConfig {
                framerate,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_voices_advance() {
        let piano = RealtimePiano::open(config(240.0), Arc::new(NoOutput)).unwrap();
        piano.send_event(VoiceEvent::NoteOn { key: 60, vel: 1.0 });
        piano.get_senders().send_event_u32(0x90 | 64 << 8 | 100 << 16);

        thread::sleep(Duration::from_millis(200));
        assert!(piano.voices().voice(60).unwrap().holdtime() > 0);
        assert!(piano.voices().voice(64).unwrap().holdtime() > 0);

        let stats = piano.get_stats();
        assert!(stats.tick_count() > 0);
        assert_eq!(stats.voice_count(), 2);
    }

    #[test]
    fn test_pause() {
        let piano = RealtimePiano::open(config(240.0), Arc::new(NoOutput)).unwrap();
        piano.pause();
        thread::sleep(Duration::from_millis(20));

        piano.send_event(VoiceEvent::NoteOn { key: 60, vel: 1.0 });
        thread::sleep(Duration::from_millis(50));
        assert_eq!(piano.voices().voice(60).unwrap().holdtime(), 0);

        piano.resume();
        thread::sleep(Duration::from_millis(100));
        assert!(piano.voices().voice(60).unwrap().holdtime() > 0);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            RealtimePiano::open(config(0.0), Arc::new(NoOutput)),
            Err(RealtimeInitError::Voices(_))
        ));

        let mut bad_range = config(60.0);
        bad_range.voices.consonance.notestart = 100;
        assert!(matches!(
            RealtimePiano::open(bad_range, Arc::new(NoOutput)),
            Err(RealtimeInitError::Voices(_))
        ));
    }
}
