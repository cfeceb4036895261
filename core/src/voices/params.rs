use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

#[derive(Debug, Clone)]
pub struct VoiceManagerStats {
    pub(super) voice_counter: Arc<AtomicU64>,
    pub(super) tick_counter: Arc<AtomicU64>,
}

pub struct VoiceManagerStatsReader {
    stats: VoiceManagerStats,
}

impl VoiceManagerStats {
    pub fn new() -> Self {
        VoiceManagerStats {
            voice_counter: Arc::new(AtomicU64::new(0)),
            tick_counter: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl Default for VoiceManagerStats {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceManagerStatsReader {
    pub fn new(stats: VoiceManagerStats) -> Self {
        Self { stats }
    }

    /// The number of live voices after the last tick.
    pub fn voice_count(&self) -> u64 {
        self.stats.voice_counter.load(Ordering::Relaxed)
    }

    /// The number of ticks processed so far.
    pub fn tick_count(&self) -> u64 {
        self.stats.tick_counter.load(Ordering::Relaxed)
    }
}
