use std::sync::Arc;

use consona_core::{
    helpers::midi_value_to_unit,
    voices::{ControlEvent, VoiceEvent, VoiceManager},
};

/// A helper object to send events to the voices of a realtime piano.
///
/// Cheap to clone, one can be handed to every input source (keyboard, mouse,
/// MIDI, touch). The events are applied right away from the calling thread.
#[derive(Clone)]
pub struct RealtimeEventSender {
    manager: Arc<VoiceManager>,
}

impl RealtimeEventSender {
    pub(super) fn new(manager: Arc<VoiceManager>) -> RealtimeEventSender {
        RealtimeEventSender { manager }
    }

    /// Sends a VoiceEvent to the voices.
    ///
    /// See the `VoiceEvent` documentation for more information.
    pub fn send_event(&self, event: VoiceEvent) {
        self.manager.send_event(event);
    }

    /// Sends a MIDI event as raw bytes, status in the lowest byte.
    /// Events of all MIDI channels are treated the same.
    pub fn send_event_u32(&self, event: u32) {
        let head = event & 0xFF;
        let code = head >> 4;

        macro_rules! val1 {
            () => {
                (event >> 8) as u8
            };
        }

        macro_rules! val2 {
            () => {
                (event >> 16) as u8
            };
        }

        match code {
            0x8 => {
                self.send_event(VoiceEvent::NoteOff { key: val1!() });
            }
            0x9 => {
                // Note on with velocity 0 is a note off
                if val2!() == 0 {
                    self.send_event(VoiceEvent::NoteOff { key: val1!() });
                } else {
                    self.send_event(VoiceEvent::NoteOn {
                        key: val1!(),
                        vel: midi_value_to_unit(val2!()),
                    });
                }
            }
            0xB => {
                self.send_event(VoiceEvent::Control(ControlEvent::Raw(val1!(), val2!())));
            }
            _ => {}
        }
    }

    /// Lifts the sustain pedal and releases all notes.
    pub fn reset(&self) {
        self.send_event(VoiceEvent::Control(ControlEvent::Sustain(false)));
        self.send_event(VoiceEvent::AllNotesOff);
    }
}
