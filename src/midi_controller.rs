use std::sync::mpsc;

use crate::midi;
use crate::player::SynthEvent;
use crate::util::*;

const MIDI_SUSTAIN_PEDAL: u8 = 64;

/// Where a key stands between press and release.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum KeyState {
    Up,
    Down,
    /// Let go while the pedal was down; sounds until the pedal lifts.
    Latched,
}


/// Turns raw MIDI events into synth events: channel filtering, sustain
/// pedal handling and note-on with velocity 0 as note-off.
///
/// Every sounding key gets exactly one `NoteOff`, either when it is let go
/// or, if the pedal held it, when the pedal lifts.
#[derive(Clone, Debug)]
pub struct MidiController {
    pedal_down: bool,
    keys: [KeyState; 128],
    event_output: mpsc::SyncSender<SynthEvent>,
    keyboard_channel: u8,
    controller_channel: u8,
}


impl MidiController {
    pub fn new(
        event_output: mpsc::SyncSender<SynthEvent>,
        keyboard_channel: u8,
        controller_channel: u8,
    ) -> Self {
        Self {
            pedal_down: false,
            keys: [KeyState::Up; 128],
            event_output,
            keyboard_channel,
            controller_channel,
        }
    }

    /// A repeated strike on a sounding key releases it first, so the
    /// player frees the old voice before taking a new one.
    fn press(&mut self, key: u8, vel: u8) {
        if self.keys[key as usize] != KeyState::Up {
            self.send_event(SynthEvent::NoteOff { key });
        }
        self.send_event(SynthEvent::NoteOn { key, vel });
        self.keys[key as usize] = KeyState::Down;
    }

    fn release(&mut self, key: u8) {
        if self.keys[key as usize] != KeyState::Down {
            return;
        }

        self.keys[key as usize] = if self.pedal_down {
            KeyState::Latched
        } else {
            self.send_event(SynthEvent::NoteOff { key });
            KeyState::Up
        };
    }

    fn lift_pedal(&mut self) {
        self.pedal_down = false;

        for key in 0..128u8 {
            if self.keys[key as usize] == KeyState::Latched {
                self.send_event(SynthEvent::NoteOff { key });
                self.keys[key as usize] = KeyState::Up;
            }
        }
    }

    pub fn handle_midi_event(&mut self, event: midi::Event) {
        match event.content {
            midi::EventContent::NoteOn { key, vel } => {
                if event.channel == self.keyboard_channel {
                    if vel == 0 {
                        self.release(key);
                    } else {
                        self.press(key, vel);
                    }
                }
            }

            midi::EventContent::NoteOff { key, .. } => {
                if event.channel == self.keyboard_channel {
                    self.release(key);
                }
            }

            midi::EventContent::PitchBend { bend } => {
                if event.channel == self.keyboard_channel {
                    self.send_event(SynthEvent::PitchBend { bend });
                }
            }

            midi::EventContent::Controller { controller, value } => {
                if event.channel == self.keyboard_channel && controller == MIDI_SUSTAIN_PEDAL {
                    if value > 0 {
                        self.pedal_down = true;
                    } else {
                        self.lift_pedal();
                    }
                }

                if event.channel == self.controller_channel {
                    self.send_event(SynthEvent::ParamChange {
                        param: controller,
                        value,
                    });
                }
            }
        }
    }

    fn send_event(&mut self, event: SynthEvent) {
        let r = self.event_output.try_send(event);
        log_if_error("synth event queue full", r);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::{Event, EventContent};

    fn setup() -> (MidiController, mpsc::Receiver<SynthEvent>) {
        let (tx, rx) = mpsc::sync_channel(64);
        (MidiController::new(tx, 0, 1), rx)
    }

    fn ev(channel: u8, content: EventContent) -> Event {
        Event {
            timestamp: 0,
            channel,
            content,
        }
    }

    fn drain(rx: &mpsc::Receiver<SynthEvent>) -> Vec<SynthEvent> {
        rx.try_iter().collect()
    }

    #[test]
    fn notes_on_keyboard_channel_only() {
        let (mut mc, rx) = setup();
        mc.handle_midi_event(ev(0, EventContent::NoteOn { key: 60, vel: 90 }));
        mc.handle_midi_event(ev(3, EventContent::NoteOn { key: 61, vel: 90 }));
        mc.handle_midi_event(ev(0, EventContent::NoteOff { key: 60, vel: 0 }));
        assert_eq!(
            drain(&rx),
            vec![
                SynthEvent::NoteOn { key: 60, vel: 90 },
                SynthEvent::NoteOff { key: 60 },
            ]
        );
    }

    #[test]
    fn zero_velocity_note_on_releases() {
        let (mut mc, rx) = setup();
        mc.handle_midi_event(ev(0, EventContent::NoteOn { key: 60, vel: 90 }));
        mc.handle_midi_event(ev(0, EventContent::NoteOn { key: 60, vel: 0 }));
        assert_eq!(
            drain(&rx),
            vec![
                SynthEvent::NoteOn { key: 60, vel: 90 },
                SynthEvent::NoteOff { key: 60 },
            ]
        );
    }

    #[test]
    fn sustain_pedal_defers_release() {
        let (mut mc, rx) = setup();
        mc.handle_midi_event(ev(0, EventContent::NoteOn { key: 64, vel: 80 }));
        mc.handle_midi_event(ev(0, EventContent::Controller { controller: 64, value: 127 }));
        mc.handle_midi_event(ev(0, EventContent::NoteOff { key: 64, vel: 0 }));
        assert_eq!(drain(&rx), vec![SynthEvent::NoteOn { key: 64, vel: 80 }]);

        mc.handle_midi_event(ev(0, EventContent::Controller { controller: 64, value: 0 }));
        assert_eq!(drain(&rx), vec![SynthEvent::NoteOff { key: 64 }]);
    }

    #[test]
    fn key_held_through_pedal_lift_releases_on_key_up() {
        let (mut mc, rx) = setup();
        mc.handle_midi_event(ev(0, EventContent::Controller { controller: 64, value: 127 }));
        mc.handle_midi_event(ev(0, EventContent::NoteOn { key: 50, vel: 80 }));
        mc.handle_midi_event(ev(0, EventContent::Controller { controller: 64, value: 0 }));
        assert_eq!(drain(&rx), vec![SynthEvent::NoteOn { key: 50, vel: 80 }]);

        mc.handle_midi_event(ev(0, EventContent::NoteOff { key: 50, vel: 0 }));
        assert_eq!(drain(&rx), vec![SynthEvent::NoteOff { key: 50 }]);
    }

    #[test]
    fn restrike_of_latched_key_releases_first() {
        let (mut mc, rx) = setup();
        mc.handle_midi_event(ev(0, EventContent::Controller { controller: 64, value: 127 }));
        mc.handle_midi_event(ev(0, EventContent::NoteOn { key: 50, vel: 80 }));
        mc.handle_midi_event(ev(0, EventContent::NoteOff { key: 50, vel: 0 }));
        mc.handle_midi_event(ev(0, EventContent::NoteOn { key: 50, vel: 90 }));
        assert_eq!(
            drain(&rx),
            vec![
                SynthEvent::NoteOn { key: 50, vel: 80 },
                SynthEvent::NoteOff { key: 50 },
                SynthEvent::NoteOn { key: 50, vel: 90 },
            ]
        );

        // Pressed again, so lifting the pedal leaves it sounding.
        mc.handle_midi_event(ev(0, EventContent::Controller { controller: 64, value: 0 }));
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn controllers_and_bend() {
        let (mut mc, rx) = setup();
        mc.handle_midi_event(ev(1, EventContent::Controller { controller: 7, value: 100 }));
        mc.handle_midi_event(ev(0, EventContent::PitchBend { bend: 0.5 }));
        mc.handle_midi_event(ev(1, EventContent::PitchBend { bend: 0.5 }));
        assert_eq!(
            drain(&rx),
            vec![
                SynthEvent::ParamChange { param: 7, value: 100 },
                SynthEvent::PitchBend { bend: 0.5 },
            ]
        );
    }
}
