use std::sync::mpsc;

use crate::bus::RegisterBus;
use crate::config::{ControlMap, Patch};
use crate::convert::scale_to_nibble;
use crate::error::SidError;
use crate::synth_controller::{SynthController, MAX_PULSE_WIDTH, MAX_VELOCITY};
use crate::util::log_if_error;
use crate::voice::{Waveform, NUM_VOICES};

/// Pitch bend range in semitones, each way.
const BEND_RANGE: f64 = 2.0;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SynthEvent {
    NoteOn { key: u8, vel: u8 },
    NoteOff { key: u8 },
    PitchBend { bend: f32 },
    ParamChange { param: u8, value: u8 },
}

#[derive(Copy, Clone, Debug)]
struct Slot {
    key: u8,
    vel: u8,
    id: u64,
}

/// Plays synth events on the chip, spreading held keys over the three
/// voices. Owns the controller, so it is the only writer.
pub struct Player<B: RegisterBus> {
    synth: SynthController<B>,
    controls: ControlMap,
    slots: [Option<Slot>; NUM_VOICES],
    bend: f64,
    id_ctr: u64,
}

impl<B: RegisterBus> Player<B> {
    pub fn new(synth: SynthController<B>, controls: ControlMap) -> Self {
        Self {
            synth,
            controls,
            slots: [None; NUM_VOICES],
            bend: 0.0,
            id_ctr: 0,
        }
    }

    pub fn synth(&self) -> &SynthController<B> {
        &self.synth
    }

    pub fn into_synth(self) -> SynthController<B> {
        self.synth
    }

    /// Starts the chip and sets every voice up from `patch`.
    pub fn start(&mut self, patch: &Patch) -> Result<(), SidError> {
        self.synth.start();
        self.synth.set_volume(patch.volume)?;
        for voice in 0..NUM_VOICES as u8 {
            self.synth.set_waveform(voice, patch.waveform)?;
            self.synth.set_adsr(voice, patch.adsr)?;
            self.synth.set_pulse_width(voice, patch.pulse_width)?;
            self.synth.set_filter_enabled(voice, patch.filter)?;
        }
        Ok(())
    }

    /// Voice currently holding `key`, if any.
    pub fn voice_for_key(&self, key: u8) -> Option<u8> {
        self.slots
            .iter()
            .position(|s| s.map_or(false, |s| s.key == key))
            .map(|i| i as u8)
    }

    pub fn pump_events(&mut self, event_queue: &mpsc::Receiver<SynthEvent>) {
        while let Ok(event) = event_queue.try_recv() {
            log_if_error("synth event rejected", self.handle_event(event));
        }
    }

    pub fn handle_event(&mut self, event: SynthEvent) -> Result<(), SidError> {
        match event {
            SynthEvent::NoteOn { key, vel } => self.note_on(key, vel),
            SynthEvent::NoteOff { key } => self.note_off(key),
            SynthEvent::PitchBend { bend } => self.pitch_bend(bend),
            SynthEvent::ParamChange { param, value } => self.param_change(param, value),
        }
    }

    fn pitch(&self, key: u8) -> f64 {
        key as f64 + self.bend
    }

    fn note_on(&mut self, key: u8, vel: u8) -> Result<(), SidError> {
        // Checked up front, stealing a voice already writes to the chip.
        if vel > MAX_VELOCITY {
            return Err(SidError::VelocityOutOfRange(vel));
        }
        if vel == 0 {
            return self.note_off(key);
        }

        let (voice, stolen) = match self.slots.iter().position(Option::is_none) {
            Some(free) => (free, None),
            None => {
                let oldest = (0..NUM_VOICES)
                    .min_by_key(|&i| self.slots[i].map_or(u64::MAX, |s| s.id))
                    .unwrap_or(0);
                (oldest, self.slots[oldest])
            }
        };

        // Gate a stolen voice off first so its envelope restarts.
        if let Some(slot) = stolen {
            tracing::debug!(voice, key = slot.key, "stealing voice");
            let pitch = self.pitch(slot.key);
            self.synth.play_note(voice as u8, pitch, 0)?;
        }

        let pitch = self.pitch(key);
        self.synth.play_note(voice as u8, pitch, vel)?;
        self.slots[voice] = Some(Slot {
            key,
            vel,
            id: self.id_ctr,
        });
        self.id_ctr = self.id_ctr.wrapping_add(1);
        Ok(())
    }

    fn note_off(&mut self, key: u8) -> Result<(), SidError> {
        if let Some(voice) = self.voice_for_key(key) {
            let pitch = self.pitch(key);
            self.synth.play_note(voice, pitch, 0)?;
            self.slots[voice as usize] = None;
        }
        Ok(())
    }

    fn pitch_bend(&mut self, bend: f32) -> Result<(), SidError> {
        self.bend = bend as f64 * BEND_RANGE;
        for voice in 0..NUM_VOICES {
            if let Some(slot) = self.slots[voice] {
                let pitch = self.pitch(slot.key);
                self.synth.play_note(voice as u8, pitch, slot.vel)?;
            }
        }
        Ok(())
    }

    fn param_change(&mut self, param: u8, value: u8) -> Result<(), SidError> {
        let c = &self.controls;
        if param == c.master_volume {
            return self.synth.set_volume(value);
        }

        let voices = 0..NUM_VOICES as u8;
        if param == c.waveform {
            let waveform = Waveform::from_controller(value);
            for voice in voices {
                self.synth.set_waveform(voice, waveform)?;
            }
        } else if param == c.pulse_width {
            let width = (value.min(127) as u32 * MAX_PULSE_WIDTH as u32 / 127) as u16;
            for voice in voices {
                self.synth.set_pulse_width(voice, width)?;
            }
        } else if param == c.filter {
            for voice in voices {
                self.synth.set_filter_enabled(voice, value >= 64)?;
            }
        } else if [c.attack, c.decay, c.sustain, c.release].contains(&param) {
            let nibble = scale_to_nibble(value.min(127), 127);
            let (attack, decay, sustain) = (c.attack, c.decay, c.sustain);
            for voice in voices {
                let mut adsr = self.synth.device().voices[voice as usize].adsr;
                if param == attack {
                    adsr.att = nibble;
                } else if param == decay {
                    adsr.dec = nibble;
                } else if param == sustain {
                    adsr.sus = nibble;
                } else {
                    adsr.rel = nibble;
                }
                self.synth.set_adsr(voice, adsr)?;
            }
        } else {
            tracing::trace!(param, value, "unmapped controller");
        }
        Ok(())
    }
}
