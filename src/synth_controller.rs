use crate::bus::RegisterBus;
use crate::convert::{frequency_to_register_word, note_to_frequency_hz, scale_to_nibble};
use crate::error::SidError;
use crate::registers::*;
use crate::voice::{Adsr, Device, Waveform, NUM_VOICES};

pub const MAX_VOLUME: u8 = 127;
pub const MAX_VELOCITY: u8 = 127;
pub const MAX_PULSE_WIDTH: u16 = 4095;

/// Drives the chip through a write-only bus and keeps the only record of
/// what has been written. Nothing else may write to the chip while this
/// controller exists, otherwise the shadow no longer matches the hardware.
///
/// Registers that combine several parameters (the control byte, the filter
/// routing byte) are always rebuilt in full from the shadow before writing.
pub struct SynthController<B: RegisterBus> {
    bus: B,
    device: Device,
}

impl<B: RegisterBus> SynthController<B> {
    /// Wraps `bus`. No bus calls are made until [`start`](Self::start).
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            device: Device::default(),
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_bus(self) -> B {
        self.bus
    }

    /// Starts the chip clock and resets the chip. Writes no registers.
    pub fn start(&mut self) {
        tracing::debug!("starting clock and resetting chip");
        self.bus.start_clock();
        self.bus.reset();
    }

    /// Sets the master volume, `vol` in `0..=127`.
    pub fn set_volume(&mut self, vol: u8) -> Result<(), SidError> {
        if vol > MAX_VOLUME {
            return Err(SidError::VolumeOutOfRange(vol));
        }

        self.device.volume = vol;
        self.write(MASTER_VOLUME, scale_to_nibble(vol, MAX_VOLUME));
        Ok(())
    }

    pub fn set_adsr(&mut self, voice: u8, adsr: Adsr) -> Result<(), SidError> {
        let idx = check_voice(voice)?;
        if let Some((field, value)) = adsr.out_of_range() {
            return Err(SidError::AdsrOutOfRange { field, value });
        }

        self.device.voices[idx].adsr = adsr;
        self.write(voice_register(voice, ATTACK_DECAY), adsr.attack_decay());
        self.write(voice_register(voice, SUSTAIN_RELEASE), adsr.sustain_release());
        Ok(())
    }

    pub fn set_waveform(&mut self, voice: u8, waveform: Waveform) -> Result<(), SidError> {
        let idx = check_voice(voice)?;

        self.device.voices[idx].waveform = Some(waveform);
        self.write_control(voice);
        Ok(())
    }

    /// Sets the 12-bit pulse width, `width` in `0..=4095`.
    pub fn set_pulse_width(&mut self, voice: u8, width: u16) -> Result<(), SidError> {
        let idx = check_voice(voice)?;
        if width > MAX_PULSE_WIDTH {
            return Err(SidError::PulseWidthOutOfRange(width));
        }

        self.device.voices[idx].pulse_width = width;
        self.write(voice_register(voice, PW_LO), (width & 0xff) as u8);
        self.write(voice_register(voice, PW_HI), (width >> 8) as u8);
        Ok(())
    }

    /// Routes `voice` through the filter or not. The routing register is
    /// shared, so it is rewritten with the flags of all three voices.
    pub fn set_filter_enabled(&mut self, voice: u8, enabled: bool) -> Result<(), SidError> {
        let idx = check_voice(voice)?;

        self.device.voices[idx].filter_enabled = enabled;
        self.write(FILTER_ROUTING, self.device.filter_routing());
        Ok(())
    }

    /// Gates `voice` on (`velocity > 0`) or off at the pitch of `note`.
    ///
    /// The frequency is written on note-off as well, so a released note
    /// keeps the pitch it is given here.
    pub fn play_note(&mut self, voice: u8, note: f64, velocity: u8) -> Result<(), SidError> {
        let idx = check_voice(voice)?;
        if velocity > MAX_VELOCITY {
            return Err(SidError::VelocityOutOfRange(velocity));
        }

        let freq = frequency_to_register_word(note_to_frequency_hz(note));
        let v = &mut self.device.voices[idx];
        v.is_playing = velocity > 0;
        v.frequency = Some(freq);

        self.write(voice_register(voice, FREQ_LO), (freq & 0xff) as u8);
        self.write(voice_register(voice, FREQ_HI), (freq >> 8) as u8);
        self.write_control(voice);
        Ok(())
    }

    fn write_control(&mut self, voice: u8) {
        let data = self.device.voices[voice as usize].control_byte();
        self.write(voice_register(voice, CONTROL), data);
    }

    fn write(&mut self, address: u8, data: u8) {
        tracing::trace!(address, data, "write register");
        self.bus.write_register(address, data);
    }
}

fn check_voice(voice: u8) -> Result<usize, SidError> {
    if (voice as usize) < NUM_VOICES {
        Ok(voice as usize)
    } else {
        Err(SidError::InvalidVoice(voice))
    }
}
