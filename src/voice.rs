use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

pub const NUM_VOICES: usize = 3;

/// Oscillator waveform, encoded as its bit in the voice control register.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Waveform {
    Noise = 0x80,
    Square = 0x40,
    Saw = 0x20,
    Triangle = 0x10,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Triangle,
        Waveform::Saw,
        Waveform::Square,
        Waveform::Noise,
    ];

    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Picks a waveform from a controller value in `0..=127`, splitting the
    /// range into four equal zones.
    pub fn from_controller(value: u8) -> Self {
        Self::ALL[(value.min(127) as usize * Self::ALL.len()) / 128]
    }
}

impl FromStr for Waveform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "noise" => Ok(Waveform::Noise),
            "square" | "pulse" => Ok(Waveform::Square),
            "saw" | "sawtooth" => Ok(Waveform::Saw),
            "triangle" => Ok(Waveform::Triangle),
            _ => Err(format!("unknown waveform {:?}", s)),
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Waveform::Noise => "noise",
            Waveform::Square => "square",
            Waveform::Saw => "saw",
            Waveform::Triangle => "triangle",
        };
        f.write_str(name)
    }
}

/// Envelope settings. Each field is a nibble, `0..=15`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Adsr {
    pub att: u8,
    pub dec: u8,
    pub sus: u8,
    pub rel: u8,
}

impl Adsr {
    pub const fn new(att: u8, dec: u8, sus: u8, rel: u8) -> Self {
        Self { att, dec, sus, rel }
    }

    /// Returns the name and value of the first field above 15, if any.
    pub fn out_of_range(&self) -> Option<(&'static str, u8)> {
        [
            ("attack", self.att),
            ("decay", self.dec),
            ("sustain", self.sus),
            ("release", self.rel),
        ]
        .iter()
        .copied()
        .find(|&(_, v)| v > 15)
    }

    pub fn attack_decay(&self) -> u8 {
        (self.att << 4) | self.dec
    }

    pub fn sustain_release(&self) -> u8 {
        (self.sus << 4) | self.rel
    }
}

/// Shadow of one voice's registers, as last written.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Voice {
    pub waveform: Option<Waveform>,
    pub adsr: Adsr,
    pub pulse_width: u16,
    pub filter_enabled: bool,
    pub is_playing: bool,
    /// Last frequency register word, `None` until a note was played.
    pub frequency: Option<u16>,
}

impl Voice {
    /// Waveform bits with the gate bit, the full control register.
    pub fn control_byte(&self) -> u8 {
        self.waveform.map_or(0, Waveform::bits) | self.is_playing as u8
    }
}

/// Shadow of the whole chip.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Device {
    pub voices: [Voice; NUM_VOICES],
    /// Master volume in caller units, `0..=127`.
    pub volume: u8,
}

impl Device {
    /// Filter routing register: voice `i` owns bit `i`.
    pub fn filter_routing(&self) -> u8 {
        self.voices
            .iter()
            .enumerate()
            .fold(0, |acc, (i, v)| acc | ((v.filter_enabled as u8) << i))
    }
}
