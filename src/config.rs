use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::voice::{Adsr, Waveform};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub controls: ControlMap,
    pub patch: Patch,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where the serial bus writes its lines, `-` for stdout.
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { path: "-".into() }
    }
}

/// MIDI controller numbers bound to chip parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlMap {
    pub master_volume: u8,
    pub waveform: u8,
    pub pulse_width: u8,
    pub attack: u8,
    pub decay: u8,
    pub sustain: u8,
    pub release: u8,
    pub filter: u8,
}

impl Default for ControlMap {
    fn default() -> Self {
        Self {
            master_volume: 7,
            waveform: 70,
            pulse_width: 71,
            attack: 73,
            decay: 75,
            sustain: 79,
            release: 72,
            filter: 74,
        }
    }
}

/// Settings applied to every voice after the chip is started.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Patch {
    pub volume: u8,
    pub waveform: Waveform,
    pub adsr: Adsr,
    pub pulse_width: u16,
    pub filter: bool,
}

impl Default for Patch {
    fn default() -> Self {
        Self {
            volume: 127,
            waveform: Waveform::Square,
            adsr: Adsr::new(0x0, 0x9, 0xf, 0x4),
            pulse_width: 2048,
            filter: false,
        }
    }
}

impl Config {
    pub fn from_toml(fname: impl AsRef<Path>) -> Result<Self> {
        let fname = fname.as_ref();
        let mut file =
            File::open(fname).with_context(|| format!("opening {}", fname.display()))?;
        let mut file_as_string = String::new();
        file.read_to_string(&mut file_as_string)?;
        Self::from_toml_str(&file_as_string)
            .with_context(|| format!("parsing {}", fname.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.output.path, "-");
        assert_eq!(config.controls.master_volume, 7);
        assert_eq!(config.patch.waveform, Waveform::Square);
        assert_eq!(config.patch.volume, 127);
    }

    #[test]
    fn full_file() {
        let config = Config::from_toml_str(
            r#"
            [output]
            path = "/dev/ttyACM0"

            [controls]
            master_volume = 20
            waveform = 21

            [patch]
            volume = 100
            waveform = "saw"
            pulse_width = 1024
            filter = true
            adsr = { att = 1, dec = 2, sus = 12, rel = 3 }
            "#,
        )
        .unwrap();

        assert_eq!(config.output.path, "/dev/ttyACM0");
        assert_eq!(config.controls.master_volume, 20);
        assert_eq!(config.controls.waveform, 21);
        assert_eq!(config.controls.pulse_width, 71);
        assert_eq!(config.patch.volume, 100);
        assert_eq!(config.patch.waveform, Waveform::Saw);
        assert_eq!(config.patch.pulse_width, 1024);
        assert!(config.patch.filter);
        assert_eq!(config.patch.adsr, Adsr::new(1, 2, 12, 3));
    }

    #[test]
    fn unknown_waveform_is_an_error() {
        assert!(Config::from_toml_str("[patch]\nwaveform = \"sine\"").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::from_toml("/nonexistent/mos-sid.toml").is_err());
    }
}
