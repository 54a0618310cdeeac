//! Register driver for the three-voice SID sound chip, which is write-only.
//! Everything written is mirrored in a shadow [`voice::Device`], since the
//! chip itself cannot be read back.

pub mod bus;
pub mod config;
pub mod convert;
pub mod error;
pub mod midi;
pub mod midi_controller;
pub mod player;
pub mod registers;
pub mod synth_controller;
pub mod util;
pub mod voice;

pub use bus::{RecordingBus, RegisterBus, SerialBus};
pub use error::SidError;
pub use synth_controller::SynthController;
pub use voice::{Adsr, Device, Voice, Waveform};
