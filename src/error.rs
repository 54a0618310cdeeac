use thiserror::Error;

/// Rejected controller calls. A call that returns an error has written
/// nothing and left the shadow state untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SidError {
    #[error("voice index {0} out of range, expected 0..=2")]
    InvalidVoice(u8),
    #[error("pulse width {0} out of range, expected 0..=4095")]
    PulseWidthOutOfRange(u16),
    #[error("volume {0} out of range, expected 0..=127")]
    VolumeOutOfRange(u8),
    #[error("velocity {0} out of range, expected 0..=127")]
    VelocityOutOfRange(u8),
    #[error("{field} {value} out of range, expected 0..=15")]
    AdsrOutOfRange { field: &'static str, value: u8 },
}
