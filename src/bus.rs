use std::io::Write;

use crate::util::log_if_error;

/// Write-only connection to the chip. Timing (settling delays, reset pulse
/// width) is the implementor's business; callers only issue logical writes.
pub trait RegisterBus {
    /// Starts the clock signal the chip runs on.
    fn start_clock(&mut self);
    /// Drives the chip into its power-on state.
    fn reset(&mut self);
    /// Latches one address/data pair. Never acknowledged.
    fn write_register(&mut self, address: u8, data: u8);
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn start_clock(&mut self) {
        (**self).start_clock()
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn write_register(&mut self, address: u8, data: u8) {
        (**self).write_register(address, data)
    }
}


/// Keeps every call in memory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordingBus {
    pub clock_starts: usize,
    pub resets: usize,
    pub writes: Vec<(u8, u8)>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns and forgets the writes recorded so far.
    pub fn take_writes(&mut self) -> Vec<(u8, u8)> {
        std::mem::take(&mut self.writes)
    }
}

impl RegisterBus for RecordingBus {
    fn start_clock(&mut self) {
        self.clock_starts += 1;
    }

    fn reset(&mut self) {
        self.resets += 1;
    }

    fn write_register(&mut self, address: u8, data: u8) {
        self.writes.push((address, data));
    }
}


/// Line protocol for a bridge microcontroller that owns the pins:
/// `CLOCK`, `RESET` and `aaaaaaaa dddddddd` (binary, MSB first) per write.
pub struct SerialBus<W: Write> {
    out: W,
}

impl<W: Write> SerialBus<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn send_line(&mut self, line: &str) {
        let r = writeln!(self.out, "{}", line).and_then(|_| self.out.flush());
        log_if_error("serial bus write failed", r);
    }
}

pub fn format_write(address: u8, data: u8) -> String {
    format!("{:08b} {:08b}", address, data)
}

impl<W: Write> RegisterBus for SerialBus<W> {
    fn start_clock(&mut self) {
        self.send_line("CLOCK");
    }

    fn reset(&mut self) {
        self.send_line("RESET");
    }

    fn write_register(&mut self, address: u8, data: u8) {
        self.send_line(&format_write(address, data));
    }
}
