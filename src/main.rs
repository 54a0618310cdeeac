use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::{Context, Result};
use structopt::StructOpt;

use mos_sid::bus::{format_write, RecordingBus, SerialBus};
use mos_sid::config::Config;
use mos_sid::midi;
use mos_sid::midi_controller::MidiController;
use mos_sid::player::{Player, SynthEvent};
use mos_sid::synth_controller::SynthController;


#[derive(StructOpt)]
struct PlayOpt {
    #[structopt(short = "k", long = "keyboard")]
    /// The MIDI channel the chip listens on for keyboard events.
    midi_keyboard_channel: u8,

    #[structopt(short = "c", long = "controller")]
    /// The MIDI channel the chip listens on for controller events.
    midi_controller_channel: u8,

    #[structopt(long = "config", parse(from_os_str))]
    /// TOML file with output, controller mapping and initial patch.
    config: Option<PathBuf>,

    input_midi_ports: Vec<String>,
}

#[derive(StructOpt)]
struct DumpOpt {
    #[structopt(long = "config", parse(from_os_str))]
    /// TOML file with the initial patch.
    config: Option<PathBuf>,

    #[structopt(long = "note")]
    /// Also play this note on and off.
    note: Option<u8>,
}

#[derive(StructOpt)]
#[structopt(about = "Drive a SID sound chip over a register bus.")]
enum SidOpt {
    /// List all available MIDI ports.
    ListMIDI,

    /// Play the chip from MIDI input.
    Play(PlayOpt),

    /// Print the register writes the patch produces.
    Dump(DumpOpt),
}


fn load_config(path: &Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::from_toml(path),
        None => Ok(Config::default()),
    }
}

fn open_output(path: &str) -> Result<Box<dyn Write + Send>> {
    if path == "-" {
        return Ok(Box::new(io::stdout()));
    }

    let file = OpenOptions::new()
        .write(true)
        .open(path)
        .with_context(|| format!("opening output {}", path))?;
    Ok(Box::new(file))
}

fn play(opt: PlayOpt) -> Result<()> {
    let config = load_config(&opt.config)?;
    let out = open_output(&config.output.path)?;

    let mut player = Player::new(SynthController::new(SerialBus::new(out)), config.controls);
    player.start(&config.patch).context("applying patch")?;
    tracing::info!(output = %config.output.path, "chip started");

    let (midi_event_queue, _midi_connections) = midi::connect_to_ports(opt.input_midi_ports)?;
    let (kb_event_sender, kb_event_queue) = mpsc::sync_channel::<SynthEvent>(1024);
    let mut kb_ctrlr = MidiController::new(
        kb_event_sender,
        opt.midi_keyboard_channel,
        opt.midi_controller_channel,
    );

    loop {
        let event = midi_event_queue.recv().context("MIDI input closed")?;
        kb_ctrlr.handle_midi_event(event);
        player.pump_events(&kb_event_queue);
    }
}

fn dump(opt: DumpOpt) -> Result<()> {
    let config = load_config(&opt.config)?;

    let mut player = Player::new(SynthController::new(RecordingBus::new()), config.controls);
    player.start(&config.patch).context("applying patch")?;
    if let Some(key) = opt.note {
        player.handle_event(SynthEvent::NoteOn { key, vel: 127 })?;
        player.handle_event(SynthEvent::NoteOff { key })?;
    }

    for (address, data) in player.into_synth().into_bus().writes {
        println!("{}  ; {:#04x} <- {:#04x}", format_write(address, data), address, data);
    }
    Ok(())
}


fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let opt = SidOpt::from_args();

    match opt {
        SidOpt::ListMIDI => {
            println!("Available devices:");
            for device_name in midi::list_devices()? {
                println!("{}", device_name);
            }
        }

        SidOpt::Play(playopt) => {
            return play(playopt);
        }

        SidOpt::Dump(dumpopt) => {
            return dump(dumpopt);
        }
    }

    Ok(())
}
