use anyhow::{anyhow, Result};
use std::sync::mpsc;

use midir::MidiInputConnection;
use midly::live::LiveEvent;
use midly::MidiMessage;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum EventContent {
    NoteOff { key: u8, vel: u8 },
    NoteOn { key: u8, vel: u8 },
    Controller { controller: u8, value: u8 },
    /// Bend wheel position in `-1.0..=1.0`.
    PitchBend { bend: f32 },
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Event {
    pub timestamp: u64,
    pub channel: u8,
    pub content: EventContent,
}

pub fn list_devices() -> Result<Vec<String>> {
    let midi_in = midir::MidiInput::new("mos-sid port listing")?;
    let names = midi_in
        .ports()
        .iter()
        .filter_map(|p| midi_in.port_name(p).ok())
        .collect();
    Ok(names)
}

/// Decodes one live MIDI message, skipping everything the chip has no use for.
pub fn parse_event(timestamp: u64, bytes: &[u8]) -> Option<Event> {
    let midly_event = match LiveEvent::parse(bytes) {
        Ok(ev) => ev,
        Err(err) => {
            tracing::warn!("midly failed to parse {:?}, error: {:?}", bytes, err);
            return None;
        }
    };

    let (channel, message) = match midly_event {
        LiveEvent::Midi { channel, message } => (channel, message),
        _ => return None,
    };

    let content = match message {
        MidiMessage::NoteOff { key, vel } => EventContent::NoteOff {
            key: key.into(),
            vel: vel.into(),
        },

        MidiMessage::NoteOn { key, vel } => EventContent::NoteOn {
            key: key.into(),
            vel: vel.into(),
        },

        MidiMessage::Controller { controller, value } => EventContent::Controller {
            controller: controller.into(),
            value: value.into(),
        },

        MidiMessage::PitchBend { bend } => EventContent::PitchBend {
            bend: bend.as_f32(),
        },

        _ => return None,
    };

    Some(Event {
        timestamp,
        channel: channel.into(),
        content,
    })
}

pub struct Connection(MidiInputConnection<mpsc::SyncSender<Event>>);

pub fn connect_to_ports(
    midi_ports: Vec<String>,
) -> Result<(mpsc::Receiver<Event>, Vec<Connection>)> {
    let (sender, receiver) = mpsc::sync_channel(1024);

    let connections: Result<Vec<Connection>> = midi_ports
        .into_iter()
        .map(|port_name| {
            let midi_in = midir::MidiInput::new(&format!("mos-sid to {}", port_name))?;

            let selected_port = midi_in
                .ports()
                .into_iter()
                .find(|p| midi_in.port_name(p).map_or(false, |name| name == port_name))
                .ok_or_else(|| anyhow!("could not find MIDI port {}", port_name))?;

            let connect_result = midi_in.connect(
                &selected_port,
                &format!("mos-sid conn to {}", port_name),
                |timestamp, bytes, sender| {
                    if let Some(event) = parse_event(timestamp, bytes) {
                        if let Err(err) = sender.send(event) {
                            tracing::warn!("failed to send MIDI event, error: {:?}", err);
                        }
                    }
                },
                sender.clone(),
            );

            match connect_result {
                Ok(conn) => Ok(Connection(conn)),
                Err(err) => Err(anyhow!("connecting to {}: {}", port_name, err)),
            }
        })
        .collect();

    connections.map(|conn| (receiver, conn))
}
