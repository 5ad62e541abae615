//! Engine Channels
//!
//! The two SPSC rings between the control thread and the audio thread.
//! Commands carry fully built nodes and pools to the audio thread; events
//! carry retired memory, faults and meter readings back.

use rtrb::{Consumer, Producer, PushError, RingBuffer};

use super::commands::{EngineCommand, EngineEvent};

/// Both rings, before they are split between the threads.
pub struct EngineChannels {
    commands: (Producer<EngineCommand>, Consumer<EngineCommand>),
    events: (Producer<EngineEvent>, Consumer<EngineEvent>),
}

impl EngineChannels {
    /// Allocates both rings. Capacities are counted in messages.
    pub fn new(command_capacity: usize, event_capacity: usize) -> Self {
        Self {
            commands: RingBuffer::new(command_capacity),
            events: RingBuffer::new(event_capacity),
        }
    }

    /// Splits into the control-side and audio-side ends.
    pub fn split(self) -> (ControlHandle, AudioHandle) {
        let (command_tx, command_rx) = self.commands;
        let (event_tx, event_rx) = self.events;
        (
            ControlHandle {
                command_tx,
                event_rx,
            },
            AudioHandle {
                command_rx,
                event_tx,
            },
        )
    }
}

/// Control-side end: sends commands, receives events.
pub struct ControlHandle {
    command_tx: Producer<EngineCommand>,
    event_rx: Consumer<EngineEvent>,
}

impl ControlHandle {
    /// Queues a command. A full ring hands the command back.
    pub fn send_command(&mut self, cmd: EngineCommand) -> Result<(), EngineCommand> {
        self.command_tx.push(cmd).map_err(|PushError::Full(cmd)| cmd)
    }

    pub fn recv_event(&mut self) -> Option<EngineEvent> {
        self.event_rx.pop().ok()
    }

    /// Pops events until the ring is empty.
    pub fn drain_events(&mut self) -> impl Iterator<Item = EngineEvent> + '_ {
        std::iter::from_fn(|| self.recv_event())
    }

    pub fn command_slots_available(&self) -> usize {
        self.command_tx.slots()
    }

    pub fn is_command_buffer_full(&self) -> bool {
        self.command_tx.is_full()
    }
}

/// Audio-side end: receives commands, sends events.
///
/// REAL-TIME SAFE: every method is a single non-blocking ring operation.
pub struct AudioHandle {
    command_rx: Consumer<EngineCommand>,
    event_tx: Producer<EngineEvent>,
}

impl AudioHandle {
    pub fn recv_command(&mut self) -> Option<EngineCommand> {
        self.command_rx.pop().ok()
    }

    /// Sends an event. A full ring hands the event back so owned memory
    /// can be kept and retried.
    pub fn send_event(&mut self, event: EngineEvent) -> Result<(), EngineEvent> {
        self.event_tx.push(event).map_err(|PushError::Full(event)| event)
    }

    /// Sends an event, dropping it if the ring is full. Only for events that
    /// own no memory.
    pub fn send_event_lossy(&mut self, event: EngineEvent) {
        let _ = self.event_tx.push(event);
    }

    pub fn event_slots_available(&self) -> usize {
        self.event_tx.slots()
    }
}
