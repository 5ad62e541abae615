//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Sizes and rates fixed when the engine is created.
///
/// Everything the audio thread will ever need is allocated from these
/// numbers up front.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sample_rate: f32,
    /// Interleaved channels in every signal buffer.
    pub channels: usize,
    /// Largest sub-block the evaluator processes in one pass.
    pub max_block_frames: usize,
    /// Node handles are `0..max_nodes`.
    pub max_nodes: usize,
    /// Free scratch buffers for mixing sinks.
    pub scratch_buffers: usize,
    pub command_capacity: usize,
    pub event_capacity: usize,
    /// Callbacks between metering events.
    pub meter_interval: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            channels: 2,
            max_block_frames: 1024,
            max_nodes: 256,
            scratch_buffers: 8,
            command_capacity: 1024,
            event_capacity: 256,
            meter_interval: 8,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_max_block_frames(mut self, frames: usize) -> Self {
        self.max_block_frames = frames;
        self
    }

    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn with_scratch_buffers(mut self, count: usize) -> Self {
        self.scratch_buffers = count;
        self
    }

    pub fn with_queue_capacity(mut self, commands: usize, events: usize) -> Self {
        self.command_capacity = commands;
        self.event_capacity = events;
        self
    }

    pub fn with_meter_interval(mut self, callbacks: u32) -> Self {
        self.meter_interval = callbacks;
        self
    }

    /// Clamps every size to at least 1 and the sample rate to a usable value.
    pub fn sanitized(mut self) -> Self {
        if !self.sample_rate.is_finite() || self.sample_rate < 1.0 {
            self.sample_rate = Self::default().sample_rate;
        }
        self.channels = self.channels.max(1);
        self.max_block_frames = self.max_block_frames.max(1);
        self.max_nodes = self.max_nodes.clamp(1, u32::MAX as usize);
        self.scratch_buffers = self.scratch_buffers.max(1);
        self.command_capacity = self.command_capacity.max(1);
        self.event_capacity = self.event_capacity.max(1);
        self.meter_interval = self.meter_interval.max(1);
        self
    }
}
