//! Audio processor that runs in the audio callback.

use std::time::Instant;

use crate::config::EngineConfig;
use crate::dsp::{ProcessContext, SignalBuffer};
use crate::engine::audio_graph::AudioGraph;
use crate::engine::channels::AudioHandle;
use crate::engine::commands::{EngineEvent, NodeId};

/// Audio-thread half of the engine.
///
/// This struct is moved into the audio callback closure and handles:
/// - Applying pending commands from the control thread
/// - Running evaluation passes over the graph
/// - Mapping the mix onto the hardware channel layout
/// - Sending retired memory, faults and metering back
pub struct AudioProcessor {
    graph: AudioGraph,
    audio_handle: AudioHandle,
    sample_rate: f32,
    channels: usize,
    /// Seconds of audio rendered so far.
    dsp_time: f64,
    /// Callbacks between metering events.
    meter_interval: u32,
    /// Callback counter for throttling metering events.
    callback_counter: u32,
    /// Peak output levels since the last report.
    peak_left: f32,
    peak_right: f32,
    /// Running average of CPU load (0.0-100.0).
    cpu_load_avg: f32,
}

impl AudioProcessor {
    /// Smoothing factor for CPU load averaging (0-1, higher = more responsive).
    const CPU_SMOOTHING: f32 = 0.3;

    pub fn new(config: &EngineConfig, graph: AudioGraph, audio_handle: AudioHandle) -> Self {
        Self {
            graph,
            audio_handle,
            sample_rate: config.sample_rate,
            channels: config.channels,
            dsp_time: 0.0,
            meter_interval: config.meter_interval.max(1),
            callback_counter: 0,
            peak_left: 0.0,
            peak_right: 0.0,
            cpu_load_avg: 0.0,
        }
    }

    /// Renders one hardware callback into `output`.
    ///
    /// `output` is interleaved with `hw_channels` channels. The callback is
    /// split into sub-blocks no longer than the pool's frame capacity, each
    /// a full evaluation pass.
    ///
    /// REAL-TIME SAFE: no allocation, no locks, never panics out.
    pub fn render_callback(&mut self, output: &mut [f32], hw_channels: usize) {
        self.process_commands();
        output.fill(0.0);

        let start_time = Instant::now();
        let hw_channels = hw_channels.max(1);
        let num_frames = output.len() / hw_channels;

        let mut offset = 0;
        while offset < num_frames {
            let frames = (num_frames - offset).min(self.graph.max_frames().max(1));
            let ctx = ProcessContext::new(self.sample_rate, self.channels, frames).at_time(self.dsp_time);

            if let Some(mix) = self.graph.produce_callback(&ctx) {
                let dest = &mut output[offset * hw_channels..(offset + frames) * hw_channels];
                self.write_output(&mix, dest, hw_channels, frames);
                self.graph.release(mix);
            }

            self.dsp_time += frames as f64 / self.sample_rate as f64;
            offset += frames;
        }

        self.flush_events();

        if num_frames > 0 {
            let elapsed = start_time.elapsed();
            let available_time = num_frames as f64 / self.sample_rate as f64;
            let cpu_percent = (elapsed.as_secs_f64() / available_time * 100.0) as f32;
            self.cpu_load_avg =
                Self::CPU_SMOOTHING * cpu_percent + (1.0 - Self::CPU_SMOOTHING) * self.cpu_load_avg;
        }

        self.callback_counter += 1;
        if self.callback_counter >= self.meter_interval {
            self.callback_counter = 0;
            self.audio_handle.send_event_lossy(EngineEvent::OutputLevel {
                left: self.peak_left,
                right: self.peak_right,
            });
            self.audio_handle
                .send_event_lossy(EngineEvent::CpuLoad(self.cpu_load_avg));
            self.peak_left = 0.0;
            self.peak_right = 0.0;
        }
    }

    /// Applies every pending command, in order.
    fn process_commands(&mut self) {
        while let Some(cmd) = self.audio_handle.recv_command() {
            self.graph.handle_command(cmd);
        }
    }

    /// Copies the mix into the hardware layout.
    ///
    /// Shared channels are copied, extra hardware channels get the mono
    /// average and extra engine channels are dropped.
    fn write_output(&mut self, mix: &SignalBuffer, dest: &mut [f32], hw_channels: usize, frames: usize) {
        let engine_channels = mix.channels;
        let shared = engine_channels.min(hw_channels);

        for (frame, out) in dest.chunks_mut(hw_channels).take(frames).enumerate() {
            let input = &mix.samples[frame * engine_channels..(frame + 1) * engine_channels];
            out[..shared].copy_from_slice(&input[..shared]);

            if hw_channels > engine_channels {
                let mono = input.iter().sum::<f32>() / engine_channels as f32;
                for sample in out[shared..].iter_mut() {
                    *sample = mono;
                }
            }

            let left = input[0].abs();
            let right = input.get(1).map_or(left, |s| s.abs());
            self.peak_left = self.peak_left.max(left);
            self.peak_right = self.peak_right.max(right);
        }
    }

    /// Sends faults and retired memory back to the control thread.
    fn flush_events(&mut self) {
        while let Some(node) = self.graph.pop_fault() {
            self.audio_handle.send_event_lossy(EngineEvent::NodeFault { node });
        }

        while let Some(event) = self.graph.pop_retired() {
            if let Err(event) = self.audio_handle.send_event(event) {
                // Queue full: keep it for the next callback
                self.graph.push_retired(event);
                break;
            }
        }
    }

    /// Seconds of audio rendered so far.
    pub fn dsp_time(&self) -> f64 {
        self.dsp_time
    }

    /// Times `node` ran during the last evaluation pass.
    pub fn fill_count(&self, node: NodeId) -> u32 {
        self.graph.fill_count(node)
    }

    /// A node's output as left by the last evaluation pass.
    pub fn node_output(&self, node: NodeId, port: usize) -> Option<&SignalBuffer> {
        self.graph.node_output(node, port)
    }

    pub fn graph(&self) -> &AudioGraph {
        &self.graph
    }

    pub fn cpu_load(&self) -> f32 {
        self.cpu_load_avg
    }
}
