//! Pre-allocated buffer pool for real-time audio processing.
//!
//! The BufferPool owns one buffer per output port of every installed node,
//! plus a free list of scratch buffers for the mix. Everything is sized for
//! the largest block up front; the audio thread only moves buffers around.

use std::mem;

use crate::dsp::signal::SignalBuffer;
use crate::engine::commands::NodeId;
use crate::modules::NodeKind;

/// Builds the output buffers for one node of `kind`.
///
/// Runs on the control thread; the result travels with the node's
/// `AddNode` command.
pub fn node_outputs(kind: NodeKind, max_frames: usize, channels: usize) -> Vec<SignalBuffer> {
    kind.outputs()
        .iter()
        .map(|port| SignalBuffer::new(max_frames, channels, port.signal_type))
        .collect()
}

/// Per-node output buffers and the scratch free list.
pub struct BufferPool {
    /// Output buffers indexed by node id.
    outputs: Vec<Vec<SignalBuffer>>,
    /// Free scratch buffers.
    scratch: Vec<SignalBuffer>,
    /// Always zero. Read in place of a source that cannot run this pass.
    silence: SignalBuffer,
    max_frames: usize,
    channels: usize,
}

impl BufferPool {
    /// Creates a pool for `max_nodes` nodes with `scratch_buffers` free scratch buffers.
    pub fn new(max_nodes: usize, max_frames: usize, channels: usize, scratch_buffers: usize) -> Self {
        let channels = channels.max(1);
        let mut scratch = Vec::with_capacity(scratch_buffers);
        scratch.extend((0..scratch_buffers).map(|_| SignalBuffer::audio(max_frames, channels)));
        Self {
            outputs: (0..max_nodes).map(|_| Vec::new()).collect(),
            scratch,
            silence: SignalBuffer::audio(max_frames, channels),
            max_frames,
            channels,
        }
    }

    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn max_nodes(&self) -> usize {
        self.outputs.len()
    }

    /// Installs a node's output buffers, returning whatever was there.
    ///
    /// Returns `buffers` untouched if `node` is out of range.
    pub fn install(
        &mut self,
        node: NodeId,
        buffers: Vec<SignalBuffer>,
    ) -> Result<Vec<SignalBuffer>, Vec<SignalBuffer>> {
        match self.outputs.get_mut(node as usize) {
            Some(slot) => Ok(mem::replace(slot, buffers)),
            None => Err(buffers),
        }
    }

    /// Removes a node's output buffers.
    pub fn uninstall(&mut self, node: NodeId) -> Vec<SignalBuffer> {
        self.outputs
            .get_mut(node as usize)
            .map(mem::take)
            .unwrap_or_default()
    }

    /// Takes a node's outputs out so the node can write them while its
    /// upstream outputs stay borrowed. Pair with [`BufferPool::restore_outputs`].
    ///
    /// REAL-TIME SAFE: an empty `Vec` does not allocate.
    pub fn take_outputs(&mut self, node: NodeId) -> Vec<SignalBuffer> {
        self.uninstall(node)
    }

    pub fn restore_outputs(&mut self, node: NodeId, buffers: Vec<SignalBuffer>) {
        if let Some(slot) = self.outputs.get_mut(node as usize) {
            *slot = buffers;
        }
    }

    /// A node's output buffer.
    pub fn output(&self, node: NodeId, port: usize) -> Option<&SignalBuffer> {
        self.outputs.get(node as usize)?.get(port)
    }

    /// The first `samples` samples of the shared zero buffer.
    pub fn silence(&self, samples: usize) -> &[f32] {
        let len = samples.min(self.silence.len());
        &self.silence.samples[..len]
    }

    /// Takes a zeroed scratch buffer from the free list.
    ///
    /// REAL-TIME SAFE: `None` when the list is exhausted, never allocates.
    pub fn acquire(&mut self) -> Option<SignalBuffer> {
        let mut buffer = self.scratch.pop()?;
        buffer.clear();
        buffer.producer = None;
        Some(buffer)
    }

    /// Returns a scratch buffer to the free list.
    ///
    /// Buffers of the wrong shape are handed back so the caller can retire
    /// them off the audio thread.
    pub fn release(&mut self, buffer: SignalBuffer) -> Option<SignalBuffer> {
        if buffer.channels != self.channels
            || buffer.frame_capacity() != self.max_frames
            || self.scratch.len() == self.scratch.capacity()
        {
            return Some(buffer);
        }
        self.scratch.push(buffer);
        None
    }

    /// Number of scratch buffers currently free.
    pub fn scratch_available(&self) -> usize {
        self.scratch.len()
    }
}
