//! Per-callback visit marks for the recursive pull.
//!
//! Two bitsets indexed by node id: `on_stack` holds the nodes on the current
//! pull path, `done` the nodes already evaluated this callback. Entering a
//! node that is already on the stack means the graph has a cycle.

/// Visit marks, sized once for `max_nodes`.
#[derive(Debug, Clone)]
pub struct RecursionGuard {
    on_stack: Vec<u64>,
    done: Vec<u64>,
}

#[inline]
fn locate(id: u32) -> (usize, u64) {
    ((id / 64) as usize, 1 << (id % 64))
}

impl RecursionGuard {
    pub fn new(max_nodes: usize) -> Self {
        let words = max_nodes.div_ceil(64);
        Self {
            on_stack: vec![0; words],
            done: vec![0; words],
        }
    }

    /// Clears every mark. Called once at the start of each callback.
    pub fn rearm(&mut self) {
        self.on_stack.fill(0);
        self.done.fill(0);
    }

    /// Marks `id` as on the pull path.
    ///
    /// Returns false if it already was (a cycle) or if `id` is out of range.
    pub fn enter_pre(&mut self, id: u32) -> bool {
        let (word, bit) = locate(id);
        match self.on_stack.get_mut(word) {
            Some(w) if *w & bit == 0 => {
                *w |= bit;
                true
            }
            _ => false,
        }
    }

    /// Takes `id` off the pull path.
    pub fn exit_post(&mut self, id: u32) {
        let (word, bit) = locate(id);
        if let Some(w) = self.on_stack.get_mut(word) {
            *w &= !bit;
        }
    }

    pub fn mark_done(&mut self, id: u32) {
        let (word, bit) = locate(id);
        if let Some(w) = self.done.get_mut(word) {
            *w |= bit;
        }
    }

    pub fn is_done(&self, id: u32) -> bool {
        let (word, bit) = locate(id);
        self.done.get(word).is_some_and(|w| w & bit != 0)
    }

    pub fn is_on_stack(&self, id: u32) -> bool {
        let (word, bit) = locate(id);
        self.on_stack.get(word).is_some_and(|w| w & bit != 0)
    }
}
