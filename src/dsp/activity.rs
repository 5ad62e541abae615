//! Activity state for stateful effects.
//!
//! `Idle -> Active` when a signal is patched in, `Active -> Releasing` when
//! it goes away, `Releasing -> Idle` once the tail has died out. Idle nodes
//! emit silence and skip their DSP entirely.

/// Output peak below which a releasing tail is considered finished.
pub const TAIL_SILENCE: f32 = 1e-5;

/// Lifecycle of a node whose output outlives its input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Activity {
    #[default]
    Idle,
    Active,
    Releasing,
}

impl Activity {
    /// Advances the state at the start of a pass.
    ///
    /// Returns true if the node should run its DSP this pass.
    pub fn begin_pass(&mut self, input_patched: bool) -> bool {
        *self = match (*self, input_patched) {
            (_, true) => Activity::Active,
            (Activity::Active, false) => Activity::Releasing,
            (state, false) => state,
        };
        self.is_running()
    }

    /// Records the output peak of a releasing pass; a quiet tail goes Idle.
    ///
    /// Returns true if this call moved the node to Idle, so the caller can
    /// clear its delay lines.
    pub fn end_pass(&mut self, output_peak: f32) -> bool {
        if *self == Activity::Releasing && output_peak < TAIL_SILENCE {
            *self = Activity::Idle;
            return true;
        }
        false
    }

    /// True in Active or Releasing.
    pub fn is_running(&self) -> bool {
        !matches!(self, Activity::Idle)
    }
}

/// Largest absolute sample in a slice.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_until_patched() {
        let mut activity = Activity::default();
        assert!(!activity.begin_pass(false));
        assert_eq!(activity, Activity::Idle);

        assert!(activity.begin_pass(true));
        assert_eq!(activity, Activity::Active);
    }

    #[test]
    fn test_unpatch_releases_then_idles() {
        let mut activity = Activity::Active;

        assert!(activity.begin_pass(false));
        assert_eq!(activity, Activity::Releasing);

        // Tail still audible
        assert!(!activity.end_pass(0.1));
        assert!(activity.begin_pass(false));
        assert_eq!(activity, Activity::Releasing);

        // Tail gone
        assert!(activity.end_pass(0.0));
        assert_eq!(activity, Activity::Idle);
        assert!(!activity.begin_pass(false));
    }

    #[test]
    fn test_repatch_during_release() {
        let mut activity = Activity::Releasing;
        assert!(activity.begin_pass(true));
        assert_eq!(activity, Activity::Active);
        // Active nodes never go idle from end_pass
        assert!(!activity.end_pass(0.0));
    }

    #[test]
    fn test_peak() {
        assert_eq!(peak(&[0.1, -0.7, 0.3]), 0.7);
        assert_eq!(peak(&[]), 0.0);
    }
}
