//! Step classification.
//!
//! Each tick the monitor compares the newly resolved address with the
//! previous one; the signed delta falls into exactly one step kind.

use strum::Display;

/// What a change in the resolved address means.
///
/// `Backward` never comes out of [`classify`]: any negative delta counts as
/// a backward jump, because sequential data is only ever consumed forwards.
/// `Reset`, `Preview` and `Lookup` are assigned by the monitor, not derived
/// from a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StepKind {
    Forward,
    Backward,
    ForwardJump,
    BackwardJump,
    Reset,
    Preview,
    Lookup,
}

impl StepKind {
    pub fn is_jump(self) -> bool {
        matches!(
            self,
            StepKind::ForwardJump | StepKind::BackwardJump | StepKind::Reset
        )
    }
}

/// A classified address change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub kind: StepKind,
    pub delta: i64,
}

/// Classify the move from `previous` to `current`.
///
/// Returns `None` when the address did not move (the caller waits and
/// re-samples). Otherwise the delta partitions as: negative = backward
/// jump, above `jump_threshold` = forward jump, else a plain forward step.
pub fn classify(previous: u64, current: u64, jump_threshold: i64) -> Option<Step> {
    let delta = current as i64 - previous as i64;
    if delta == 0 {
        return None;
    }
    let kind = if delta < 0 {
        StepKind::BackwardJump
    } else if delta > jump_threshold {
        StepKind::ForwardJump
    } else {
        StepKind::Forward
    };
    Some(Step { kind, delta })
}
