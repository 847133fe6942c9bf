//! Bounded precision escalation.
//!
//! A ladder starts from `base_bits` and doubles the working precision
//! before every attempt, so a base of 40 is first tried at 80 bits.

use tracing::debug;

/// Starting point shared by the short-slope and volume ladders.
pub const BASE_BITS: u32 = 40;

/// Outcome of a single attempt at a given precision.
#[derive(Debug)]
pub enum Attempt<T> {
    /// The value is good enough; stop climbing.
    Success(T),
    /// A value was produced but failed its sanity bound.
    Insufficient(T),
    /// The oracle call failed outright.
    Failed(anyhow::Error),
}

/// Where a climb ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Climb<T> {
    Settled { value: T, bits: u32 },
    /// Every attempt was insufficient or failed; `value` is the last
    /// insufficient result.
    BestEffort { value: T, bits: u32 },
    Exhausted,
}

impl<T> Climb<T> {
    pub fn is_settled(&self) -> bool {
        matches!(self, Climb::Settled { .. })
    }

    pub fn value(self) -> Option<T> {
        match self {
            Climb::Settled { value, .. } | Climb::BestEffort { value, .. } => Some(value),
            Climb::Exhausted => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrecisionLadder {
    pub base_bits: u32,
    pub max_tries: usize,
}

impl PrecisionLadder {
    pub fn new(base_bits: u32, max_tries: usize) -> Self {
        Self {
            base_bits,
            max_tries,
        }
    }

    /// Precisions visited, in order.
    pub fn rungs(&self) -> impl Iterator<Item = u32> {
        let base = self.base_bits;
        (0..self.max_tries).map_while(move |i| {
            let shift = u32::try_from(i + 1).ok()?;
            base.checked_mul(2u32.checked_pow(shift)?)
        })
    }

    pub fn climb<T>(&self, mut attempt: impl FnMut(u32) -> Attempt<T>) -> Climb<T> {
        let mut best = None;
        for bits in self.rungs() {
            match attempt(bits) {
                Attempt::Success(value) => return Climb::Settled { value, bits },
                Attempt::Insufficient(value) => {
                    debug!(bits, "insufficient precision");
                    best = Some((value, bits));
                }
                Attempt::Failed(err) => {
                    debug!(bits, error = %err, "attempt failed");
                }
            }
        }
        match best {
            Some((value, bits)) => Climb::BestEffort { value, bits },
            None => Climb::Exhausted,
        }
    }
}

impl Default for PrecisionLadder {
    fn default() -> Self {
        Self::new(BASE_BITS, 10)
    }
}
