//! Trailing-window sample buffers.
//!
//! Each buffer holds a dense, strictly increasing run of samples spaced one
//! period apart, covering at most the last `window` milliseconds. A refill
//! evicts what fell out of the window and then extends forward from the last
//! stored sample up to and including `now`, so consumers never see gaps or
//! duplicate timestamps no matter how irregularly ticks arrive.

use std::collections::VecDeque;

use crate::error::{CardioError, Result};
use crate::types::{Millis, TimedSample};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Dense trailing window of timed samples.
///
/// Deserialized buffers go through [`validate`](Self::validate) first, so a
/// stored window can never carry a non-positive period or unordered samples.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        try_from = "StoredWindow<T>",
        bound(deserialize = "T: Deserialize<'de> + TimedSample")
    )
)]
pub struct WindowedBuffer<T> {
    samples: VecDeque<T>,
    period: Millis,
    window: Millis,
}

impl<T: TimedSample> WindowedBuffer<T> {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new(period: Millis, window: Millis) -> Self {
        let capacity = (window / period).ceil().max(0.0) as usize + 1;
        Self {
            samples: VecDeque::with_capacity(capacity),
            period,
            window,
        }
    }

    /// Replaces the contents with one full window ending just before `now`.
    ///
    /// Samples land at `now - window`, `now - window + period`, ... with the
    /// last one strictly before `now`, so the next refill starts at `now`.
    pub fn prefill<F>(&mut self, now: Millis, mut sample_at: F)
    where
        F: FnMut(Millis) -> T,
    {
        self.samples.clear();
        let start = now - self.window;
        let mut step = 0u32;
        loop {
            let t = start + f64::from(step) * self.period;
            if t >= now {
                break;
            }
            self.samples.push_back(sample_at(t));
            step += 1;
        }
    }

    /// Drops every sample older than `now - window`.
    pub fn evict(&mut self, now: Millis) {
        let cutoff = now - self.window;
        while self.samples.front().is_some_and(|s| s.time() < cutoff) {
            self.samples.pop_front();
        }
    }

    /// Evicts, then appends samples one period apart up to and including
    /// `now`. Returns how many samples were added.
    pub fn refill<F>(&mut self, now: Millis, mut sample_at: F) -> usize
    where
        F: FnMut(Millis) -> T,
    {
        self.evict(now);

        let mut t = self
            .samples
            .back()
            .map_or(now - self.window, TimedSample::time)
            + self.period;
        let mut added = 0;
        while t <= now {
            self.push(sample_at(t));
            added += 1;
            t += self.period;
        }
        added
    }

    fn push(&mut self, sample: T) {
        assert!(
            self.samples.back().map_or(true, |last| last.time() < sample.time()),
            "samples must be strictly increasing in time"
        );
        self.samples.push_back(sample);
    }

    /// Iterates oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.samples.iter()
    }

    /// Copies the window out, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.samples.iter().cloned().collect()
    }

    /// Oldest sample.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.samples.front()
    }

    /// Newest sample.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.samples.back()
    }

    /// Number of samples held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when no samples are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Spacing between samples (ms).
    #[must_use]
    pub fn period(&self) -> Millis {
        self.period
    }

    /// Length of the trailing window (ms).
    #[must_use]
    pub fn window(&self) -> Millis {
        self.window
    }

    /// Removes all samples.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Checks the period, the window and the sample ordering.
    pub fn validate(&self) -> Result<()> {
        if !self.period.is_finite() || self.period <= 0.0 {
            return Err(CardioError::InvalidParameter {
                name: "buffer.period",
                message: format!("Must be > 0, got {}", self.period),
            });
        }
        if !self.window.is_finite() || self.window < self.period {
            return Err(CardioError::InvalidParameter {
                name: "buffer.window",
                message: format!(
                    "Must be finite and at least one period ({}), got {}",
                    self.period, self.window
                ),
            });
        }

        let mut previous: Option<Millis> = None;
        for sample in &self.samples {
            let time = sample.time();
            if !time.is_finite() || previous.is_some_and(|p| time <= p) {
                return Err(CardioError::InvalidParameter {
                    name: "buffer.samples",
                    message: format!("Sample at {time} ms breaks strictly increasing order"),
                });
            }
            previous = Some(time);
        }
        Ok(())
    }
}

/// Wire form of a [`WindowedBuffer`], checked before use.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct StoredWindow<T> {
    samples: VecDeque<T>,
    period: Millis,
    window: Millis,
}

#[cfg(feature = "serde")]
impl<T: TimedSample> TryFrom<StoredWindow<T>> for WindowedBuffer<T> {
    type Error = CardioError;

    fn try_from(stored: StoredWindow<T>) -> Result<Self> {
        let buffer = Self {
            samples: stored.samples,
            period: stored.period,
            window: stored.window,
        };
        buffer.validate()?;
        Ok(buffer)
    }
}
