// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use crate::core::event::Timestamp;
use crate::core::format::{FormatError, FrameRate};

/// Nanoseconds per second, the default time base.
pub const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Virtual output clock.
///
/// Tick `n` sits at `n * time_base * den / num`, computed from the index each
/// time rather than accumulated, so fractional rates such as 30000/1001 never
/// drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputClock {
    framerate: FrameRate,
    time_base: u64,
    index: u64,
}

impl OutputClock {
    pub fn new(framerate: FrameRate, time_base: u64) -> Result<Self, FormatError> {
        framerate.validate()?;
        if time_base == 0 {
            return Err(FormatError::BadFramerate);
        }
        Ok(Self {
            framerate,
            time_base,
            index: 0,
        })
    }

    /// Output pts of the tick with the given index.
    pub fn pts_at(&self, index: u64) -> Timestamp {
        let pts = index as u128 * self.time_base as u128 * self.framerate.den as u128
            / self.framerate.num as u128;
        pts.min(Timestamp::MAX as u128) as Timestamp
    }

    /// Pts of the tick currently waiting to be emitted.
    #[inline]
    pub fn tick(&self) -> Timestamp {
        self.pts_at(self.index)
    }

    #[inline]
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn advance(&mut self) {
        self.index += 1;
    }

    pub fn framerate(&self) -> FrameRate {
        self.framerate
    }

    pub fn time_base(&self) -> u64 {
        self.time_base
    }

    /// Nominal distance between ticks; individual steps may differ by one
    /// unit when the rate does not divide the time base.
    pub fn period(&self) -> Timestamp {
        self.pts_at(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_period() {
        let mut clock = OutputClock::new(FrameRate::new(1, 1), 1).unwrap();
        assert_eq!(clock.tick(), 0);
        clock.advance();
        clock.advance();
        assert_eq!(clock.tick(), 2);
        assert_eq!(clock.index(), 2);
        assert_eq!(clock.period(), 1);
    }

    #[test]
    fn test_ntsc_rate_does_not_drift() {
        let clock = OutputClock::new(FrameRate::new(30000, 1001), NANOS_PER_SECOND).unwrap();
        assert_eq!(clock.pts_at(1), 33_366_666);
        // 30000 frames at 29.97 fps last exactly 1001 seconds.
        assert_eq!(clock.pts_at(30_000), 1001 * NANOS_PER_SECOND as i64);

        let mut previous = clock.pts_at(0);
        for index in 1..1000 {
            let pts = clock.pts_at(index);
            assert!(pts > previous);
            previous = pts;
        }
    }

    #[test]
    fn test_invalid_clock() {
        assert_eq!(
            OutputClock::new(FrameRate::new(0, 1), NANOS_PER_SECOND),
            Err(FormatError::BadFramerate)
        );
        assert!(OutputClock::new(FrameRate::new(25, 1), 0).is_err());
    }
}
