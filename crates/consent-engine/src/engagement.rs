//! Fire-once engagement milestones
//!
//! Scroll-depth percentages and time-on-page both report against fixed
//! milestone ladders. Crossing state lives here, outside the monotonic
//! viewed-section set, so each milestone fires at most once per page visit.

/// Scroll-depth milestones, in percent.
pub const DEPTH_THRESHOLDS: [u8; 4] = [25, 50, 75, 100];

/// Time-on-page milestones, in seconds.
pub const TIME_MARKS: [u32; 4] = [30, 60, 120, 300];

/// Tracks which depth thresholds have already been reported.
#[derive(Debug, Default, Clone)]
pub struct DepthThresholds {
    crossed: [bool; DEPTH_THRESHOLDS.len()],
}

impl DepthThresholds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Thresholds newly reached by `percent`, in ascending order.
    /// Each threshold is returned exactly once over the life of the value.
    pub fn crossings(&mut self, percent: u8) -> Vec<u8> {
        let mut fired = Vec::new();
        for (i, &threshold) in DEPTH_THRESHOLDS.iter().enumerate() {
            if percent >= threshold && !self.crossed[i] {
                self.crossed[i] = true;
                fired.push(threshold);
            }
        }
        fired
    }
}

/// Accumulates time-on-page from caller-supplied tick timestamps and
/// reports each [`TIME_MARKS`] bucket once. Driven by an external timer
/// that the page controller cancels on unload.
#[derive(Debug, Default, Clone)]
pub struct EngagementClock {
    seconds: u32,
    reported: [bool; TIME_MARKS.len()],
}

impl EngagementClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock to `seconds_on_page` and return any newly passed
    /// marks. Ticks never move the clock backwards.
    pub fn tick(&mut self, seconds_on_page: u32) -> Vec<u32> {
        self.seconds = self.seconds.max(seconds_on_page);
        let mut fired = Vec::new();
        for (i, &mark) in TIME_MARKS.iter().enumerate() {
            if self.seconds >= mark && !self.reported[i] {
                self.reported[i] = true;
                fired.push(mark);
            }
        }
        fired
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_thresholds_fire_in_order() {
        let mut thresholds = DepthThresholds::new();
        assert_eq!(thresholds.crossings(25), vec![25]);
        assert_eq!(thresholds.crossings(50), vec![50]);
        assert_eq!(thresholds.crossings(75), vec![75]);
        assert_eq!(thresholds.crossings(100), vec![100]);
    }

    #[test]
    fn test_thresholds_fire_at_most_once() {
        let mut thresholds = DepthThresholds::new();
        assert_eq!(thresholds.crossings(60), vec![25, 50]);
        assert_eq!(thresholds.crossings(60), Vec::<u8>::new());
        assert_eq!(thresholds.crossings(100), vec![75, 100]);
        assert_eq!(thresholds.crossings(100), Vec::<u8>::new());
    }

    #[test]
    fn test_jump_to_full_fires_every_threshold() {
        let mut thresholds = DepthThresholds::new();
        assert_eq!(thresholds.crossings(100), vec![25, 50, 75, 100]);
    }

    #[test]
    fn test_below_first_threshold_fires_nothing() {
        let mut thresholds = DepthThresholds::new();
        assert_eq!(thresholds.crossings(24), Vec::<u8>::new());
    }

    #[test]
    fn test_clock_reports_each_mark_once() {
        let mut clock = EngagementClock::new();
        assert_eq!(clock.tick(10), Vec::<u32>::new());
        assert_eq!(clock.tick(35), vec![30]);
        assert_eq!(clock.tick(130), vec![60, 120]);
        assert_eq!(clock.tick(130), Vec::<u32>::new());
    }

    #[test]
    fn test_clock_never_runs_backwards() {
        let mut clock = EngagementClock::new();
        clock.tick(90);
        clock.tick(5);
        assert_eq!(clock.seconds(), 90);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Over any tick sequence, each mark is reported at most once.
            #[test]
            fn prop_marks_report_at_most_once(
                ticks in prop::collection::vec(0u32..400, 1..30),
            ) {
                let mut clock = EngagementClock::new();
                let mut seen = Vec::new();
                for t in ticks {
                    seen.extend(clock.tick(t));
                }
                let mut deduped = seen.clone();
                deduped.sort_unstable();
                deduped.dedup();
                prop_assert_eq!(seen.len(), deduped.len());
            }
        }
    }
}
