//! Building blocks for the live "matching questions" counter.
//!
//! `RequestSequence` tags outgoing count requests so only the latest one may
//! land. `AnimatedCount` holds the displayed number and walks it toward the
//! resolved target one unit per tick.

/// Tag attached to an outgoing request at issue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTag(u64);

impl RequestTag {
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Monotonic issuer of request tags (latest-request-wins).
#[derive(Debug, Clone, Default)]
pub struct RequestSequence {
    latest: u64,
}

impl RequestSequence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a tag that supersedes every tag issued before it.
    pub fn issue(&mut self) -> RequestTag {
        self.latest = self.latest.saturating_add(1);
        RequestTag(self.latest)
    }

    /// Only the most recently issued tag may apply its result, whatever the arrival order.
    #[must_use]
    pub fn is_latest(&self, tag: RequestTag) -> bool {
        tag.0 == self.latest
    }
}

/// Displayed count stepping toward a target by one per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnimatedCount {
    display: u32,
    target: u32,
}

impl AnimatedCount {
    #[must_use]
    pub fn new(initial: u32) -> Self {
        Self {
            display: initial,
            target: initial,
        }
    }

    #[must_use]
    pub fn display(&self) -> u32 {
        self.display
    }

    #[must_use]
    pub fn target(&self) -> u32 {
        self.target
    }

    /// Point the animation at a new target. The display value is left where it is,
    /// so direction is recomputed from the mid-flight value on the next step.
    pub fn retarget(&mut self, target: u32) {
        self.target = target;
    }

    /// Move one unit toward the target. Returns `false` once settled.
    pub fn step(&mut self) -> bool {
        match self.display.cmp(&self.target) {
            std::cmp::Ordering::Less => {
                self.display += 1;
                true
            }
            std::cmp::Ordering::Greater => {
                self.display -= 1;
                true
            }
            std::cmp::Ordering::Equal => false,
        }
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.display == self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_latest_tag_wins() {
        let mut seq = RequestSequence::new();
        let first = seq.issue();
        let second = seq.issue();
        assert!(!seq.is_latest(first));
        assert!(seq.is_latest(second));
        assert!(second > first);
    }

    #[test]
    fn steps_by_one_until_settled() {
        let mut count = AnimatedCount::new(0);
        count.retarget(3);
        let mut seen = Vec::new();
        while count.step() {
            seen.push(count.display());
        }
        assert_eq!(seen, vec![1, 2, 3]);
        assert!(count.is_settled());
        assert!(!count.step());
    }

    #[test]
    fn reverses_from_mid_flight_value() {
        let mut count = AnimatedCount::new(12);
        count.retarget(40);
        for _ in 0..10 {
            count.step();
        }
        assert_eq!(count.display(), 22);

        count.retarget(5);
        let mut previous = count.display();
        while count.step() {
            assert_eq!(count.display() + 1, previous);
            previous = count.display();
        }
        assert_eq!(count.display(), 5);
    }
}
