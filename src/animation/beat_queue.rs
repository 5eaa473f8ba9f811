//! Pending beat timestamps waiting to be matched against playback time.

use std::collections::VecDeque;

use crate::params::MatchPolicy;

/// Result of polling the queue for one frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BeatPoll {
    /// Timestamp removed as the frame's beat, if any
    pub matched: Option<f32>,

    /// Stale timestamps dropped after matching
    pub discarded: usize,
}

impl BeatPoll {
    pub fn is_beat(&self) -> bool {
        self.matched.is_some()
    }
}

/// Ordered queue of detected beat times (seconds)
#[derive(Debug, Clone, Default)]
pub struct BeatQueue {
    times: VecDeque<f32>,
}

impl BeatQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a beat reported by the audio tracker
    pub fn push(&mut self, time_s: f32) {
        if let Some(&last) = self.times.back() {
            if time_s < last {
                log::debug!("Out-of-order beat {:.3}s after {:.3}s", time_s, last);
            }
        }
        self.times.push_back(time_s);
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.times.iter().copied()
    }

    /// Match the queue against `now_s`
    ///
    /// A timestamp matches when `|t - now| < tolerance`. At most one entry is
    /// removed as the match; which one depends on `policy`.
    pub fn poll(&mut self, now_s: f32, tolerance_s: f32, policy: MatchPolicy) -> BeatPoll {
        let nearest = self
            .times
            .iter()
            .enumerate()
            .map(|(i, &t)| (i, (t - now_s).abs()))
            .filter(|&(_, diff)| diff < tolerance_s)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        let matched = nearest.and_then(|(index, _)| match policy {
            MatchPolicy::Nearest => self.times.remove(index),
            MatchPolicy::Front => self.times.pop_front(),
        });

        let discarded = match policy {
            MatchPolicy::Nearest => self.discard_before(now_s - tolerance_s),
            MatchPolicy::Front => 0,
        };

        BeatPoll { matched, discarded }
    }

    /// Drop timestamps at or before `cutoff_s`; returns how many were dropped
    pub fn discard_before(&mut self, cutoff_s: f32) -> usize {
        let before = self.times.len();
        self.times.retain(|&t| t > cutoff_s);
        before - self.times.len()
    }
}

impl Extend<f32> for BeatQueue {
    fn extend<I: IntoIterator<Item = f32>>(&mut self, iter: I) {
        for time_s in iter {
            self.push(time_s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(times: &[f32]) -> BeatQueue {
        let mut q = BeatQueue::new();
        q.extend(times.iter().copied());
        q
    }

    #[test]
    fn test_match_inside_tolerance_only() {
        for policy in [MatchPolicy::Nearest, MatchPolicy::Front] {
            let mut q = queue(&[1.0]);
            assert!(!q.poll(0.85, 0.1, policy).is_beat());
            assert_eq!(q.len(), 1);

            let poll = q.poll(0.95, 0.1, policy);
            assert_eq!(poll.matched, Some(1.0));
            assert!(q.is_empty());
        }
    }

    #[test]
    fn test_tolerance_is_strict() {
        let mut q = queue(&[2.0]);
        // |2.0 - 1.5| = 0.5 sits exactly on a 0.5 tolerance
        assert!(!q.poll(1.5, 0.5, MatchPolicy::Front).is_beat());
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn test_one_removal_per_frame() {
        for policy in [MatchPolicy::Nearest, MatchPolicy::Front] {
            let mut q = queue(&[1.0, 1.05, 2.0]);
            let poll = q.poll(1.02, 0.1, policy);
            assert!(poll.is_beat());
            assert_eq!(q.len(), 2);
        }
    }

    #[test]
    fn test_nearest_policy_removes_matched_entry() {
        let mut q = queue(&[1.0, 1.05, 2.0]);
        let poll = q.poll(1.02, 0.1, MatchPolicy::Nearest);
        assert_eq!(poll.matched, Some(1.0));
        assert_eq!(q.iter().collect::<Vec<_>>(), vec![1.05, 2.0]);
    }

    #[test]
    fn test_policies_diverge_on_stale_front() {
        let mut front = queue(&[0.5, 1.0, 2.0]);
        let poll = front.poll(1.02, 0.1, MatchPolicy::Front);
        assert_eq!(poll.matched, Some(0.5));
        assert_eq!(poll.discarded, 0);
        assert_eq!(front.iter().collect::<Vec<_>>(), vec![1.0, 2.0]);

        let mut nearest = queue(&[0.5, 1.0, 2.0]);
        let poll = nearest.poll(1.02, 0.1, MatchPolicy::Nearest);
        assert_eq!(poll.matched, Some(1.0));
        assert_eq!(poll.discarded, 1);
        assert_eq!(nearest.iter().collect::<Vec<_>>(), vec![2.0]);
    }

    #[test]
    fn test_empty_queue_is_noop() {
        let mut q = BeatQueue::new();
        assert_eq!(q.poll(3.0, 0.1, MatchPolicy::Nearest), BeatPoll::default());
    }
}
