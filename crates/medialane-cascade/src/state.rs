//! Cascade state machine.
//!
//! ```text
//! Idle --next_candidate--> Trying(0)
//! Trying(i) --record_failure--> Trying(i + 1) | Exhausted
//! Trying(i) --record_success--> Succeeded(i)
//! ```
//!
//! The attempt list is the deduplicated candidate list followed by the
//! caller fallback, when that fallback is not already on the list. No path is
//! ever attempted twice and the failing reference is never attempted at all,
//! so a cascade ends after at most `candidates + 1` attempts.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "attempt")]
pub enum CascadeState {
    Idle,
    /// Attempt `i` is in flight.
    Trying(usize),
    /// Attempt `i` loaded.
    Succeeded(usize),
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct Cascade {
    attempts: Vec<String>,
    fallback_index: Option<usize>,
    state: CascadeState,
}

impl Cascade {
    /// Build a cascade for a failure of `failing`.
    pub fn new(failing: &str, candidates: Vec<String>, fallback: Option<String>) -> Self {
        let failing = failing.trim();
        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(failing.to_string());

        let mut attempts: Vec<String> = candidates
            .into_iter()
            .filter(|c| !c.trim().is_empty())
            .filter(|c| seen.insert(c.clone()))
            .collect();

        let fallback_index = fallback
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty() && !seen.contains(f))
            .map(|f| {
                attempts.push(f);
                attempts.len() - 1
            });

        Self {
            attempts,
            fallback_index,
            state: CascadeState::Idle,
        }
    }

    pub fn state(&self) -> CascadeState {
        self.state
    }

    /// The path to attempt now, or `None` once the cascade has finished.
    ///
    /// Starts the cascade when idle; while an attempt is in flight it keeps
    /// returning that attempt's path.
    pub fn next_candidate(&mut self) -> Option<&str> {
        match self.state {
            CascadeState::Idle if self.attempts.is_empty() => {
                self.state = CascadeState::Exhausted;
                None
            }
            CascadeState::Idle => {
                self.state = CascadeState::Trying(0);
                Some(self.attempts[0].as_str())
            }
            CascadeState::Trying(i) => Some(self.attempts[i].as_str()),
            CascadeState::Succeeded(_) | CascadeState::Exhausted => None,
        }
    }

    /// The in-flight attempt failed. Outside `Trying` this does nothing, so a
    /// late result for a finished cascade is discarded.
    pub fn record_failure(&mut self) {
        if let CascadeState::Trying(i) = self.state {
            self.state = if i + 1 < self.attempts.len() {
                CascadeState::Trying(i + 1)
            } else {
                CascadeState::Exhausted
            };
        }
    }

    /// The in-flight attempt loaded. Returns its path.
    pub fn record_success(&mut self) -> Option<&str> {
        match self.state {
            CascadeState::Trying(i) => {
                self.state = CascadeState::Succeeded(i);
                Some(self.attempts[i].as_str())
            }
            _ => None,
        }
    }

    /// Number of attempts started so far.
    pub fn attempts(&self) -> usize {
        match self.state {
            CascadeState::Idle => 0,
            CascadeState::Trying(i) | CascadeState::Succeeded(i) => i + 1,
            CascadeState::Exhausted => self.attempts.len(),
        }
    }

    /// Every path this cascade will try, in order.
    pub fn planned(&self) -> &[String] {
        &self.attempts
    }

    /// Whether attempt `i` is the caller fallback.
    pub fn is_fallback(&self, i: usize) -> bool {
        self.fallback_index == Some(i)
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.state,
            CascadeState::Succeeded(_) | CascadeState::Exhausted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn walks_candidates_in_order() {
        let mut cascade = Cascade::new("/a.png", paths(&["/b.png", "/c.png"]), None);
        assert_eq!(cascade.state(), CascadeState::Idle);

        assert_eq!(cascade.next_candidate(), Some("/b.png"));
        assert_eq!(cascade.state(), CascadeState::Trying(0));
        // Still in flight.
        assert_eq!(cascade.next_candidate(), Some("/b.png"));

        cascade.record_failure();
        assert_eq!(cascade.next_candidate(), Some("/c.png"));
        assert_eq!(cascade.record_success(), Some("/c.png"));
        assert_eq!(cascade.state(), CascadeState::Succeeded(1));
        assert_eq!(cascade.attempts(), 2);
        assert_eq!(cascade.next_candidate(), None);
    }

    #[test]
    fn exhausts_after_last_failure() {
        let mut cascade = Cascade::new("/a.png", paths(&["/b.png"]), None);
        cascade.next_candidate();
        cascade.record_failure();
        assert_eq!(cascade.state(), CascadeState::Exhausted);
        assert_eq!(cascade.next_candidate(), None);
        assert_eq!(cascade.attempts(), 1);
    }

    #[test]
    fn empty_list_exhausts_immediately() {
        let mut cascade = Cascade::new("/a.png", Vec::new(), None);
        assert_eq!(cascade.next_candidate(), None);
        assert_eq!(cascade.state(), CascadeState::Exhausted);
        assert_eq!(cascade.attempts(), 0);
    }

    #[test]
    fn drops_duplicates_and_the_failing_reference() {
        let cascade = Cascade::new(
            "/a.png",
            paths(&["/b.png", "/a.png", "/b.png", "", "/c.png"]),
            None,
        );
        assert_eq!(cascade.planned(), &paths(&["/b.png", "/c.png"])[..]);
    }

    #[test]
    fn fallback_is_a_final_attempt() {
        let mut cascade = Cascade::new("/a.png", paths(&["/b.png"]), Some("/f.png".into()));
        assert_eq!(cascade.planned().len(), 2);
        assert!(cascade.is_fallback(1));

        cascade.next_candidate();
        cascade.record_failure();
        assert_eq!(cascade.next_candidate(), Some("/f.png"));
        cascade.record_failure();
        assert_eq!(cascade.state(), CascadeState::Exhausted);
        assert_eq!(cascade.attempts(), 2);
    }

    #[test]
    fn fallback_already_tried_is_not_repeated() {
        let cascade = Cascade::new("/a.png", paths(&["/b.png"]), Some("/b.png".into()));
        assert_eq!(cascade.planned(), &paths(&["/b.png"])[..]);

        let cascade = Cascade::new("/a.png", paths(&["/b.png"]), Some("/a.png".into()));
        assert_eq!(cascade.planned(), &paths(&["/b.png"])[..]);
    }

    #[test]
    fn late_results_after_finish_are_ignored() {
        let mut cascade = Cascade::new("/a.png", paths(&["/b.png", "/c.png"]), None);
        cascade.next_candidate();
        cascade.record_success();
        cascade.record_failure();
        assert_eq!(cascade.state(), CascadeState::Succeeded(0));
        assert_eq!(cascade.record_success(), None);
    }
}
