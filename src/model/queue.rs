//! Pending/history song queue
//!
//! Two ordered sequences: `pending` (not yet played, in play order) and
//! `history` (already played, append order). A song lives in exactly one of
//! the two at a time; every pop from pending lands in history and every
//! "go back" moves entries the other way, so nothing is ever lost or
//! duplicated.

use std::collections::VecDeque;

use rand::seq::SliceRandom;

use super::types::SongRef;

#[derive(Default)]
pub struct Queue {
    pending: VecDeque<SongRef>,
    history: Vec<SongRef>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw query or URL to the tail of the queue.
    ///
    /// Bare search terms get a ` song` suffix so the resolver's default
    /// search lands on music instead of arbitrary videos.
    pub fn enqueue(&mut self, query: &str) {
        if query.starts_with("http") {
            self.pending.push_back(SongRef::Raw(query.to_string()));
        } else {
            self.pending.push_back(SongRef::Raw(format!("{} song", query)));
        }
    }

    /// Add an already-formed entry (playlist expansion, saved playlists).
    pub fn push(&mut self, song: SongRef) {
        self.pending.push_back(song);
    }

    pub fn extend(&mut self, songs: impl IntoIterator<Item = SongRef>) {
        self.pending.extend(songs);
    }

    /// Move the head of pending into history and return it.
    pub fn pop_next(&mut self) -> Option<SongRef> {
        let song = self.pending.pop_front()?;
        self.history.push(song.clone());
        Some(song)
    }

    /// Move played songs back onto the front of pending for "previous".
    ///
    /// When reversing out of the currently-playing song two entries come
    /// back: the current one (so it replays after) and the one before it.
    /// Returns false if history is already exhausted.
    pub fn requeue_previous(&mut self, include_current: bool) -> bool {
        let needed = if include_current { 2 } else { 1 };
        if self.history.len() < needed {
            return false;
        }
        for _ in 0..needed {
            if let Some(song) = self.history.pop() {
                self.pending.push_front(song);
            }
        }
        true
    }

    /// Single-repeat support: move the just-finished song back to the head.
    pub fn shift_last_played_to_front(&mut self) -> bool {
        match self.history.pop() {
            Some(song) => {
                self.pending.push_front(song);
                true
            }
            None => false,
        }
    }

    /// Queue-repeat support: append the entire history to the tail of
    /// pending and clear it.
    pub fn loop_all(&mut self) {
        self.pending.extend(self.history.drain(..));
    }

    /// Uniform random permutation of pending only; history is untouched.
    pub fn shuffle(&mut self) {
        let mut rng = rand::thread_rng();
        self.pending.make_contiguous().shuffle(&mut rng);
    }

    /// Drop the tail of pending. Returns false when there is nothing to drop.
    pub fn remove_last(&mut self) -> bool {
        self.pending.pop_back().is_some()
    }

    /// Swap one pending entry for its expansion (e.g. a playlist URL for
    /// its tracks). The replacements land at the tail of pending. Returns
    /// false if the entry already left the queue.
    pub fn replace_entry(&mut self, target: &SongRef, replacements: Vec<SongRef>) -> bool {
        let Some(pos) = self.pending.iter().position(|s| s == target) else {
            return false;
        };
        self.pending.remove(pos);
        self.pending.extend(replacements);
        true
    }

    /// history ++ pending, in order, for persistence.
    pub fn snapshot(&self) -> Vec<SongRef> {
        self.history
            .iter()
            .chain(self.pending.iter())
            .cloned()
            .collect()
    }

    pub fn peek_next(&self) -> Option<&SongRef> {
        self.pending.front()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending_iter(&self) -> impl DoubleEndedIterator<Item = &SongRef> {
        self.pending.iter()
    }

    pub fn history_iter(&self) -> impl DoubleEndedIterator<Item = &SongRef> {
        self.history.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn raw(s: &str) -> SongRef {
        SongRef::Raw(s.to_string())
    }

    fn multiset(queue: &Queue) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for song in queue.pending_iter().chain(queue.history_iter()) {
            *counts.entry(song.identity()).or_default() += 1;
        }
        counts
    }

    #[test]
    fn enqueue_appends_search_suffix_to_bare_terms() {
        let mut queue = Queue::new();
        queue.enqueue("bohemian rhapsody");
        queue.enqueue("https://example.com/watch?v=abc");

        let pending: Vec<_> = queue.pending_iter().cloned().collect();
        assert_eq!(pending[0], raw("bohemian rhapsody song"));
        assert_eq!(pending[1], raw("https://example.com/watch?v=abc"));
    }

    #[test]
    fn pop_and_requeue_conserve_entries() {
        let mut queue = Queue::new();
        for name in ["a", "b", "c", "d"] {
            queue.push(raw(name));
        }
        let before = multiset(&queue);

        queue.pop_next();
        queue.pop_next();
        assert_eq!(multiset(&queue), before);

        queue.requeue_previous(true);
        assert_eq!(multiset(&queue), before);

        queue.pop_next();
        queue.shift_last_played_to_front();
        assert_eq!(multiset(&queue), before);
    }

    #[test]
    fn pop_next_moves_head_to_history() {
        let mut queue = Queue::new();
        queue.push(raw("a"));
        queue.push(raw("b"));

        assert_eq!(queue.pop_next(), Some(raw("a")));
        assert_eq!(queue.pending_len(), 1);
        assert_eq!(queue.history_iter().count(), 1);
    }

    #[test]
    fn requeue_previous_restores_play_order() {
        let mut queue = Queue::new();
        queue.push(raw("a"));
        queue.push(raw("b"));
        queue.push(raw("c"));
        queue.pop_next(); // playing a
        queue.pop_next(); // playing b

        // Reverse out of b: pending becomes [a, b, c].
        assert!(queue.requeue_previous(true));
        let pending: Vec<_> = queue.pending_iter().cloned().collect();
        assert_eq!(pending, vec![raw("a"), raw("b"), raw("c")]);
    }

    #[test]
    fn requeue_previous_fails_on_empty_history() {
        let mut queue = Queue::new();
        queue.push(raw("a"));
        assert!(!queue.requeue_previous(true));
    }

    #[test]
    fn loop_all_moves_history_back_to_pending() {
        let mut queue = Queue::new();
        for name in ["a", "b", "c"] {
            queue.push(raw(name));
        }
        queue.pop_next();
        queue.pop_next();
        queue.pop_next();
        assert!(queue.is_empty());

        queue.loop_all();
        let pending: Vec<_> = queue.pending_iter().cloned().collect();
        assert_eq!(pending, vec![raw("a"), raw("b"), raw("c")]);
        assert_eq!(queue.history_iter().count(), 0);
    }

    #[test]
    fn shuffle_preserves_multiset() {
        let mut queue = Queue::new();
        for i in 0..20 {
            queue.push(raw(&format!("song-{}", i)));
        }
        let before = multiset(&queue);
        queue.shuffle();
        assert_eq!(multiset(&queue), before);
    }

    #[test]
    fn remove_last_drops_tail_only() {
        let mut queue = Queue::new();
        queue.push(raw("a"));
        queue.push(raw("b"));
        assert!(queue.remove_last());
        assert_eq!(queue.peek_next(), Some(&raw("a")));

        queue.remove_last();
        assert!(!queue.remove_last());
    }

    #[test]
    fn history_iterates_newest_first_when_reversed() {
        let mut queue = Queue::new();
        for name in ["a", "b", "c"] {
            queue.push(raw(name));
        }
        queue.pop_next();
        queue.pop_next();

        let newest_first: Vec<_> = queue.history_iter().rev().cloned().collect();
        assert_eq!(newest_first, vec![raw("b"), raw("a")]);
    }

    #[test]
    fn snapshot_is_history_then_pending() {
        let mut queue = Queue::new();
        for name in ["a", "b", "c"] {
            queue.push(raw(name));
        }
        queue.pop_next();

        let snapshot = queue.snapshot();
        assert_eq!(snapshot, vec![raw("a"), raw("b"), raw("c")]);
    }
}
