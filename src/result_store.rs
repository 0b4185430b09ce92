use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::ranking::{MatchEntry, MaterializedResult};

/// One immutable snapshot of the pagination state.
///
/// Invariants (checked by the store on every commit):
/// - `materialized` is always the length-`cursor` prefix of `full_ranking`
///   projected with resolved audio, never a subset with gaps
/// - `cursor` only grows within one generation, by at most `page_size` per
///   committed page, and never past `full_ranking.len()`
#[derive(Debug, Clone)]
pub struct RankingState {
    /// Identity of the search this state belongs to; bumped on every new
    /// search so late page commits can be recognized as stale
    pub generation: u64,
    pub full_ranking: Vec<MatchEntry>,
    pub cursor: usize,
    pub page_size: usize,
    pub materialized: Vec<MaterializedResult>,
}

impl RankingState {
    fn empty(generation: u64, page_size: usize) -> Self {
        Self {
            generation,
            full_ranking: Vec::new(),
            cursor: 0,
            page_size,
            materialized: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.full_ranking.len()
    }

    pub fn is_empty(&self) -> bool {
        self.full_ranking.is_empty()
    }

    /// Entries not yet materialized
    pub fn remaining(&self) -> usize {
        self.full_ranking.len() - self.cursor
    }

    /// True once every entry has been materialized; the "show more" control
    /// is disabled in this state
    pub fn is_exhausted(&self) -> bool {
        self.cursor == self.full_ranking.len()
    }
}

/// Process-local holder of the current ranking and its materialized prefix.
///
/// The snapshot is replaced atomically on every completion rather than
/// mutated field-by-field, so readers always observe a consistent state and
/// the staleness check is a single generation comparison. The store does no
/// I/O; search and page completions feed it.
pub struct ResultStore {
    state: RwLock<Arc<RankingState>>,
    next_generation: AtomicU64,
}

impl ResultStore {
    pub fn new(page_size: usize) -> Self {
        Self {
            state: RwLock::new(Arc::new(RankingState::empty(0, page_size))),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Current snapshot; cheap to clone out and safe to render from while
    /// fetches are in flight
    pub fn snapshot(&self) -> Arc<RankingState> {
        self.state.read().clone()
    }

    /// Start a new search: allocate its generation and clear whatever the
    /// previous search left behind. Any fetch still in flight for an older
    /// generation will be dropped at commit time.
    pub fn begin_search(&self) -> u64 {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let page_size = self.state.read().page_size;
        *self.state.write() = Arc::new(RankingState::empty(generation, page_size));
        generation
    }

    /// Commit a completed search: the full ranking plus its materialized
    /// first page. Returns false (and changes nothing) if a newer search has
    /// superseded `generation`.
    pub fn commit_search(
        &self,
        generation: u64,
        full_ranking: Vec<MatchEntry>,
        first_page: Vec<MaterializedResult>,
    ) -> bool {
        let mut state = self.state.write();
        if state.generation != generation {
            return false;
        }
        debug_assert!(first_page.len() <= full_ranking.len());

        let cursor = first_page.len();
        *state = Arc::new(RankingState {
            generation,
            full_ranking,
            cursor,
            page_size: state.page_size,
            materialized: first_page,
        });
        true
    }

    /// Append a fetched page and advance the cursor. Returns false if the
    /// page targets a superseded generation (stale fetch) or would not
    /// extend the materialized prefix contiguously.
    pub fn commit_page(&self, generation: u64, page: Vec<MaterializedResult>) -> bool {
        let mut state = self.state.write();
        if state.generation != generation {
            return false;
        }
        if state.cursor + page.len() > state.full_ranking.len() {
            return false;
        }

        let mut materialized = state.materialized.clone();
        materialized.extend(page);
        let cursor = materialized.len();

        *state = Arc::new(RankingState {
            generation: state.generation,
            full_ranking: state.full_ranking.clone(),
            cursor,
            page_size: state.page_size,
            materialized,
        });
        true
    }

    /// Reset to empty if `generation` is still current. Used after a failed
    /// search so partial results never stay visible.
    pub fn reset_if_current(&self, generation: u64) -> bool {
        let mut state = self.state.write();
        if state.generation != generation {
            return false;
        }
        *state = Arc::new(RankingState::empty(generation, state.page_size));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::AudioHandle;

    fn entry(i: usize) -> MatchEntry {
        MatchEntry {
            id: format!("sound_{i}.ogg"),
            score: 1.0 - (i as f32) * 0.01,
            source_locator: format!("library/sound_{i}.ogg"),
        }
    }

    fn ranking(n: usize) -> Vec<MatchEntry> {
        (0..n).map(entry).collect()
    }

    fn materialize(entries: &[MatchEntry]) -> Vec<MaterializedResult> {
        entries
            .iter()
            .map(|e| MaterializedResult::new(e.clone(), AudioHandle::new(vec![1, 2, 3], "audio/ogg")))
            .collect()
    }

    fn assert_prefix_invariant(state: &RankingState) {
        assert_eq!(state.materialized.len(), state.cursor);
        for (m, e) in state.materialized.iter().zip(state.full_ranking.iter()) {
            assert_eq!(m.entry.id, e.id);
            assert_eq!(m.entry.score, e.score);
        }
    }

    #[test]
    fn search_commit_materializes_first_page() {
        let store = ResultStore::new(10);
        let generation = store.begin_search();
        let full = ranking(25);
        assert!(store.commit_search(generation, full.clone(), materialize(&full[..10])));

        let state = store.snapshot();
        assert_eq!(state.cursor, 10);
        assert_eq!(state.remaining(), 15);
        assert!(!state.is_exhausted());
        assert_prefix_invariant(&state);
    }

    #[test]
    fn pages_of_25_entries_with_page_size_10() {
        let store = ResultStore::new(10);
        let generation = store.begin_search();
        let full = ranking(25);
        store.commit_search(generation, full.clone(), materialize(&full[..10]));

        assert!(store.commit_page(generation, materialize(&full[10..20])));
        let state = store.snapshot();
        assert_eq!(state.cursor, 20);
        assert_prefix_invariant(&state);

        // Tail page is shorter than page_size
        assert!(store.commit_page(generation, materialize(&full[20..25])));
        let state = store.snapshot();
        assert_eq!(state.cursor, 25);
        assert!(state.is_exhausted());
        assert_prefix_invariant(&state);

        // Nothing left to append past the end
        assert!(!store.commit_page(generation, materialize(&full[..1])));
        assert_eq!(store.snapshot().cursor, 25);
    }

    #[test]
    fn stale_page_commit_is_discarded() {
        let store = ResultStore::new(10);
        let old_generation = store.begin_search();
        let old = ranking(20);
        store.commit_search(old_generation, old.clone(), materialize(&old[..10]));

        // A new search begins while a page fetch for the old ranking is in
        // flight; the late commit must not land.
        let new_generation = store.begin_search();
        assert!(!store.commit_page(old_generation, materialize(&old[10..20])));
        assert!(store.snapshot().is_empty());

        let new = ranking(5);
        store.commit_search(new_generation, new.clone(), materialize(&new));
        let state = store.snapshot();
        assert_eq!(state.generation, new_generation);
        assert_eq!(state.cursor, 5);
        assert_prefix_invariant(&state);
        // No mixing: every materialized row belongs to the new ranking
        assert!(state.materialized.iter().all(|m| new.iter().any(|e| e.id == m.entry.id)));
    }

    #[test]
    fn stale_search_commit_is_discarded() {
        let store = ResultStore::new(10);
        let old_generation = store.begin_search();
        let _new_generation = store.begin_search();

        let full = ranking(3);
        assert!(!store.commit_search(old_generation, full.clone(), materialize(&full)));
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn failed_search_resets_to_empty() {
        let store = ResultStore::new(10);
        let generation = store.begin_search();
        let full = ranking(8);
        store.commit_search(generation, full.clone(), materialize(&full[..8]));

        assert!(store.reset_if_current(generation));
        let state = store.snapshot();
        assert!(state.is_empty());
        assert_eq!(state.cursor, 0);
    }
}
