use crate::result_store::RankingState;

/// Similarity formatted the way the service's scores are shown everywhere:
/// percentage to one decimal place
pub fn format_score(score: f32) -> String {
    format!("{:.1}% match", score * 100.0)
}

/// m:ss display for the recording timer
pub fn format_elapsed(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// One result row: rank, playing marker, identifier, similarity, audio size
pub fn format_row(index: usize, state: &RankingState, playing_row: Option<usize>) -> String {
    let result = &state.materialized[index];
    let rank = index + 1;
    let marker = if playing_row == Some(rank) { ">" } else { " " };
    format!(
        "{} {:>3}. {:<40} {:>12}  [{} bytes]",
        marker,
        rank,
        result.entry.id,
        format_score(result.entry.score),
        result.audio.len()
    )
}

/// Footer under the list: progress through the ranking and whether `more`
/// has anything left to do
pub fn format_footer(state: &RankingState) -> String {
    if state.is_exhausted() {
        format!("Showing all {} results.", state.len())
    } else {
        format!(
            "Showing {} of {} results. Type 'more' for the next page.",
            state.cursor,
            state.len()
        )
    }
}

/// Print the materialized results. Rows never auto-play; playback is the
/// per-row toggle.
pub fn render_results(state: &RankingState, playing_row: Option<usize>) {
    if state.is_empty() {
        println!("No matching sounds.");
        return;
    }

    println!();
    println!("Similar Sounds");
    println!("--------------");
    for index in 0..state.materialized.len() {
        println!("{}", format_row(index, state, playing_row));
    }
    println!("{}", format_footer(state));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::{AudioHandle, MatchEntry, MaterializedResult};

    fn state(total: usize, materialized: usize) -> RankingState {
        let full_ranking: Vec<MatchEntry> = (0..total)
            .map(|i| MatchEntry {
                id: format!("sound_{i}.ogg"),
                score: 0.873,
                source_locator: format!("sound_{i}.ogg"),
            })
            .collect();
        let materialized = full_ranking[..materialized]
            .iter()
            .map(|e| MaterializedResult::new(e.clone(), AudioHandle::new(vec![0; 64], "audio/ogg")))
            .collect::<Vec<_>>();
        RankingState {
            generation: 1,
            cursor: materialized.len(),
            page_size: 10,
            full_ranking,
            materialized,
        }
    }

    #[test]
    fn score_renders_as_percentage_with_one_decimal() {
        assert_eq!(format_score(0.873), "87.3% match");
        assert_eq!(format_score(1.0), "100.0% match");
        assert_eq!(format_score(0.0), "0.0% match");
    }

    #[test]
    fn elapsed_renders_minutes_and_padded_seconds() {
        assert_eq!(format_elapsed(0), "0:00");
        assert_eq!(format_elapsed(7), "0:07");
        assert_eq!(format_elapsed(65), "1:05");
        assert_eq!(format_elapsed(600), "10:00");
    }

    #[test]
    fn row_shows_rank_id_and_score() {
        let state = state(25, 10);
        let row = format_row(2, &state, None);
        assert!(row.contains("3."));
        assert!(row.contains("sound_2.ogg"));
        assert!(row.contains("87.3% match"));
    }

    #[test]
    fn playing_row_is_marked() {
        let state = state(5, 5);
        assert!(format_row(1, &state, Some(2)).starts_with('>'));
        assert!(format_row(0, &state, Some(2)).starts_with(' '));
    }

    #[test]
    fn footer_tracks_pagination_progress() {
        assert_eq!(
            format_footer(&state(25, 10)),
            "Showing 10 of 25 results. Type 'more' for the next page."
        );
        assert_eq!(format_footer(&state(25, 25)), "Showing all 25 results.");
    }
}
