//! Similarity
//!
//! Relevance scoring between a search query and a piece of text. Scores are in the
//! range `0.0..=100.0`; higher is a better match.

/// Score awarded when the text contains the whole query verbatim.
pub const EXACT_SCORE: f64 = 100.0;

/// Score awarded when every query word appears somewhere in the text.
pub const ALL_WORDS_SCORE: f64 = 80.0;

/// Upper bound of the word-overlap signal.
pub const WORD_OVERLAP_WEIGHT: f64 = 60.0;

/// Upper bound of the edit-distance signal.
pub const EDIT_DISTANCE_WEIGHT: f64 = 40.0;

/// Levenshtein distance between two strings, counted in characters.
///
/// Insertions, deletions and substitutions all cost one.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }

    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        let mut row = current.iter_mut();

        if let Some(first) = row.next() {
            *first = i + 1;
        }

        let mut left = i + 1;

        for ((cell, cb), window) in row.zip(&b).zip(previous.windows(2)) {
            let &[diagonal, above] = window else {
                continue;
            };

            let cost = usize::from(ca != cb);

            left = (above + 1).min(left + 1).min(diagonal + cost);

            *cell = left;
        }

        std::mem::swap(&mut previous, &mut current);
    }

    previous.last().copied().unwrap_or(0)
}

/// Whether every whitespace-delimited word of `query` is a substring of `text`.
///
/// Both arguments are expected to be lowercased already.
pub fn contains_all_words(text: &str, query: &str) -> bool {
    query.split_whitespace().all(|word| text.contains(word))
}

/// Relevance of `text` for `query`.
///
/// Exact containment short-circuits to [`EXACT_SCORE`] and full word coverage to
/// [`ALL_WORDS_SCORE`]. Anything else blends word overlap and edit distance, capped
/// at 100. An empty query or text scores zero.
pub fn similarity(query: &str, text: &str) -> f64 {
    let query = query.trim().to_lowercase();
    let text = text.trim().to_lowercase();

    if query.is_empty() || text.is_empty() {
        return 0.0;
    }

    if text.contains(&query) {
        return EXACT_SCORE;
    }

    if contains_all_words(&text, &query) {
        return ALL_WORDS_SCORE;
    }

    (word_overlap_score(&query, &text) + edit_distance_score(&query, &text)).min(EXACT_SCORE)
}

#[expect(
    clippy::cast_precision_loss,
    reason = "word counts are nowhere near 2^52"
)]
fn word_overlap_score(query: &str, text: &str) -> f64 {
    let text_words: Vec<&str> = text.split_whitespace().collect();
    let mut query_word_count = 0_usize;
    let mut matches = 0.0;

    for query_word in query.split_whitespace() {
        query_word_count += 1;

        for text_word in &text_words {
            if *text_word == query_word {
                matches += 1.0;
            } else if text_word.contains(query_word) || query_word.contains(text_word) {
                matches += 0.5;
            }
        }
    }

    if query_word_count == 0 {
        return 0.0;
    }

    matches / query_word_count as f64 * WORD_OVERLAP_WEIGHT
}

#[expect(
    clippy::cast_precision_loss,
    reason = "string lengths are nowhere near 2^52"
)]
fn edit_distance_score(query: &str, text: &str) -> f64 {
    let max_len = query.chars().count().max(text.chars().count());

    if max_len == 0 {
        return 0.0;
    }

    let distance = levenshtein(query, text);

    (max_len - distance) as f64 / max_len as f64 * EDIT_DISTANCE_WEIGHT
}
