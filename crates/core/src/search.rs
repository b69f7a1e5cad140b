//! Search
//!
//! Structural filtering and relevance ranking over any collection of
//! [`Searchable`] items.

use std::cmp::Ordering;

use crate::similarity::similarity;

/// Weight of the name signal relative to description and category.
pub const NAME_WEIGHT: f64 = 2.0;

/// Sum of all signal weights; the blended score is divided by this.
pub const TOTAL_WEIGHT: f64 = 4.0;

/// An item that can be filtered and ranked by [`search`].
pub trait Searchable {
    /// Identifier used for [`find_by_id`].
    type Id: Ord + Copy;

    /// Stable identifier.
    fn id(&self) -> Self::Id;

    /// Display name, weighted double when ranking.
    fn name(&self) -> &str;

    /// Long-form description.
    fn description(&self) -> &str;

    /// Category label, also used for exact filtering.
    fn category(&self) -> &str;

    /// Price in minor currency units.
    fn price(&self) -> u64;
}

/// Search constraints. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    /// Free-text query. Absent or empty means "filter only".
    pub query: Option<String>,

    /// Inclusive lower price bound, in minor units.
    pub min_price: Option<u64>,

    /// Inclusive upper price bound, in minor units.
    pub max_price: Option<u64>,

    /// Exact category to keep.
    pub category: Option<String>,
}

impl SearchOptions {
    /// Query text, if one was given and is non-empty.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref().filter(|query| !query.is_empty())
    }

    /// Whether an item passes the category and price constraints.
    pub fn admits<T: Searchable>(&self, item: &T) -> bool {
        if let Some(category) = &self.category
            && item.category() != category
        {
            return false;
        }

        let price = item.price();

        self.min_price.is_none_or(|min| price >= min) && self.max_price.is_none_or(|max| price <= max)
    }
}

/// A search hit together with its relevance score.
///
/// `score` is `None` when no query was given and results were only filtered.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    /// Matched item.
    pub item: T,

    /// Blended relevance score in `0.0..=100.0`.
    pub score: Option<f64>,
}

impl<T> Ranked<T> {
    /// Wrap an item that was filtered but not scored.
    pub const fn unscored(item: T) -> Self {
        Self { item, score: None }
    }
}

/// Blended relevance of an item for a query.
///
/// The name counts double; the sum is divided by [`TOTAL_WEIGHT`].
pub fn relevance<T: Searchable>(query: &str, item: &T) -> f64 {
    let name_score = similarity(query, item.name()) * NAME_WEIGHT;
    let description_score = similarity(query, item.description());
    let category_score = similarity(query, item.category());

    (name_score + description_score + category_score) / TOTAL_WEIGHT
}

/// Filter `items` by the structural constraints in `options`, then rank by relevance.
///
/// Without a query the filtered items are returned in input order. With a query,
/// items scoring zero are dropped and the rest are sorted by descending score;
/// equal scores keep their input order.
pub fn search<T>(items: &[T], options: &SearchOptions) -> Vec<Ranked<T>>
where
    T: Searchable + Clone,
{
    let filtered = items.iter().filter(|item| options.admits(*item));

    let Some(query) = options.query() else {
        return filtered.cloned().map(Ranked::unscored).collect();
    };

    let mut ranked: Vec<Ranked<T>> = filtered
        .filter_map(|item| {
            let score = relevance(query, item);

            (score > 0.0).then(|| Ranked {
                item: item.clone(),
                score: Some(score),
            })
        })
        .collect();

    ranked.sort_by(|a, b| compare_scores(b.score, a.score));

    ranked
}

fn compare_scores(a: Option<f64>, b: Option<f64>) -> Ordering {
    a.unwrap_or(0.0).total_cmp(&b.unwrap_or(0.0))
}

/// Binary search for `id` in items sorted ascending by id.
///
/// Returns `None` when the id is absent.
pub fn find_by_id<T: Searchable>(sorted: &[T], id: T::Id) -> Option<&T> {
    sorted
        .binary_search_by(|item| item.id().cmp(&id))
        .ok()
        .and_then(|index| sorted.get(index))
}
