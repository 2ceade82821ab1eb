//! Comparator-driven ordering of the merged result set.
//!
//! Videos rank against each other by descending view count, ties broken by
//! descending like count. Any comparison touching an article compares equal,
//! so articles keep their relative input order and land wherever the stable
//! sort leaves them. Callers pass the concatenated fetcher outputs (videos
//! first, then articles, each in provider order).

use std::cmp::Ordering;

use crate::results::SearchResult;

/// Order the merged results in place. Stable: equal-comparing results keep
/// their input order.
pub fn rank(results: &mut [SearchResult]) {
    results.sort_by(compare);
}

fn compare(a: &SearchResult, b: &SearchResult) -> Ordering {
    match (a, b) {
        (
            SearchResult::Video {
                views: a_views,
                likes: a_likes,
                ..
            },
            SearchResult::Video {
                views: b_views,
                likes: b_likes,
                ..
            },
        ) => b_views.cmp(a_views).then(b_likes.cmp(a_likes)),
        _ => Ordering::Equal,
    }
}
