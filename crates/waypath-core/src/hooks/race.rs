//! Priority race: run candidates concurrently, commit in list order.
//!
//! All candidates are started at once. The winner is the lowest-index
//! candidate whose completion carried a result, and it is only emitted once
//! every lower-index candidate has also finished, so the outcome never
//! depends on which candidate happened to complete first.
//!
//! Candidates ranked after the winner are not cancelled: they keep running
//! to completion and their outcome is discarded. The combinator only
//! returns once every candidate has finished.

use super::Bail;
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;

/// Drive `candidates` concurrently and return the result of the
/// lowest-index one that produced a result, or `None` if none did.
pub async fn priority_race<I, T>(candidates: I) -> Option<T>
where
    I: IntoIterator,
    I::Item: Future<Output = T>,
    T: Bail,
{
    let mut pending: FuturesUnordered<_> = candidates
        .into_iter()
        .enumerate()
        .map(|(index, candidate)| async move { (index, candidate.await) })
        .collect();

    // Indices at or above the bound are ignored.
    let mut bound = pending.len();
    let mut finished: Vec<usize> = Vec::new();
    let mut committed: Option<T> = None;
    let mut emitted: Option<Option<T>> = None;

    while let Some((index, outcome)) = pending.next().await {
        if index >= bound {
            continue;
        }
        finished.push(index);

        if outcome.has_result() {
            bound = index + 1;
            finished.retain(|&i| i <= index);
            committed = Some(outcome);
        }

        if finished.len() == bound {
            emitted = Some(committed.take());
            bound = 0;
        }
    }

    emitted.flatten()
}

/// Map every item to a candidate future and race them with
/// [`priority_race`]: the first matching item, by list order, wins.
pub async fn for_each_bail<I, F, Fut, T>(items: I, iterator: F) -> Option<T>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = T>,
    T: Bail,
{
    priority_race(items.into_iter().map(iterator)).await
}
