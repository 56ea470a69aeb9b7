//! Concurrent fan-out with ordered fan-in.
//!
//! Seeds of one batch, and dependencies of one seed, are driven concurrently
//! on the calling task. Every future is polled to completion even after a
//! failure: a seed that already issued its write is never abandoned halfway.

use std::future::Future;

use futures::stream::{FuturesUnordered, StreamExt};

/// Drive all `tasks` concurrently and collect their outputs in input order.
///
/// Returns the first error in completion order, after all tasks have
/// finished, or every value in the order the tasks were given.
pub async fn join_ordered<T, E, Fut>(tasks: impl IntoIterator<Item = Fut>) -> Result<Vec<T>, E>
where
    Fut: Future<Output = Result<T, E>>,
{
    let mut pending: FuturesUnordered<_> = tasks
        .into_iter()
        .enumerate()
        .map(|(index, task)| async move { (index, task.await) })
        .collect();

    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(pending.len()).collect();
    let mut first_error: Option<E> = None;

    while let Some((index, result)) = pending.next().await {
        match result {
            Ok(value) => slots[index] = Some(value),
            Err(err) => {
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(slots.into_iter().flatten().collect()),
    }
}
