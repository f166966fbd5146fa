use rayon::prelude::*;

use crate::foundation::error::{ReskinError, ReskinResult};

pub const DEFAULT_WORKERS: usize = 3;

fn build_thread_pool(workers: usize) -> ReskinResult<rayon::ThreadPool> {
    if workers == 0 {
        return Err(ReskinError::validation("workers must be >= 1"));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| ReskinError::tool(format!("failed to build worker pool: {e}")))
}

/// Run `f` over `items` with at most `workers` in flight.
///
/// Every item runs to completion; results come back in input order and the first
/// error in that order is returned.
pub fn run_bounded<T, R, F>(workers: usize, items: &[T], f: F) -> ReskinResult<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> ReskinResult<R> + Sync,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let pool = build_thread_pool(workers)?;
    let results = pool.install(|| items.par_iter().map(&f).collect::<Vec<_>>());
    results.into_iter().collect()
}

#[cfg(test)]
#[path = "../../tests/unit/remote/pool.rs"]
mod tests;
