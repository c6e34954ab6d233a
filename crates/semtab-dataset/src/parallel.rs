//! Order-preserving map over a worker pool.

use rayon::prelude::*;
use rayon::{ThreadPoolBuildError, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelOptions {
    /// Run sequentially on the calling thread when false.
    pub parallel: bool,
    /// Worker count; the rayon default when unset.
    pub n_threads: Option<usize>,
}

impl Default for ParallelOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            n_threads: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ParallelMapError<E>
where
    E: std::error::Error + 'static,
{
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] ThreadPoolBuildError),

    #[error("item {index} failed: {source}")]
    Item {
        index: usize,
        #[source]
        source: E,
    },
}

fn run_indexed<I, R, E, F>(
    items: Vec<I>,
    f: F,
    options: &ParallelOptions,
) -> Result<Vec<(usize, Result<R, E>)>, ThreadPoolBuildError>
where
    I: Send,
    R: Send,
    E: Send,
    F: Fn(I) -> Result<R, E> + Sync + Send,
{
    if !options.parallel {
        return Ok(items.into_iter().map(&f).enumerate().collect());
    }

    let mut builder = ThreadPoolBuilder::new();
    if let Some(n) = options.n_threads {
        builder = builder.num_threads(n);
    }
    let pool = builder.build()?;
    let mut results: Vec<(usize, Result<R, E>)> = pool.install(|| {
        items
            .into_par_iter()
            .enumerate()
            .map(|(i, item)| (i, f(item)))
            .collect()
    });
    results.sort_by_key(|(i, _)| *i);
    Ok(results)
}

/// Apply `f` to every item; outputs keep the input order. The first failure
/// (by input position) is returned.
pub fn parallel_map<I, R, E, F>(
    items: Vec<I>,
    f: F,
    options: &ParallelOptions,
) -> Result<Vec<R>, ParallelMapError<E>>
where
    I: Send,
    R: Send,
    E: std::error::Error + Send + 'static,
    F: Fn(I) -> Result<R, E> + Sync + Send,
{
    run_indexed(items, f, options)?
        .into_iter()
        .map(|(index, result)| {
            result.map_err(|source| {
                error!(index, error = %source, "item failed in parallel map");
                ParallelMapError::Item { index, source }
            })
        })
        .collect()
}

/// Like [`parallel_map`], but a failed item is logged and yields `None`.
pub fn parallel_map_lenient<I, R, E, F>(
    items: Vec<I>,
    f: F,
    options: &ParallelOptions,
) -> Result<Vec<Option<R>>, ThreadPoolBuildError>
where
    I: Send,
    R: Send,
    E: std::fmt::Display + Send,
    F: Fn(I) -> Result<R, E> + Sync + Send,
{
    Ok(run_indexed(items, f, options)?
        .into_iter()
        .map(|(index, result)| match result {
            Ok(value) => Some(value),
            Err(err) => {
                error!(index, error = %err, "item failed in parallel map, skipping");
                None
            }
        })
        .collect())
}
