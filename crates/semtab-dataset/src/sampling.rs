use crate::error::Result;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use semtab_model::{Example, Sampleable};
use tracing::debug;

/// Cap every example's table at `n_rows` rows.
///
/// Tables with at most `n_rows` rows pass through untouched. Larger tables
/// keep `n_rows` distinct rows drawn without replacement, links included.
/// One generator is shared across all examples, so a fixed `seed` gives the
/// same output for the same input sequence.
pub fn sample_table_data<T: Sampleable>(
    examples: Vec<Example<T>>,
    n_rows: usize,
    seed: Option<u64>,
) -> Result<Vec<Example<T>>> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    examples
        .into_iter()
        .map(|example| {
            let nrows = example.table.nrows();
            if nrows <= n_rows {
                return Ok(example);
            }
            let rows = index::sample(&mut rng, nrows, n_rows).into_vec();
            debug!(example = %example.id, nrows, kept = n_rows, "sampled table rows");
            let table = example.table.select_rows(&rows)?;
            Ok(example.replace_table(table))
        })
        .collect()
}
