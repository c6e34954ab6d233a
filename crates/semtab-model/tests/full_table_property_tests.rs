use proptest::prelude::*;
use semtab_model::{Column, ColumnBasedTable, Context, EntityId, FullTable, Link, Matrix};
use serde_json::json;

fn arb_link() -> impl Strategy<Value = Link> {
    (0usize..6, 0usize..6, proptest::option::of("[a-z]{1,8}"), proptest::collection::vec("Q[0-9]{1,4}", 0..2))
        .prop_map(|(a, b, url, ids)| {
            let (start, end) = if a <= b { (a, b) } else { (b, a) };
            Link::new(
                start,
                end,
                url.map(|u| format!("https://en.wikipedia.org/wiki/{u}")),
                ids.into_iter().map(EntityId::wikidata).collect(),
            )
        })
}

fn arb_full_table() -> impl Strategy<Value = FullTable> {
    (1usize..6, 1usize..4).prop_flat_map(|(nrows, ncols)| {
        (
            proptest::collection::vec(proptest::collection::vec("[A-Za-z ]{0,10}", nrows), ncols),
            proptest::collection::vec(
                proptest::collection::vec(proptest::collection::vec(arb_link(), 0..3), ncols),
                nrows,
            ),
        )
            .prop_map(|(cols, links)| {
                let columns = cols
                    .into_iter()
                    .enumerate()
                    .map(|(ci, values)| {
                        Column::new(
                            ci,
                            Some(format!("col {ci}")),
                            values.into_iter().map(|v| json!(v)).collect(),
                        )
                    })
                    .collect();
                let table = ColumnBasedTable::new("prop-table", columns).unwrap();
                FullTable::new(table, Context::default(), Matrix::new(links)).unwrap()
            })
    })
}

proptest! {
    #[test]
    fn record_round_trip(t in arb_full_table()) {
        let text = serde_json::to_string(&t).unwrap();
        let back: FullTable = serde_json::from_str(&text).unwrap();
        prop_assert_eq!(back, t);
    }

    #[test]
    fn select_rows_preserves_shape(t in arb_full_table(), picks in proptest::collection::vec(any::<prop::sample::Index>(), 0..8)) {
        let indices: Vec<usize> = picks.iter().map(|i| i.index(t.nrows())).collect();
        let sub = t.select_rows(&indices).unwrap();
        prop_assert_eq!(sub.links.shape().unwrap().0, indices.len());
        if !indices.is_empty() {
            prop_assert_eq!(sub.links.shape().unwrap(), sub.table.shape());
        }
        for (new_row, &old_row) in indices.iter().enumerate() {
            prop_assert_eq!(sub.table.cell(new_row, 0), t.table.cell(old_row, 0));
            prop_assert_eq!(sub.links.row(new_row), t.links.row(old_row));
        }
    }

    #[test]
    fn keep_columns_preserves_shape(t in arb_full_table(), reindex in any::<bool>()) {
        let ncols = t.table.ncols();
        let keep: Vec<usize> = (0..ncols).rev().step_by(2).collect();
        let sub = t.keep_columns(&keep, reindex).unwrap();
        prop_assert_eq!(sub.links.shape().unwrap(), sub.table.shape());
        prop_assert_eq!(sub.table.ncols(), keep.len());
    }

    #[test]
    fn remove_empty_links_only_drops_zero_width(t in arb_full_table()) {
        let before: usize = t.links.flat_iter().map(|c| c.iter().filter(|l| l.end > l.start).count()).sum();
        let cleaned = t.remove_empty_links();
        prop_assert!(cleaned.links.flat_iter().flatten().all(|l| l.end > l.start));
        prop_assert_eq!(cleaned.links.flat_iter().map(Vec::len).sum::<usize>(), before);
    }
}
