use proptest::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;

use jsts::analyzers::aggregate::median;
use jsts::analyzers::metrics::{FileRecord, Metric};
use jsts::analyzers::tree_metrics;
use jsts::core::Language;
use jsts::parser::Parser;
use jsts::score::{calc_rank, normalized_rank, score_record, Distribution, ReferenceDataset};

fn sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    values
}

// ---------------------------------------------------------------------------
// Rank property tests
// ---------------------------------------------------------------------------

proptest! {
    /// The rank is a position in the distribution, so it never exceeds its length.
    #[test]
    fn calc_rank_bounded(
        values in prop::collection::vec(0u32..100, 0..50),
        v in 0u32..120,
    ) {
        let r = sorted(values.into_iter().map(f64::from).collect());
        let rank = calc_rank(&r, f64::from(v));
        prop_assert!(rank <= r.len(), "rank {} exceeds length {}", rank, r.len());
    }

    /// A larger value never gets a smaller rank.
    #[test]
    fn calc_rank_monotone(
        values in prop::collection::vec(0u32..100, 1..50),
        a in 0u32..120,
        b in 0u32..120,
    ) {
        let r = sorted(values.into_iter().map(f64::from).collect());
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(calc_rank(&r, f64::from(lo)) <= calc_rank(&r, f64::from(hi)));
    }

    /// An exact match ranks at its first index plus one.
    #[test]
    fn calc_rank_exact_match(
        values in prop::collection::vec(0u32..20, 1..50),
        pick in any::<prop::sample::Index>(),
    ) {
        let r = sorted(values.into_iter().map(f64::from).collect());
        let v = r[pick.index(r.len())];
        let first = r.iter().position(|x| *x == v).unwrap();
        prop_assert_eq!(calc_rank(&r, v), first + 1);
    }

    /// Normalized ranks are percentages.
    #[test]
    fn normalized_rank_bounded(
        values in prop::collection::vec(0u32..100, 0..50),
        v in 0u32..120,
    ) {
        let r = sorted(values.into_iter().map(f64::from).collect());
        let rank = normalized_rank(&r, f64::from(v));
        prop_assert!((0.0..=100.0).contains(&rank));
    }

    /// The accumulated rank is a mean of percentages and the score mirrors it.
    #[test]
    fn accumulated_rank_bounded(
        loc in 0u32..60,
        cc in 0u32..60,
        depth in 0u32..60,
    ) {
        let dense: Vec<f64> = (0..50).map(f64::from).collect();
        let mut values = BTreeMap::new();
        for key in ["locM", "ccM", "dpM"] {
            values.insert(key.to_string(), Distribution::Flat(dense.clone()));
        }
        let dataset = ReferenceDataset::new(
            vec!["locM".into(), "ccM".into(), "dpM".into()],
            values,
            vec![10.0, 20.0, 90.0],
        ).unwrap();

        let mut record = FileRecord::new("/p/a.js");
        record.set_scalar(Metric::LocM, f64::from(loc));
        record.set_scalar(Metric::CcM, f64::from(cc));
        record.set_scalar(Metric::DpM, f64::from(depth));

        let score = score_record(&record, &dataset).unwrap();
        prop_assert!((0.0..=100.0).contains(&score.accumulated_rank));
        prop_assert!((score.score - (100.0 - score.accumulated_rank)).abs() < 1e-9);
        prop_assert!(score.rank <= 3);
    }

    /// The median lies between the smallest and the largest value and does
    /// not depend on order.
    #[test]
    fn median_within_bounds(values in prop::collection::vec(-1000i32..1000, 1..40)) {
        let values: Vec<f64> = values.into_iter().map(f64::from).collect();
        let m = median(&values).unwrap();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(min <= m && m <= max);

        let mut reversed = values.clone();
        reversed.reverse();
        prop_assert_eq!(median(&reversed), Some(m));
    }

    /// Each nested block adds one to the depth.
    #[test]
    fn depth_counts_nested_blocks(n in 0usize..12) {
        let mut code = String::new();
        for i in 0..n {
            code.push_str(&format!("if (x{i}) {{\n"));
        }
        code.push_str("run();\n");
        code.push_str(&"}\n".repeat(n));

        let parsed = Parser::new()
            .parse_with_language(code.as_bytes(), Language::JavaScript, Path::new("t.js"))
            .unwrap();
        prop_assert_eq!(tree_metrics::depth(parsed.root_node()), n);
    }
}

// ---------------------------------------------------------------------------
// Deterministic edge cases
// ---------------------------------------------------------------------------

#[test]
fn median_examples() {
    assert_eq!(median(&[]), None);
    assert_eq!(median(&[1.0, 2.0, 3.0]), Some(2.0));
    assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
}

#[test]
fn depth_of_file_without_blocks_is_zero() {
    let parsed = Parser::new()
        .parse_with_language(b"const a = 1;\nrun(a);\n", Language::JavaScript, Path::new("t.js"))
        .unwrap();
    assert_eq!(tree_metrics::depth(parsed.root_node()), 0);
}
