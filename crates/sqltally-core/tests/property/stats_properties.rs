use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use sqltally_core::{CountQuery, OperationKind, StatementShape, StatementStatistics, classify};

fn kind() -> impl Strategy<Value = OperationKind> {
    prop_oneof![
        Just(OperationKind::Select),
        Just(OperationKind::Insert),
        Just(OperationKind::Update),
        Just(OperationKind::Delete),
        Just(OperationKind::Sequence),
    ]
}

fn table_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,11}"
}

fn shape() -> impl Strategy<Value = StatementShape> {
    (kind(), table_name(), prop::collection::vec(table_name(), 0..3)).prop_map(|(kind, table, joins)| {
        if kind == OperationKind::Select {
            StatementShape::with_joins(kind, table, joins)
        } else {
            StatementShape::new(kind, table)
        }
    })
}

fn strict_peek(shape: &StatementShape) -> CountQuery {
    CountQuery::new(shape.kind(), Some(shape.table()))
        .joins(shape.joins())
        .peek()
}

proptest! {
    #[test]
    fn n_records_count_n(shape in shape(), n in 0u64..50) {
        let stats = StatementStatistics::new();
        for _ in 0..n {
            stats.record(shape.clone());
        }
        prop_assert_eq!(stats.count(&strict_peek(&shape)), n);
    }

    #[test]
    fn consuming_read_then_identical_read_is_zero(shapes in prop::collection::vec(shape(), 1..20), pick in any::<prop::sample::Index>()) {
        let stats = StatementStatistics::new();
        for s in &shapes {
            stats.record(s.clone());
        }
        let target = pick.get(&shapes);
        let query = CountQuery::new(target.kind(), Some(target.table())).joins(target.joins());
        let first = stats.count(&query);
        prop_assert!(first >= 1);
        prop_assert_eq!(stats.count(&query), 0);
    }

    #[test]
    fn lenient_is_sum_of_strict_variants(
        table in table_name(),
        variants in prop::collection::vec((prop::collection::vec(table_name(), 0..3), 1u64..5), 1..6),
    ) {
        let stats = StatementStatistics::new();
        let mut shapes = Vec::new();
        for (joins, times) in &variants {
            let shape = StatementShape::with_joins(OperationKind::Select, &table, joins);
            for _ in 0..*times {
                stats.record(shape.clone());
            }
            if !shapes.contains(&shape) {
                shapes.push(shape);
            }
        }

        let lenient = stats.count(&CountQuery::select(&table).lenient().peek());
        let strict_sum: u64 = shapes.iter().map(|s| stats.count(&strict_peek(s))).sum();
        prop_assert_eq!(lenient, strict_sum);
        for s in &shapes {
            prop_assert!(lenient >= stats.count(&strict_peek(s)));
        }
    }

    #[test]
    fn classify_is_idempotent(sql in "(select|SELECT|insert|INSERT|update|Update|delete|set)[ a-zA-Z0-9_().,'=*?]{0,60}") {
        prop_assert_eq!(classify(&sql), classify(&sql));
    }

    #[test]
    fn classified_dml_table_roundtrips(table in table_name()) {
        let insert = classify(&format!("insert into {table} (id) values (?)"));
        prop_assert_eq!(insert, Some(StatementShape::new(OperationKind::Insert, &table)));
        let seq = classify(&format!("select nextval('{table}')"));
        prop_assert_eq!(seq, Some(StatementShape::new(OperationKind::Sequence, &table)));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn concurrent_records_are_not_lost(threads in 1u64..8, per_thread in 1u64..400) {
        let stats = Arc::new(StatementStatistics::new());
        let shape = StatementShape::new(OperationKind::Update, "version_identity_posts");

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let stats = Arc::clone(&stats);
                let shape = shape.clone();
                thread::spawn(move || {
                    for _ in 0..per_thread {
                        stats.record(shape.clone());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        prop_assert_eq!(stats.count(&strict_peek(&shape)), threads * per_thread);
    }
}
