use proptest::prelude::*;
use sqltally::prelude::*;
use sqltally::classify;

fn statement() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<String>(),
        "(select|insert into|update|delete from|set|commit)[ a-z0-9_().,'=?]{0,60}",
        "select nextval\\('[a-z_]{1,12}'\\)",
    ]
}

proptest! {
    #[test]
    fn inspect_returns_input_unchanged(sql in statement()) {
        let db = DbAssertions::new();
        let collector = db.collector();
        prop_assert_eq!(collector.inspect(&sql), sql.as_str());
    }

    #[test]
    fn recorded_iff_classified(statements in prop::collection::vec(statement(), 0..20)) {
        let db = DbAssertions::new();
        let collector = db.collector();
        for sql in &statements {
            collector.inspect(sql);
        }
        let classified = statements.iter().filter(|sql| classify(sql).is_some()).count() as u64;
        prop_assert_eq!(db.statistics().total(), classified);
    }

    #[test]
    fn disabled_collector_records_nothing(statements in prop::collection::vec(statement(), 0..20)) {
        let db = DbAssertions::with_config(InspectorConfig::new().enabled(false));
        let collector = db.collector();
        for sql in &statements {
            prop_assert_eq!(collector.inspect(sql), sql.as_str());
        }
        prop_assert!(db.statistics().is_empty());
    }
}
