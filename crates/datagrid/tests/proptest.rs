//! Property-based tests for the datagrid crate using proptest.

use std::sync::Arc;

use datagrid::column::{resolve_capability, Capability};
use datagrid::filter::{FilterValue, RANGE_DELIMITER};
use datagrid::options::OptionType;
use datagrid::table::{DataSource, Table, TableRequest};
use datagrid::{ColumnOrderer, Options, OptionsSchema, Registry};
use proptest::prelude::*;
use serde_json::{json, Value};

// ============================================================================
// Test helpers
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Slot {
    Default,
    First,
    Last,
}

impl Slot {
    fn to_value(self) -> Value {
        match self {
            Slot::Default => Value::Null,
            Slot::First => json!("first"),
            Slot::Last => json!("last"),
        }
    }
}

fn slot_strategy() -> impl Strategy<Value = Slot> {
    prop_oneof![Just(Slot::Default), Just(Slot::First), Just(Slot::Last)]
}

fn capability_strategy() -> impl Strategy<Value = Capability> {
    prop_oneof![
        Just(Capability::Enabled),
        Just(Capability::Disabled),
        Just(Capability::ServerOnly),
        Just(Capability::ClientOnly),
    ]
}

fn people(n: usize) -> Vec<Value> {
    (0..n).map(|i| json!({"id": i, "name": format!("p{i}")})).collect()
}

fn server_table(rows: Vec<Value>) -> Table {
    let mut table = Table::new(
        "table",
        DataSource::rows(rows),
        Options::new().set("ajax_url", "/people"),
        Arc::new(Registry::new()),
    )
    .unwrap();
    table.add("name", "string", Options::new()).unwrap();
    table
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// Columns without relative directives keep every path: first ones lead
    /// and last ones trail, each group in insertion order.
    #[test]
    fn orderer_groups_first_default_last(slots in prop::collection::vec(slot_strategy(), 0..12)) {
        let paths: Vec<String> = (0..slots.len()).map(|i| format!("c{i}")).collect();
        let positions: Vec<Value> = slots.iter().map(|s| s.to_value()).collect();

        let ordered = ColumnOrderer::new()
            .order(paths.iter().map(String::as_str).zip(positions.iter()))
            .unwrap();

        let group = |want: fn(&Slot) -> bool| -> Vec<String> {
            paths
                .iter()
                .zip(&slots)
                .filter(|(_, slot)| want(slot))
                .map(|(path, _)| path.clone())
                .collect()
        };
        let mut expected = group(|s| matches!(s, Slot::First));
        expected.extend(group(|s| matches!(s, Slot::Default)));
        expected.extend(group(|s| matches!(s, Slot::Last)));
        prop_assert_eq!(ordered, expected);
    }

    /// Ordering an already ordered list without directives changes nothing.
    #[test]
    fn orderer_is_idempotent(slots in prop::collection::vec(slot_strategy(), 0..12)) {
        let paths: Vec<String> = (0..slots.len()).map(|i| format!("c{i}")).collect();
        let positions: Vec<Value> = slots.iter().map(|s| s.to_value()).collect();
        let once = ColumnOrderer::new()
            .order(paths.iter().map(String::as_str).zip(positions.iter()))
            .unwrap();

        let null = Value::Null;
        let twice = ColumnOrderer::new()
            .order(once.iter().map(|p| (p.as_str(), &null)))
            .unwrap();
        prop_assert_eq!(once, twice);
    }

    /// Non-blank input always decodes, and a decoded value re-encodes to
    /// its input.
    #[test]
    fn filter_value_decode_is_lossless(raw in "[a-z0-9|]{1,12}( ?-yadcf_delim- ?[a-z0-9]{0,6})?") {
        let value = FilterValue::decode(&raw).unwrap();
        prop_assert_eq!(value.to_string(), raw.clone());
        prop_assert_eq!(matches!(value, FilterValue::Range(_)), raw.contains(RANGE_DELIMITER));
    }

    /// Blank input never yields a filter value.
    #[test]
    fn blank_filter_input_is_ignored(raw in "[ \t]{0,6}") {
        prop_assert!(FilterValue::decode(&raw).is_none());
    }

    /// A range is empty exactly when every bound is empty.
    #[test]
    fn range_emptiness(from in "[0-9]{0,3}", to in "[0-9]{0,3}") {
        let value = FilterValue::from((from.as_str(), to.as_str()));
        prop_assert_eq!(value.is_empty(), from.is_empty() && to.is_empty());
    }

    /// Capabilities survive the option round trip, and downgrading on a
    /// client-side table never enables server execution.
    #[test]
    fn capability_resolution(capability in capability_strategy(), server_side in any::<bool>()) {
        let value = capability.to_value();
        prop_assert_eq!(Capability::from_value(&value), capability);
        prop_assert_eq!(resolve_capability(&value, server_side), capability.resolve(server_side));

        let downgraded = capability.downgrade(server_side);
        if !server_side {
            prop_assert!(!downgraded.resolve(true) || capability == Capability::ServerOnly);
            prop_assert_eq!(downgraded.resolve(false), capability.resolve(false));
        } else {
            prop_assert_eq!(downgraded, capability);
        }
    }

    /// Values of an allowed type resolve unchanged; any other option name
    /// is rejected.
    #[test]
    fn resolution_accepts_declared_values(label in "[a-zA-Z ]{0,16}", size in any::<i64>(), unknown in "[a-z]{1,8}") {
        let mut schema = OptionsSchema::new();
        schema
            .set_default("label", "")
            .set_allowed_types("label", &[OptionType::String])
            .set_default("size", 0)
            .set_allowed_types("size", &[OptionType::Int]);

        let resolved = schema
            .resolve(Options::new().set("label", label.as_str()).set("size", size))
            .unwrap();
        prop_assert_eq!(resolved.str("label"), Some(label.as_str()));
        prop_assert_eq!(resolved.i64("size"), Some(size));

        prop_assume!(unknown != "label" && unknown != "size");
        prop_assert!(schema.resolve(Options::new().set(unknown.as_str(), 1)).is_err());
    }

    /// Numbers parse whether they arrive as JSON numbers or as strings.
    #[test]
    fn request_numbers_are_lenient(draw in 0i64..10_000, start in 0usize..10_000, length in -1i64..500) {
        let from_strings = TableRequest::from_value(&json!({
            "draw": draw.to_string(),
            "start": start.to_string(),
            "length": length.to_string(),
        }));
        let from_numbers = TableRequest::from_value(&json!({"draw": draw, "start": start, "length": length}));
        prop_assert_eq!(&from_strings, &from_numbers);
        prop_assert_eq!(from_strings.draw, draw);
        prop_assert_eq!(from_strings.start, start);
        prop_assert_eq!(from_strings.length, length);
    }

    /// A page holds at most `length` rows starting at the page boundary
    /// below `start`; a negative length returns every row.
    #[test]
    fn server_paging(n in 0usize..30, start in 0usize..40, length in -1i64..12) {
        let mut table = server_table(people(n));
        table.handle_request(TableRequest::from_value(&json!({
            "draw": 1,
            "start": start,
            "length": length,
            "columns": [{"name": "name", "searchable": true, "orderable": true}],
        })));
        let data = table.create_json_data(None).unwrap();

        let expected = match usize::try_from(length) {
            Err(_) => n,
            Ok(0) => 0,
            Ok(length) => length.min(n.saturating_sub(start / length * length)),
        };
        prop_assert_eq!(data["data"].as_array().map(Vec::len), Some(expected));
        prop_assert_eq!(&data["recordsTotal"], &json!(n));
        prop_assert_eq!(&data["recordsFiltered"], &json!(n));
    }
}
