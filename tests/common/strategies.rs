use proptest::prelude::*;

/// Strategy for generating association ids
pub fn association_id_strategy() -> impl Strategy<Value = String> {
    "[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}"
}

/// Strategy for generating requested-id lists, including blank entries
pub fn requested_ids_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            3 => association_id_strategy(),
            1 => Just(String::new()),
        ],
        0..8,
    )
}

/// Strategy for generating error texts that carry none of the default markers
pub fn unrelated_error_strategy() -> impl Strategy<Value = String> {
    "[a-z ]{0,40}".prop_filter("must not contain a known marker", |text| {
        !text.contains("connection reset by peer")
            && !text.contains("use of closed network connection")
            && !text.contains("connection closed before message completed")
            && !text.contains("operation timed out")
    })
}
