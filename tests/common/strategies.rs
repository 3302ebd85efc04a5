use proptest::prelude::*;

/// Member totals, including the empty case
pub fn total_strategy() -> impl Strategy<Value = i64> {
    prop_oneof![Just(0i64), 1i64..=5_000]
}

/// Positive batch sizes, biased toward the default of 10
pub fn batch_size_strategy() -> impl Strategy<Value = i64> {
    prop_oneof![Just(10i64), 1i64..=250]
}

/// Grouping or group names as stored in the settings table
pub fn segment_name_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 _-]{0,30}"
}
