use metrics::describe_counter;

pub const CYCLES_TOTAL: &str = "monitor_cycles_total";
pub const COLLECTION_FAILURES_TOTAL: &str = "monitor_collection_failures_total";
pub const VIOLATIONS_FIRED_TOTAL: &str = "monitor_violations_fired_total";
pub const VIOLATIONS_DROPPED_TOTAL: &str = "monitor_violations_dropped_total";
pub const DISPATCH_FAILURES_TOTAL: &str = "monitor_dispatch_failures_total";

/// Register descriptions for every counter the runtime emits. Call once
/// after a recorder is installed.
pub fn describe_metrics() {
    describe_counter!(CYCLES_TOTAL, "Completed collection cycles per source");
    describe_counter!(
        COLLECTION_FAILURES_TOTAL,
        "Collection attempts that failed or timed out"
    );
    describe_counter!(VIOLATIONS_FIRED_TOTAL, "Rules that fired");
    describe_counter!(
        VIOLATIONS_DROPPED_TOTAL,
        "Violations dropped because the export queue was full"
    );
    describe_counter!(
        DISPATCH_FAILURES_TOTAL,
        "Failed deliveries per destination"
    );
}
