//! Optional metrics instrumentation for lgtail.
//!
//! When the `observe` feature is enabled, the traversal engine emits counters
//! and histograms via the [`metrics`] crate. A downstream application must
//! install a metrics recorder (e.g. `metrics-exporter-prometheus`) to collect
//! the data.
//!
//! When the feature is **not** enabled every function in this module is a
//! zero-cost no-op.

/// Record an item handed to the caller.
///
/// - `lgtail.items_read_total` – counter
#[inline]
pub fn record_item() {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("lgtail.items_read_total").increment(1);
    }
}

/// Record the active part reader being replaced by a newer file.
///
/// - `lgtail.part_switches_total` – counter
#[inline]
pub fn record_part_switch() {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("lgtail.part_switches_total").increment(1);
    }
}

/// Record a part file that could not be opened or decoded.
///
/// - `lgtail.part_errors_total` – counter with `policy` label (`skip` / `surface`)
#[inline]
pub fn record_part_error(surfaced: bool) {
    #[cfg(feature = "observe")]
    {
        let policy = if surfaced { "surface" } else { "skip" };
        metrics::counter!("lgtail.part_errors_total", "policy" => policy).increment(1);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = surfaced;
    }
}

/// Record the end of a live-mode wait.
///
/// - `lgtail.poll_waits_total` – counter with `woken_by` label (`timeout` / `hint` / `cancel`)
#[inline]
pub fn record_poll_wait(woken_by: &'static str) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("lgtail.poll_waits_total", "woken_by" => woken_by).increment(1);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = woken_by;
    }
}

/// Record a directory scan.
///
/// - `lgtail.scan_duration_seconds` – histogram
#[inline]
pub fn record_scan(duration: std::time::Duration) {
    #[cfg(feature = "observe")]
    {
        metrics::histogram!("lgtail.scan_duration_seconds").record(duration.as_secs_f64());
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = duration;
    }
}
