use std::time::Duration;

use tracing::{field, Span};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

/// Correlates log lines across one dispatcher tick or one execution
/// attempt. Wraps a `Uuid` rather than the teacher's leaked `&'static
/// str` trick (`common/src/logger/trace_id.rs` in the source this was
/// modeled on) — a plain owned `String` avoids leaking memory per trace.
#[derive(Clone, Debug)]
pub struct TraceId(Uuid);

impl TraceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_str(&self) -> String {
        self.0.as_hyphenated().to_string()
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs the global `tracing` subscriber. `json` selects the
/// machine-readable formatter (production) over the pretty one (local
/// runs); both read the usual `RUST_LOG`-style filter.
pub fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let base = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_span_events(fmt::format::FmtSpan::CLOSE);

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(base.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(base.pretty())
            .init();
    }
}

/// Root span for one dispatcher tick (one "pair changed" event).
pub fn root_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "root",
        name = %name,
        trace_id = %trace_id.as_str(),
        pair = field::Empty,
        cycle_id = field::Empty,
    )
}

/// Child span for work nested under a root span (one cycle evaluation,
/// one execution attempt).
pub fn child_span(name: &'static str) -> Span {
    tracing::info_span!(
        "child",
        name = %name,
        pair = field::Empty,
        cycle_id = field::Empty,
    )
}

/// Records the pair symbol and/or cycle id onto the current span's
/// `pair`/`cycle_id` fields.
pub fn annotate_span(pair: Option<&str>, cycle_id: Option<&str>) {
    let span = Span::current();
    if let Some(pair) = pair {
        span.record("pair", field::display(pair));
    }
    if let Some(cycle_id) = cycle_id {
        span.record("cycle_id", field::display(cycle_id));
    }
}

/// Times `fut` and logs a `performance`-target warning if it overran
/// `max`. Used around depth-consuming evaluator sweeps and exchange
/// adapter calls.
pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let start = std::time::Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}
