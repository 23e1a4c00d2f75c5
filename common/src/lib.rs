//! Ambient stack shared by every crate in the workspace: tracing setup
//! and the span-annotation helpers used to correlate log lines across a
//! single evaluation or execution attempt.

pub mod logger;

pub use logger::{annotate_span, child_span, init_tracing, root_span, warn_if_slow, TraceId};
