//! Tracing hooks that vanish without the `tracing` feature.
//!
//! Spans, all at info level:
//!
//! - `resize`: one [`crate::Session::resize_to`] request, with the requested size.
//! - `carve`: one [`crate::SeamCarver::ensure_depth`] run, from and to depth.
//! - `cost_table`: one minimal-seam search over the visible grid.
//! - `buffer_for_size` and `inflate`: materialising sizes of a multi-size image.
//!
//! Events: `carved` and `carve_stopped` after a run, `enlargement_round` per
//! insertion round, `inflated`, and `resize_cancelled` when a request is
//! interrupted.

/// Opens an info-level span.
///
/// Expands to `tracing::info_span!` with the feature enabled, and to a
/// [`NoopSpan`] otherwise so call sites can always write
/// `let _span = trace_span!(...).entered();`.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::NoopSpan
    };
}

/// Emits an info-level event with key/value fields.
///
/// Without the feature the field expressions are still evaluated so that
/// values computed only for logging do not trigger unused warnings.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(name: $name, $($key = $value),+)
    };
    ($name:expr) => {
        tracing::info!(name: $name)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
    ($name:expr) => {};
}

pub(crate) use trace_event;
pub(crate) use trace_span;

/// Stand-in span guard when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub(crate) struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    /// Mirrors `Span::entered`.
    #[inline]
    pub(crate) fn entered(self) -> Self {
        self
    }
}
