//! Engine configuration (spec.md 6.1 `context` options, realized as
//! `EngineOptions`) and the external collaborator traits (spec.md 6.3) the
//! host application implements.

use crate::currency::FxSnapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateDisplayFormat {
    Iso,
    Locale,
}

impl Default for DateDisplayFormat {
    fn default() -> Self {
        DateDisplayFormat::Iso
    }
}

/// `EngineOptions` is the Rust realization of spec.md 6.1's enumerated
/// context options; defaults match the documented ones exactly.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub decimal_places: u32,
    pub group_thousands: bool,
    pub scientific_upper_threshold: f64,
    pub scientific_lower_threshold: f64,
    pub date_locale: Option<String>,
    pub date_display_format: DateDisplayFormat,
    pub list_max_length: usize,
    pub fx_snapshot: Option<FxSnapshot>,
    /// Hard guard on `solve`/user-function recursion depth (spec.md 4.9/5).
    pub recursion_limit: usize,
    /// Hard guard on numeric range materialization (spec.md 5).
    pub range_max_length: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            decimal_places: 6,
            group_thousands: false,
            scientific_upper_threshold: 1e12,
            scientific_lower_threshold: 1e-4,
            date_locale: None,
            date_display_format: DateDisplayFormat::Iso,
            list_max_length: 100,
            fx_snapshot: None,
            recursion_limit: 64,
            range_max_length: 10_000,
        }
    }
}

/// External FX-rate fetcher collaborator (spec.md 1, 6.3): the engine never
/// performs network I/O, it only reads a cached snapshot handed in through
/// `EngineOptions::fx_snapshot`. This trait exists for hosts that want to
/// swap the snapshot source without touching `EngineOptions` directly.
pub trait FxRateSource {
    fn rate(&self, from: &str, to: &str) -> Option<f64>;
}

impl FxRateSource for FxSnapshot {
    fn rate(&self, from: &str, to: &str) -> Option<f64> {
        self.convert(1.0, from, to)
    }
}

/// Thin passthrough matching `RenderNode::PlotView` (spec.md 6.2); the core
/// engine never renders plots, it only emits the render node for a host
/// implementing this trait to interpret.
pub trait PlotSink {
    fn plot(&self, expression: &str, target_line: usize);
}
