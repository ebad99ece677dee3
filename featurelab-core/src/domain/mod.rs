//! Domain types for featurelab

pub mod bar;
pub mod calendar;
pub mod panel;
pub mod raw;
pub mod series;

pub use bar::{Bar, BarSeries};
pub use calendar::TradingCalendar;
pub use panel::PanelColumn;
pub use raw::{RawFrame, RawValue};
pub use series::{AlignedSeries, ExternalSeries, Observation};
