//! FeatureLab Core: market-data cleaning, technical indicators, calendar
//! alignment and macro panel assembly.
//!
//! - Domain types (bars, raw frames, external series, calendars, panel columns)
//! - `DataCleaner`: loosely-typed provider rows in, validated `BarSeries` out
//! - `IndicatorEngine`: SMA, EMA, MACD, RSI, ROC, Bollinger width, ATR, OBV
//! - `CalendarAligner` and `MacroPanelBuilder` for mixed-frequency macro data
//! - Providers (CSV, Yahoo, FRED, synthetic) and CSV/Parquet writers

pub mod data;
pub mod domain;
pub mod indicators;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything the runner fans out across rayon
    /// workers is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::BarSeries>();
        require_sync::<domain::BarSeries>();
        require_send::<domain::ExternalSeries>();
        require_sync::<domain::ExternalSeries>();
        require_send::<domain::TradingCalendar>();
        require_sync::<domain::TradingCalendar>();
        require_send::<domain::RawFrame>();
        require_sync::<domain::RawFrame>();

        require_send::<indicators::IndicatorEngine>();
        require_sync::<indicators::IndicatorEngine>();
        require_send::<indicators::IndicatorPanel>();
        require_sync::<indicators::IndicatorPanel>();

        require_send::<data::MacroPanel>();
        require_sync::<data::MacroPanel>();
        require_send::<data::CleanReport>();
        require_sync::<data::CleanReport>();
    }

    /// Trait objects used by the runner must be constructible.
    #[test]
    fn provider_traits_are_object_safe() {
        fn _market(_: &dyn data::MarketDataProvider) {}
        fn _macro(_: &dyn data::MacroDataProvider) {}
        fn _writer(_: &dyn data::PersistenceWriter) {}
        fn _indicator(_: &dyn indicators::Indicator) {}
    }
}
