//! Data ingestion, cleaning, alignment and persistence

pub mod align;
pub mod clean;
pub mod csv_import;
pub mod fred;
pub mod macro_panel;
pub mod provider;
pub mod store;
pub mod synthetic;
pub mod yahoo;

pub use align::{AlignMode, CalendarAligner};
pub use clean::{AnomalyReport, AnomalyType, CleanError, CleanReport, CoercionError, DataCleaner, Severity};
pub use csv_import::{CsvBarProvider, CsvSeriesProvider, DateColumns};
pub use fred::FredProvider;
pub use macro_panel::{MacroPanel, MacroPanelBuilder, PanelError};
pub use provider::{
    FetchProgress, MacroDataProvider, MarketDataProvider, NoProgress, ProviderError,
    StdoutProgress,
};
pub use store::{
    writer_for, CsvWriter, OutputFormat, OutputLayout, ParquetWriter, PersistenceWriter,
    WriteError,
};
pub use synthetic::{synthetic_bars, SyntheticProvider};
pub use yahoo::YahooProvider;
