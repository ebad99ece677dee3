//! Provider construction from config.

use featurelab_core::data::{
    CsvBarProvider, CsvSeriesProvider, DateColumns, FredProvider, MacroDataProvider,
    MarketDataProvider, ProviderError, SyntheticProvider, YahooProvider,
};

use crate::config::{AssetSourceConfig, MacroSourceConfig};

pub fn market_provider(
    source: &AssetSourceConfig,
) -> Result<Box<dyn MarketDataProvider>, ProviderError> {
    let provider: Box<dyn MarketDataProvider> = match source {
        AssetSourceConfig::Csv { dir } => Box::new(CsvBarProvider::new(dir.clone())),
        AssetSourceConfig::Yahoo => Box::new(YahooProvider::new()?),
        AssetSourceConfig::Synthetic => Box::new(SyntheticProvider::new()),
    };
    Ok(provider)
}

pub fn macro_provider(
    source: &MacroSourceConfig,
) -> Result<Box<dyn MacroDataProvider>, ProviderError> {
    let provider: Box<dyn MacroDataProvider> = match source {
        MacroSourceConfig::Yahoo { .. } => Box::new(YahooProvider::new()?),
        MacroSourceConfig::Fred { .. } => Box::new(FredProvider::new()?),
        MacroSourceConfig::Csv {
            path,
            date_column,
            value_column,
        } => Box::new(CsvSeriesProvider::new(
            path.clone(),
            DateColumns::Single(date_column.clone()),
            value_column.clone(),
        )),
        MacroSourceConfig::CsvYearMonth {
            path,
            year_column,
            month_column,
            value_column,
        } => Box::new(CsvSeriesProvider::new(
            path.clone(),
            DateColumns::YearMonth {
                year: year_column.clone(),
                month: month_column.clone(),
            },
            value_column.clone(),
        )),
        MacroSourceConfig::Synthetic => Box::new(SyntheticProvider::new()),
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn provider_names_follow_source() {
        let csv = market_provider(&AssetSourceConfig::Csv {
            dir: PathBuf::from("data"),
        })
        .unwrap();
        assert_eq!(csv.name(), "csv");
        assert_eq!(
            market_provider(&AssetSourceConfig::Synthetic).unwrap().name(),
            "synthetic"
        );
        assert_eq!(
            macro_provider(&MacroSourceConfig::Fred { id: "GS10".into() })
                .unwrap()
                .name(),
            "fred"
        );
        assert_eq!(
            macro_provider(&MacroSourceConfig::CsvYearMonth {
                path: PathBuf::from("gepu.csv"),
                year_column: "Year".into(),
                month_column: "Month".into(),
                value_column: "GEPU_current".into(),
            })
            .unwrap()
            .name(),
            "csv"
        );
    }
}
