//! Header names of the inventory export.

pub const RFID_DATESTAMP: &str = "RFIDDatestamp";
pub const UID: &str = "UID";
pub const CATEGORY: &str = "category";
pub const MODE: &str = "Mode";
/// Spelled as in the export sheet
pub const HISTORICAL_DATES: &str = "HistorialDates";
pub const FORECAST_DATES: &str = "ForecastDates";

pub fn stock_level(category: u8) -> String {
    format!("StockLevel_Cat{}", category)
}

pub fn historical_data(category: u8) -> String {
    format!("HistoricalDataCat{}", category)
}

pub fn forecast_data(category: u8) -> String {
    format!("ForecastDataCat{}", category)
}

/// Every header the parser reads for the given category layout
pub fn required(tracked_category_count: u8, consumption_categories: &[u8]) -> Vec<String> {
    let mut names: Vec<String> = [RFID_DATESTAMP, UID, CATEGORY, MODE]
        .iter()
        .map(|s| s.to_string())
        .collect();
    names.extend((1..=tracked_category_count).map(stock_level));
    names.push(HISTORICAL_DATES.to_string());
    names.push(FORECAST_DATES.to_string());
    names.extend(consumption_categories.iter().copied().map(historical_data));
    names.extend(consumption_categories.iter().copied().map(forecast_data));
    names
}
