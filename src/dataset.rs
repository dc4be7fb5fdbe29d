use crate::error::Result;
use crate::models::DatasetQuote;

const BUNDLED_QUOTES: &str = include_str!("../data/quotes.json");

/// Parse the dataset shipped inside the binary.
pub fn bundled() -> Result<Vec<DatasetQuote>> {
    parse(BUNDLED_QUOTES)
}

pub fn parse(json: &str) -> Result<Vec<DatasetQuote>> {
    let records: Vec<DatasetQuote> = serde_json::from_str(json)?;
    Ok(records)
}

/// Load a dataset from disk, e.g. to seed from a larger export.
pub fn load_file(path: &std::path::Path) -> Result<Vec<DatasetQuote>> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}
