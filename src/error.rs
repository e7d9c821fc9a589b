use thiserror::Error;

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum FeatureError {
    #[error("CLI error: {0}")]
    CliError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Parsing error: {0}")]
    ParsingError(String),

    #[error("Value error: {0}")]
    ValueError(String),

    /// No lookup attribute yielded a gene identifier. Holds a dump of the record.
    #[error("gene_id not found in given GFF feature: {0}")]
    MissingGeneId(String),

    #[error("No nucleic sequence attached to chromosome {0}")]
    MissingSequence(String),

    #[error("Invalid sequence range: [{start}, {end})")]
    InvalidRange { start: u64, end: u64 },
}

impl From<std::io::Error> for FeatureError {
    fn from(e: std::io::Error) -> Self {
        FeatureError::IOError(e.to_string())
    }
}

impl From<csv::Error> for FeatureError {
    fn from(e: csv::Error) -> Self {
        FeatureError::ParsingError(e.to_string())
    }
}

impl From<std::num::ParseIntError> for FeatureError {
    fn from(e: std::num::ParseIntError) -> Self {
        FeatureError::ParsingError(e.to_string())
    }
}

impl From<serde_json::Error> for FeatureError {
    fn from(e: serde_json::Error) -> Self {
        FeatureError::ParsingError(e.to_string())
    }
}
