use crate::error::FeatureError;
use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum Strand {
    #[strum(to_string = "+")]
    #[serde(rename = "+")]
    Forward,

    #[strum(to_string = "-")]
    #[serde(rename = "-")]
    Reverse,
}

impl Strand {
    pub fn from_str(s: &str) -> Result<Self, FeatureError> {
        match s {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            _ => Err(FeatureError::ValueError(format!("Invalid strand: {}", s))),
        }
    }

    /// GFF column 7. `.` and `?` mean the strand is unknown or irrelevant.
    pub fn from_gff_column(s: &str) -> Result<Option<Self>, FeatureError> {
        match s {
            "." | "?" => Ok(None),
            s => Self::from_str(s).map(Some),
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Strand::Forward => Strand::Reverse,
            Strand::Reverse => Strand::Forward,
        }
    }
}
