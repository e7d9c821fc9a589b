use crate::{intervals::GenomeInterval, strand::Strand};
use indexmap::IndexMap;
use crate::error::FeatureError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::RangeInclusive;

/// Free-form GFF attributes (column 9), in file order.
pub type Attributes = IndexMap<String, String>;

/// Attributes searched, in order, for a transcript identifier.
pub const TRANSCRIPT_LOOKUP_ATTRIBUTES: [&str; 4] = ["transcript_id", "ID", "Name", "id"];

/// One GFF feature as handed over by a GFF reader.
///
/// Any other top-level key (`type`, `source`, `score`, ...) is kept as is. Child
/// records (transcripts) are lists under their feature type label, e.g. `mRNA`,
/// `transcript` or `RNA`, in any casing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GffFeature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gene_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chromosome: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strand: Option<Strand>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembly_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl GffFeature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gene_id(mut self, gene_id: &str) -> Self {
        self.gene_id = Some(gene_id.to_string());
        self
    }

    pub fn with_location(mut self, start: u64, end: u64, strand: Option<Strand>) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self.strand = strand;
        self
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes
            .get_or_insert_with(Attributes::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_child(
        mut self,
        feature_type: &str,
        child: GffFeature,
    ) -> Result<Self, FeatureError> {
        self.add_child(feature_type, child)?;
        Ok(self)
    }

    /// Append `child` to the list under `feature_type`. A non-list value already
    /// stored under that key is replaced.
    pub fn add_child(
        &mut self,
        feature_type: &str,
        child: GffFeature,
    ) -> Result<(), FeatureError> {
        let child = serde_json::to_value(child)?;
        let entry = self
            .extra
            .entry(feature_type.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        match entry {
            Value::Array(children) => children.push(child),
            other => *other = Value::Array(vec![child]),
        }
        Ok(())
    }

    /// Child records for `feature_type`. The exact label wins over its lowercase
    /// form, which wins over its uppercase form.
    pub fn children_of_type(
        &self,
        feature_type: &str,
    ) -> Result<Vec<GffFeature>, FeatureError> {
        let children = [
            feature_type.to_string(),
            feature_type.to_lowercase(),
            feature_type.to_uppercase(),
        ]
        .iter()
        .find_map(|label| self.extra.get(label));

        match children {
            Some(children) => Ok(Vec::<GffFeature>::deserialize(children)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .as_ref()
            .and_then(|attributes| attributes.get(key))
            .map(|value| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript {
    pub transcript_id: Option<String>,

    pub gene_id: String,

    pub start: u64,
    pub end: u64,
    pub strand: Option<Strand>,

    pub attributes: Attributes,
}

impl GenomeInterval for Transcript {
    fn start(&self) -> u64 {
        self.start
    }

    fn end(&self) -> u64 {
        self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gene {
    pub gene_id: String,

    /// Identifier of the owning chromosome.
    pub chromosome_id: String,

    pub start: u64,
    pub end: u64,
    pub strand: Option<Strand>,

    pub assembly_name: Option<String>,

    pub attributes: Attributes,

    transcripts: Vec<Transcript>,
}

impl GenomeInterval for Gene {
    fn start(&self) -> u64 {
        self.start
    }

    fn end(&self) -> u64 {
        self.end
    }
}

impl Gene {
    pub fn new(
        gene_id: String,
        chromosome_id: String,
        start: u64,
        end: u64,
        strand: Option<Strand>,
        assembly_name: Option<String>,
        attributes: Attributes,
    ) -> Self {
        Self {
            gene_id,
            chromosome_id,
            start,
            end,
            strand,
            assembly_name,
            attributes,
            transcripts: Vec::new(),
        }
    }

    /// Attach a transcript record. Missing coordinates and strand fall back to the gene's.
    pub fn add_transcript(&mut self, record: &GffFeature) -> &Transcript {
        let attributes = record.attributes.clone().unwrap_or_default();
        let transcript_id = TRANSCRIPT_LOOKUP_ATTRIBUTES
            .iter()
            .find_map(|key| attributes.get(*key).filter(|v| !v.trim_end().is_empty()))
            .cloned();

        self.transcripts.push(Transcript {
            transcript_id,
            gene_id: self.gene_id.clone(),
            start: record.start.unwrap_or(self.start),
            end: record.end.unwrap_or(self.end),
            strand: record.strand.or(self.strand),
            attributes,
        });

        &self.transcripts[self.transcripts.len() - 1]
    }

    pub fn transcripts(&self) -> &[Transcript] {
        &self.transcripts
    }

    pub fn get_transcript(&self, transcript_id: &str) -> Option<&Transcript> {
        self.transcripts
            .iter()
            .find(|t| t.transcript_id.as_deref() == Some(transcript_id))
    }

    /// Attribute lookup. `gene_id` resolves to the gene identifier.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        if key == "gene_id" {
            return Some(&self.gene_id);
        }
        self.attributes.get(key).map(|value| value.as_str())
    }

    pub fn location(&self) -> RangeInclusive<u64> {
        self.start..=self.end
    }
}
