use crate::{
    error::FeatureError,
    feature::{Attributes, GffFeature},
    strand::Strand,
};
use csv::{ReaderBuilder, StringRecord};
use indexmap::IndexMap;
use std::io::Read;
use std::path::Path;

/// Feature types that become genes.
pub const GENE_FEATURE_TYPES: [&str; 3] = ["gene", "ncRNA_gene", "pseudogene"];

/// One data line of a GFF3 (or GTF) file. Coordinates are 1-based, inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GffRow {
    pub seqid: String,
    pub source: String,
    pub feature_type: String,
    pub start: u64,
    pub end: u64,
    pub strand: Option<Strand>,
    pub attributes: Attributes,
}

impl GffRow {
    pub fn from_record(record: &StringRecord) -> Result<Self, FeatureError> {
        if record.len() != 9 {
            return Err(FeatureError::ParsingError(format!(
                "GFF line must have 9 fields, found {}: {:?}",
                record.len(),
                record
            )));
        }

        Ok(Self {
            seqid: record[0].to_string(),
            source: record[1].to_string(),
            feature_type: record[2].to_string(),
            start: record[3].parse::<u64>()?,
            end: record[4].parse::<u64>()?,
            strand: Strand::from_gff_column(&record[6])?,
            attributes: parse_attributes(&record[8])?,
        })
    }

    fn is_gene(&self) -> bool {
        GENE_FEATURE_TYPES.contains(&self.feature_type.as_str())
    }

    /// Label the row is filed under on its parent gene, if it is a transcript.
    fn transcript_label(&self) -> Option<&'static str> {
        match self.feature_type.as_str() {
            "mRNA" => Some("mRNA"),
            "transcript" => Some("transcript"),
            t if t.ends_with("RNA") => Some("RNA"),
            _ => None,
        }
    }

    /// Gene identifiers this row belongs to: `Parent` in GFF3, `gene_id` in GTF.
    fn parents(&self) -> Vec<&str> {
        match self.attributes.get("Parent") {
            Some(parents) => parents.split(',').collect(),
            None => self
                .attributes
                .get("gene_id")
                .map(|id| vec![id.as_str()])
                .unwrap_or_default(),
        }
    }

    fn gene_key(&self) -> Option<&str> {
        self.attributes
            .get("ID")
            .or_else(|| self.attributes.get("gene_id"))
            .map(|id| id.as_str())
    }

    fn into_feature(self) -> GffFeature {
        GffFeature {
            chromosome: Some(self.seqid),
            start: Some(self.start),
            end: Some(self.end),
            strand: self.strand,
            attributes: Some(self.attributes),
            ..GffFeature::default()
        }
    }
}

/// Column 9. GFF3 `key=value` pairs, percent-decoded, or GTF `key "value"` pairs.
pub fn parse_attributes(column: &str) -> Result<Attributes, FeatureError> {
    let mut attributes = Attributes::new();

    for pair in column.split(';') {
        let pair = pair.trim();
        if pair.is_empty() || pair == "." {
            continue;
        }

        // GTF when the key ends at a space, as in `note "a=b"`.
        let (key, value) = match (pair.find(' '), pair.find('=')) {
            (Some(space), Some(equals)) if equals < space => gff3_pair(pair, equals)?,
            (Some(space), _) => gtf_pair(pair, space),
            (None, Some(equals)) => gff3_pair(pair, equals)?,
            (None, None) => {
                return Err(FeatureError::ParsingError(format!(
                    "Invalid GFF attribute: {}",
                    pair
                )))
            }
        };

        attributes.insert(key, value);
    }

    Ok(attributes)
}

fn gff3_pair(pair: &str, equals: usize) -> Result<(String, String), FeatureError> {
    let value = urlencoding::decode(pair[equals + 1..].trim())
        .map_err(|e| FeatureError::ParsingError(e.to_string()))?;
    Ok((pair[..equals].trim().to_string(), value.into_owned()))
}

fn gtf_pair(pair: &str, space: usize) -> (String, String) {
    (
        pair[..space].to_string(),
        pair[space + 1..].trim().trim_matches('"').to_string(),
    )
}

/// Read every data row. Stops at a `##FASTA` section.
pub fn read_gff_rows<R: Read>(reader: R) -> Result<Vec<GffRow>, FeatureError> {
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .comment(Some(b'#'))
        .quoting(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        if record.len() == 1 && record[0].starts_with('>') {
            break;
        }
        if record.len() == 1 && record[0].trim().is_empty() {
            continue;
        }
        rows.push(GffRow::from_record(&record)?);
    }

    Ok(rows)
}

/// Build one gene record per gene row, with its transcripts filed under their type
/// label. Returns `(seqid, feature)` pairs: genes with an `ID` (or GTF `gene_id`) in
/// file order, then genes without one.
pub fn assemble_gene_features(
    rows: Vec<GffRow>,
) -> Result<Vec<(String, GffFeature)>, FeatureError> {
    let mut genes: IndexMap<String, (String, GffFeature)> = IndexMap::new();
    let mut anonymous: Vec<(String, GffFeature)> = Vec::new();
    let mut transcripts = Vec::new();

    for row in rows {
        if row.is_gene() {
            let seqid = row.seqid.clone();
            match row.gene_key().map(|key| key.to_string()) {
                Some(key) => {
                    genes.insert(key, (seqid, row.into_feature()));
                }
                None => anonymous.push((seqid, row.into_feature())),
            }
        } else if row.transcript_label().is_some() {
            transcripts.push(row);
        } else if row.feature_type.ends_with("gene") {
            log::debug!(
                "Skipping {} {:?}: not a gene feature type",
                row.feature_type,
                row.gene_key()
            );
        }
    }

    for row in transcripts {
        let label = match row.transcript_label() {
            Some(label) => label,
            None => continue,
        };
        let parents = row
            .parents()
            .iter()
            .map(|parent| parent.to_string())
            .collect::<Vec<_>>();

        for parent in parents {
            match genes.get_mut(&parent) {
                Some((_, gene)) => gene.add_child(label, row.clone().into_feature())?,
                None => log::debug!(
                    "Skipping {} {:?}: parent gene {} not found",
                    row.feature_type,
                    row.attributes.get("ID"),
                    parent
                ),
            }
        }
    }

    Ok(genes.into_values().chain(anonymous).collect())
}

pub fn read_gff_features(
    path: impl AsRef<Path>,
) -> Result<Vec<(String, GffFeature)>, FeatureError> {
    let file = std::fs::File::open(path.as_ref()).map_err(|e| {
        FeatureError::IOError(format!("{}: {}", path.as_ref().display(), e))
    })?;
    let rows = read_gff_rows(file)?;
    log::info!("Read {} GFF rows from {}", rows.len(), path.as_ref().display());

    assemble_gene_features(rows)
}
