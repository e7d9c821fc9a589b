use crate::{
    error::FeatureError,
    feature::{Gene, GffFeature},
    intervals::IntervalIndex,
};
use indexmap::IndexMap;
use itertools::Itertools;
use noodles::core::Position;
use noodles::fasta::record::Sequence;
use std::cell::OnceCell;
use std::fmt;

/// Attributes searched, in order, for a gene identifier.
pub const DEFAULT_LOOKUP_ATTRIBUTES: [&str; 4] = ["gene_id", "Name", "ID", "id"];

/// Keys that `Gene` already has as fields. They are dropped from the attributes.
const RESERVED_ATTRIBUTES: [&str; 6] = [
    "chromosome",
    "start",
    "end",
    "strand",
    "assembly_name",
    "gene_id",
];

/// Feature type labels holding transcript records.
const TRANSCRIPT_FEATURE_TYPES: [&str; 3] = ["mRNA", "RNA", "transcript"];

/// A chromosome and the genes annotated on it.
///
/// Genes live in slots. The gene map and the interval index point into them, so a
/// gene replaced under the same identifier stays reachable from index entries that
/// were never overwritten, until the index is rebuilt.
#[derive(Debug, Clone)]
pub struct Chromosome {
    pub chromosome_id: String,

    pub assembly_name: Option<String>,

    /// Length of the attached sequence. 0 until one is attached.
    pub length: u64,

    slots: Vec<Gene>,

    /// {gene_id: slot}
    genes: IndexMap<String, usize>,

    index: IntervalIndex<usize>,

    /// Slots ordered by gene start. Reset whenever a gene is added.
    sorted: OnceCell<Vec<usize>>,

    nucleic_sequence: Option<Sequence>,
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} genes)", self.chromosome_id, self.genes.len())
    }
}

impl Chromosome {
    pub fn new(chromosome_id: &str, assembly_name: Option<String>) -> Self {
        Self {
            chromosome_id: chromosome_id.to_string(),
            assembly_name,
            length: 0,
            slots: Vec::new(),
            genes: IndexMap::new(),
            index: IntervalIndex::new(),
            sorted: OnceCell::new(),
            nucleic_sequence: None,
        }
    }

    /// Register a gene built from `feature`, looking the identifier up in
    /// [`DEFAULT_LOOKUP_ATTRIBUTES`].
    ///
    /// `feature` is consumed in place: its `gene_id` is taken and the reserved keys
    /// are removed from its attributes, whether or not registration succeeds.
    pub fn add_gene(&mut self, feature: &mut GffFeature) -> Result<&Gene, FeatureError> {
        self.add_gene_with_lookup(feature, &DEFAULT_LOOKUP_ATTRIBUTES)
    }

    pub fn add_gene_with_lookup(
        &mut self,
        feature: &mut GffFeature,
        lookup_attributes: &[&str],
    ) -> Result<&Gene, FeatureError> {
        let gene_id = match resolve_gene_id(feature, lookup_attributes) {
            Some(gene_id) => gene_id,
            None => {
                log::warn!(
                    "No gene identifier on chromosome {}: {:#?}",
                    self.chromosome_id,
                    feature
                );
                return Err(FeatureError::MissingGeneId(format!("{:?}", feature)));
            }
        };

        if let Some(attributes) = feature.attributes.as_mut() {
            for key in RESERVED_ATTRIBUTES {
                attributes.shift_remove(key);
            }
        }

        let mut gene = Gene::new(
            gene_id.clone(),
            self.chromosome_id.clone(),
            feature.start.unwrap_or(0),
            feature.end.unwrap_or(0),
            feature.strand,
            self.assembly_name.clone(),
            feature.attributes.clone().unwrap_or_default(),
        );
        for feature_type in TRANSCRIPT_FEATURE_TYPES {
            for transcript in feature.children_of_type(feature_type)? {
                gene.add_transcript(&transcript);
            }
        }

        log::debug!(
            "{}: gene {} [{}, {}] with {} transcripts",
            self.chromosome_id,
            gene_id,
            gene.start,
            gene.end,
            gene.transcripts().len()
        );

        let slot = self.slots.len();
        self.index.insert(gene.start, gene.end, slot);
        self.slots.push(gene);
        self.genes.insert(gene_id, slot);
        self.sorted.take();

        Ok(&self.slots[slot])
    }

    pub fn get_gene(&self, gene_id: &str) -> Option<&Gene> {
        self.genes.get(gene_id).map(|slot| &self.slots[*slot])
    }

    /// All genes, in registration order.
    pub fn genes(&self) -> Vec<&Gene> {
        self.genes.values().map(|slot| &self.slots[*slot]).collect()
    }

    pub fn n_genes(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Genes by ascending start. Ties keep registration order.
    pub fn sorted_genes(&self) -> Vec<&Gene> {
        self.sorted
            .get_or_init(|| {
                self.genes
                    .values()
                    .copied()
                    .sorted_by_key(|slot| self.slots[*slot].start)
                    .collect()
            })
            .iter()
            .map(|slot| &self.slots[*slot])
            .collect()
    }

    /// Genes whose `[start, end]` contains `position`. Builds the index if it is empty.
    pub fn get_genes_at(&mut self, position: u64) -> Vec<&Gene> {
        if self.index.is_empty() {
            self.build_index();
        }

        self.index
            .covering(position)
            .into_iter()
            .map(|slot| &self.slots[slot])
            .collect()
    }

    /// Rebuild the interval index from the current gene map. Genes replaced under
    /// the same identifier are dropped.
    pub fn build_index(&mut self) {
        if self.slots.len() > self.genes.len() {
            self.compact_slots();
        }

        self.index.clear();
        for slot in self.genes.values() {
            let gene = &self.slots[*slot];
            self.index.insert(gene.start, gene.end, *slot);
        }
        log::debug!(
            "{}: built interval index with {} entries",
            self.chromosome_id,
            self.index.len()
        );
    }

    fn compact_slots(&mut self) {
        let mut old_slots = std::mem::take(&mut self.slots)
            .into_iter()
            .map(Some)
            .collect::<Vec<_>>();

        for slot in self.genes.values_mut() {
            if let Some(gene) = old_slots[*slot].take() {
                *slot = self.slots.len();
                self.slots.push(gene);
            }
        }
        self.sorted.take();

        log::debug!(
            "{}: dropped {} replaced genes",
            self.chromosome_id,
            old_slots.len() - self.slots.len()
        );
    }

    pub fn attach_nucleic_sequence(&mut self, sequence: impl Into<Vec<u8>>) {
        let sequence = Sequence::from(sequence.into());
        self.length = sequence.len() as u64;
        self.nucleic_sequence = Some(sequence);
    }

    pub fn nucleic_sequence(&self) -> Option<&Sequence> {
        self.nucleic_sequence.as_ref()
    }

    /// Subsequence in `[start, end)`, 0-based. `end` past the sequence is clamped.
    pub fn extract_sequence(&self, start: u64, end: u64) -> Result<String, FeatureError> {
        let sequence = self
            .nucleic_sequence
            .as_ref()
            .ok_or_else(|| FeatureError::MissingSequence(self.chromosome_id.clone()))?;

        if start > end {
            return Err(FeatureError::InvalidRange { start, end });
        }

        let end = end.min(sequence.len() as u64);
        if start >= end {
            return Ok(String::new());
        }

        // 0-based half-open [start, end) is 1-based closed [start + 1, end].
        let first = Position::try_from(start as usize + 1)
            .map_err(|_| FeatureError::InvalidRange { start, end })?;
        let last = Position::try_from(end as usize)
            .map_err(|_| FeatureError::InvalidRange { start, end })?;

        let bases = sequence
            .get(first..=last)
            .ok_or(FeatureError::InvalidRange { start, end })?;

        String::from_utf8(bases.to_vec()).map_err(|e| FeatureError::ParsingError(e.to_string()))
    }
}

/// Top-level `gene_id` first (taken out of the record), then the first lookup
/// attribute whose value is not blank.
fn resolve_gene_id(feature: &mut GffFeature, lookup_attributes: &[&str]) -> Option<String> {
    let gene_id = match feature.gene_id.take() {
        Some(gene_id) => Some(gene_id),
        None => feature.attributes.as_ref().and_then(|attributes| {
            lookup_attributes.iter().find_map(|key| {
                attributes
                    .get(*key)
                    .filter(|value| !value.trim_end().is_empty())
                    .cloned()
            })
        }),
    };

    gene_id.filter(|gene_id| !gene_id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{feature::Attributes, strand::Strand};
    use rstest::rstest;

    fn feature(id: &str, start: u64, end: u64) -> GffFeature {
        GffFeature::new()
            .with_location(start, end, Some(Strand::Forward))
            .with_attribute("ID", id)
    }

    fn chromosome_abc() -> Chromosome {
        let mut chromosome = Chromosome::new("chr1", Some("hg38".to_string()));
        for (id, start, end) in [("A", 100, 200), ("B", 150, 250), ("C", 300, 400)] {
            chromosome.add_gene(&mut feature(id, start, end)).unwrap();
        }
        chromosome
    }

    fn ids(genes: Vec<&Gene>) -> Vec<String> {
        genes.iter().map(|gene| gene.gene_id.clone()).collect()
    }

    #[test]
    fn test_add_gene_then_get_gene() {
        let mut chromosome = Chromosome::new("chr2", Some("hg19".to_string()));
        let mut record = GffFeature::new()
            .with_location(10, 90, Some(Strand::Reverse))
            .with_attribute("Name", "TP53")
            .with_attribute("biotype", "protein_coding")
            .with_attribute("start", "999")
            .with_attribute("chromosome", "chrX");

        chromosome.add_gene(&mut record).unwrap();

        let gene = chromosome.get_gene("TP53").unwrap();
        assert_eq!((gene.start, gene.end), (10, 90));
        assert_eq!(gene.strand, Some(Strand::Reverse));
        assert_eq!(gene.chromosome_id, "chr2");
        assert_eq!(gene.assembly_name.as_deref(), Some("hg19"));
        assert_eq!(
            gene.attributes,
            Attributes::from([
                ("Name".to_string(), "TP53".to_string()),
                ("biotype".to_string(), "protein_coding".to_string()),
            ])
        );

        // Reserved keys are removed from the caller's record.
        assert_eq!(record.attribute("start"), None);
        assert_eq!(record.attribute("chromosome"), None);
        assert_eq!(chromosome.to_string(), "chr2 (1 genes)");
    }

    #[rstest]
    // Top-level gene_id beats attributes.
    #[case(GffFeature::new().with_gene_id("top").with_attribute("gene_id", "attr"), "top")]
    #[case(GffFeature::new().with_attribute("ID", "id1").with_attribute("Name", "name1"), "name1")]
    #[case(GffFeature::new().with_attribute("id", "lower").with_attribute("ID", "upper"), "upper")]
    #[case(GffFeature::new().with_attribute("gene_id", "  ").with_attribute("ID", "fallback"), "fallback")]
    #[case(GffFeature::new().with_attribute("id", "last"), "last")]
    fn test_gene_id_resolution(#[case] record: GffFeature, #[case] expected: &str) {
        let mut record = record;
        let mut chromosome = Chromosome::new("chr1", None);
        let gene_id = chromosome.add_gene(&mut record).unwrap().gene_id.clone();

        assert_eq!(gene_id, expected);
        assert!(chromosome.get_gene(expected).is_some());
        assert_eq!(record.gene_id, None);
    }

    #[rstest]
    #[case(GffFeature::new())]
    #[case(GffFeature::new().with_attribute("Alias", "x"))]
    #[case(GffFeature::new().with_attribute("Name", "   "))]
    #[case(GffFeature::new().with_gene_id(""))]
    fn test_missing_gene_id(#[case] record: GffFeature) {
        let mut record = record;
        let mut chromosome = chromosome_abc();

        let result = chromosome.add_gene(&mut record);
        assert!(matches!(result, Err(FeatureError::MissingGeneId(_))));
        assert_eq!(chromosome.n_genes(), 3);
        assert_eq!(ids(chromosome.get_genes_at(160)), vec!["A", "B"]);
    }

    #[test]
    fn test_custom_lookup_attributes() {
        let mut chromosome = Chromosome::new("chr1", None);
        let mut record = GffFeature::new()
            .with_attribute("ID", "gene:1")
            .with_attribute("locus_tag", "b0001");

        let gene = chromosome
            .add_gene_with_lookup(&mut record, &["locus_tag", "ID"])
            .unwrap();
        assert_eq!(gene.gene_id, "b0001");
    }

    #[test]
    fn test_defaults_for_missing_location() {
        let mut chromosome = Chromosome::new("chr1", None);
        let gene = chromosome
            .add_gene(&mut GffFeature::new().with_gene_id("g"))
            .unwrap();

        assert_eq!((gene.start, gene.end, gene.strand), (0, 0, None));
        assert!(gene.attributes.is_empty());
    }

    #[test]
    fn test_transcripts_attached() {
        let mut chromosome = Chromosome::new("chr1", None);
        let mut record = feature("G", 100, 500)
            .with_attribute("source", "ensembl")
            .with_child("mrna", feature("G.1", 100, 400))
            .and_then(|f| f.with_child("mrna", feature("G.2", 150, 500)))
            .and_then(|f| f.with_child("RNA", feature("G.3", 120, 300)))
            .and_then(|f| f.with_child("TRANSCRIPT", feature("G.4", 100, 200)))
            .and_then(|f| f.with_child("exon", feature("G.1.e1", 100, 120)))
            .unwrap();
        record.extra.insert("type".to_string(), serde_json::json!("gene"));

        let gene = chromosome.add_gene(&mut record).unwrap();

        let transcript_ids = gene
            .transcripts()
            .iter()
            .map(|t| t.transcript_id.clone().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(transcript_ids, vec!["G.1", "G.2", "G.3", "G.4"]);
    }

    #[rstest]
    #[case(160, vec!["A", "B"])]
    #[case(350, vec!["C"])]
    #[case(275, vec![])]
    #[case(100, vec!["A"])]
    #[case(200, vec!["A", "B"])]
    #[case(250, vec!["B"])]
    #[case(400, vec!["C"])]
    #[case(401, vec![])]
    #[case(0, vec![])]
    fn test_get_genes_at(#[case] position: u64, #[case] expected: Vec<&str>) {
        let mut chromosome = chromosome_abc();
        assert_eq!(ids(chromosome.get_genes_at(position)), expected);
    }

    #[test]
    fn test_get_genes_at_matches_brute_force() {
        let mut chromosome = Chromosome::new("chr1", None);
        let spans = [(5, 50), (20, 20), (40, 90), (60, 70), (95, 120)];
        for (i, (start, end)) in spans.iter().enumerate() {
            chromosome
                .add_gene(&mut feature(&format!("g{}", i), *start, *end))
                .unwrap();
        }

        for position in 0..130 {
            let expected = spans
                .iter()
                .enumerate()
                .filter(|(_, (start, end))| *start <= position && position <= *end)
                .map(|(i, _)| format!("g{}", i))
                .collect::<Vec<_>>();
            assert_eq!(ids(chromosome.get_genes_at(position)), expected);
        }
    }

    #[test]
    fn test_build_index_matches_lazy_index() {
        let mut lazy = chromosome_abc();
        let mut built = chromosome_abc();
        built.build_index();

        for position in [99, 100, 160, 201, 250, 275, 300, 350, 400, 401] {
            assert_eq!(
                ids(lazy.get_genes_at(position)),
                ids(built.get_genes_at(position))
            );
        }
    }

    #[test]
    fn test_empty_chromosome() {
        let mut chromosome = Chromosome::new("chrM", None);
        assert!(chromosome.is_empty());
        assert!(chromosome.get_genes_at(10).is_empty());
        assert!(chromosome.sorted_genes().is_empty());
        assert_eq!(chromosome.to_string(), "chrM (0 genes)");
    }

    #[test]
    fn test_identical_intervals_keep_latter() {
        let mut chromosome = chromosome_abc();
        chromosome.add_gene(&mut feature("A2", 100, 200)).unwrap();

        assert_eq!(chromosome.n_genes(), 4);
        assert_eq!(ids(chromosome.get_genes_at(120)), vec!["A2"]);
        assert_eq!(ids(chromosome.get_genes_at(160)), vec!["A2", "B"]);
    }

    #[test]
    fn test_duplicate_gene_id_last_write_wins() {
        let mut chromosome = chromosome_abc();
        chromosome.add_gene(&mut feature("A", 500, 600)).unwrap();

        assert_eq!(chromosome.n_genes(), 3);
        assert_eq!(chromosome.get_gene("A").map(|g| g.start), Some(500));
        assert_eq!(ids(chromosome.get_genes_at(550)), vec!["A"]);

        // The old interval still points at the replaced gene until a rebuild.
        assert_eq!(ids(chromosome.get_genes_at(120)), vec!["A"]);
        chromosome.build_index();
        assert!(chromosome.get_genes_at(120).is_empty());
        assert_eq!(ids(chromosome.get_genes_at(550)), vec!["A"]);
    }

    #[test]
    fn test_build_index_drops_replaced_genes() {
        let mut chromosome = chromosome_abc();
        let sorted_before = ids(chromosome.sorted_genes());
        for i in 0..1000 {
            chromosome.add_gene(&mut feature("B", 150 + i, 250 + i)).unwrap();
        }
        assert_eq!(chromosome.slots.len(), 1003);

        chromosome.build_index();

        assert_eq!(chromosome.n_genes(), 3);
        assert_eq!(chromosome.slots.len(), 3);
        assert_eq!(ids(chromosome.genes()), vec!["A", "B", "C"]);
        assert_eq!(chromosome.get_gene("B").map(|g| g.start), Some(1149));
        assert_eq!(ids(chromosome.get_genes_at(160)), vec!["A"]);
        assert_eq!(ids(chromosome.get_genes_at(1200)), vec!["B"]);
        assert_eq!(sorted_before, vec!["A", "B", "C"]);
        assert_eq!(ids(chromosome.sorted_genes()), vec!["A", "C", "B"]);
    }

    #[test]
    fn test_sorted_genes_refreshes_after_add() {
        let mut chromosome = Chromosome::new("chr1", None);
        chromosome.add_gene(&mut feature("C", 300, 400)).unwrap();
        chromosome.add_gene(&mut feature("A", 100, 200)).unwrap();
        assert_eq!(ids(chromosome.sorted_genes()), vec!["A", "C"]);

        chromosome.add_gene(&mut feature("B", 150, 250)).unwrap();
        chromosome.add_gene(&mut feature("Z", 100, 120)).unwrap();
        let sorted = chromosome.sorted_genes();
        assert_eq!(ids(sorted.clone()), vec!["A", "Z", "B", "C"]);
        assert!(sorted.windows(2).all(|w| w[0].start <= w[1].start));
    }

    #[rstest]
    #[case(1, 3, "CG")]
    #[case(0, 4, "ACGT")]
    #[case(2, 2, "")]
    #[case(6, 20, "AC")]
    #[case(30, 40, "")]
    fn test_extract_sequence(#[case] start: u64, #[case] end: u64, #[case] expected: &str) {
        let mut chromosome = Chromosome::new("chr1", None);
        chromosome.attach_nucleic_sequence("ACGTTTAC");

        assert_eq!(chromosome.length, 8);
        assert_eq!(chromosome.nucleic_sequence().map(|s| s.len()), Some(8));
        assert_eq!(chromosome.extract_sequence(start, end).unwrap(), expected);
    }

    #[test]
    fn test_extract_sequence_errors() {
        let mut chromosome = Chromosome::new("chr1", None);
        assert_eq!(
            chromosome.extract_sequence(1, 3),
            Err(FeatureError::MissingSequence("chr1".to_string()))
        );

        chromosome.attach_nucleic_sequence(b"ACGT".to_vec());
        assert_eq!(
            chromosome.extract_sequence(3, 1),
            Err(FeatureError::InvalidRange { start: 3, end: 1 })
        );
    }
}
