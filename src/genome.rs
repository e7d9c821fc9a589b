use crate::{
    chromosome::Chromosome,
    error::FeatureError,
    feature::{Gene, GffFeature},
    gff,
};
use indexmap::IndexMap;
use std::path::Path;

/// Chromosomes of one assembly, keyed by chromosome identifier in load order.
#[derive(Debug, Clone, Default)]
pub struct Genome {
    pub assembly_name: Option<String>,

    chromosomes: IndexMap<String, Chromosome>,
}

impl Genome {
    pub fn new(assembly_name: Option<String>) -> Self {
        Self {
            assembly_name,
            chromosomes: IndexMap::new(),
        }
    }

    /// Load every gene of a GFF3/GTF file.
    pub fn from_gff(
        path: impl AsRef<Path>,
        assembly_name: Option<String>,
    ) -> Result<Self, FeatureError> {
        let mut genome = Self::new(assembly_name);
        let n_genes = genome.add_features(gff::read_gff_features(path)?)?;
        log::info!(
            "Loaded {} genes on {} chromosomes",
            n_genes,
            genome.chromosomes.len()
        );
        Ok(genome)
    }

    /// Register `(chromosome_id, feature)` pairs. Returns the number of genes added.
    pub fn add_features(
        &mut self,
        features: Vec<(String, GffFeature)>,
    ) -> Result<usize, FeatureError> {
        let mut n_genes = 0;
        for (chromosome_id, mut feature) in features {
            self.chromosome_mut_or_insert(&chromosome_id)
                .add_gene(&mut feature)?;
            n_genes += 1;
        }
        Ok(n_genes)
    }

    pub fn chromosome_mut_or_insert(&mut self, chromosome_id: &str) -> &mut Chromosome {
        let assembly_name = self.assembly_name.clone();
        self.chromosomes
            .entry(chromosome_id.to_string())
            .or_insert_with(|| Chromosome::new(chromosome_id, assembly_name))
    }

    pub fn chromosome(&self, chromosome_id: &str) -> Option<&Chromosome> {
        self.chromosomes.get(chromosome_id)
    }

    pub fn try_chromosome_mut(
        &mut self,
        chromosome_id: &str,
    ) -> Result<&mut Chromosome, FeatureError> {
        self.chromosomes.get_mut(chromosome_id).ok_or_else(|| {
            FeatureError::ValueError(format!("Chromosome not found: {}", chromosome_id))
        })
    }

    pub fn chromosomes(&self) -> impl Iterator<Item = &Chromosome> {
        self.chromosomes.values()
    }

    /// First gene with this identifier, searching chromosomes in load order.
    pub fn get_gene(&self, gene_id: &str) -> Option<&Gene> {
        self.chromosomes
            .values()
            .find_map(|chromosome| chromosome.get_gene(gene_id))
    }
}
