use clap::Parser;
use genomic_features::{
    error::FeatureError,
    feature::Gene,
    genome::Genome,
    sequence::attach_fasta,
    settings::{Cli, Query, Settings},
};
use itertools::Itertools;
use std::path::PathBuf;

fn setup_logging(level: log::LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_secs()
        .init();
}

fn describe(gene: &Gene, json: bool) -> Result<String, FeatureError> {
    if json {
        return serde_json::to_string(gene)
            .map_err(|e| FeatureError::ParsingError(e.to_string()));
    }

    Ok([
        gene.gene_id.clone(),
        gene.chromosome_id.clone(),
        gene.start.to_string(),
        gene.end.to_string(),
        gene.strand
            .map(|strand| strand.to_string())
            .unwrap_or(".".to_string()),
    ]
    .iter()
    .join("\t"))
}

fn load_gff(
    path: Option<&PathBuf>,
    assembly_name: Option<String>,
) -> Result<Genome, FeatureError> {
    match path {
        Some(path) => Genome::from_gff(path, assembly_name),
        None => Err(FeatureError::CliError("--gff is required".to_string())),
    }
}

fn main() -> Result<(), FeatureError> {
    let cli = Cli::parse();
    let settings = Settings::new(cli)?;
    setup_logging(settings.log_level);

    match settings.query {
        Query::GenesAt {
            chromosome,
            position,
        } => {
            let mut genome = load_gff(settings.gff_path.as_ref(), settings.assembly_name)?;
            let chromosome = genome.try_chromosome_mut(&chromosome)?;
            for gene in chromosome.get_genes_at(position) {
                println!("{}", describe(gene, settings.json)?);
            }
        }
        Query::Gene { gene_id } => {
            let genome = load_gff(settings.gff_path.as_ref(), settings.assembly_name)?;
            let gene = genome.get_gene(&gene_id).ok_or_else(|| {
                FeatureError::ValueError(format!("Gene not found: {}", gene_id))
            })?;
            println!("{}", describe(gene, settings.json)?);
            for transcript in gene.transcripts() {
                log::info!(
                    "  transcript {} [{}, {}]",
                    transcript.transcript_id.as_deref().unwrap_or("."),
                    transcript.start,
                    transcript.end
                );
            }
        }
        Query::Sorted { chromosome } => {
            let mut genome = load_gff(settings.gff_path.as_ref(), settings.assembly_name)?;
            let chromosome = genome.try_chromosome_mut(&chromosome)?;
            for gene in chromosome.sorted_genes() {
                println!("{}", describe(gene, settings.json)?);
            }
        }
        Query::Extract {
            chromosome,
            start,
            end,
        } => {
            let mut genome = Genome::new(settings.assembly_name);
            if let Some(fasta_path) = &settings.fasta_path {
                attach_fasta(&mut genome, fasta_path)?;
            }
            let chromosome = genome.try_chromosome_mut(&chromosome)?;
            println!("{}", chromosome.extract_sequence(start, end)?);
        }
    }

    Ok(())
}
