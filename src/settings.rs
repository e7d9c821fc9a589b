use crate::error::FeatureError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Assembly name recorded on loaded chromosomes and genes (e.g. "hg38")
    #[arg(short = 'a', long = "assembly", global = true)]
    pub assembly: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    /// Print genes as JSON lines
    #[arg(long = "json", global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Genes overlapping a position
    GenesAt {
        #[arg(long = "gff")]
        gff: PathBuf,

        #[arg(short = 'c', long = "chromosome")]
        chromosome: String,

        /// 1-based position, as in the GFF file
        #[arg(short = 'p', long = "position")]
        position: u64,
    },

    /// Look a gene up by identifier
    Gene {
        #[arg(long = "gff")]
        gff: PathBuf,

        #[arg(value_name = "GENE_ID")]
        gene_id: String,
    },

    /// All genes of a chromosome ordered by start
    Sorted {
        #[arg(long = "gff")]
        gff: PathBuf,

        #[arg(short = 'c', long = "chromosome")]
        chromosome: String,
    },

    /// Subsequence [start, end), 0-based
    Extract {
        #[arg(long = "fasta")]
        fasta: PathBuf,

        #[arg(short = 'c', long = "chromosome")]
        chromosome: String,

        #[arg(short = 's', long = "start")]
        start: u64,

        #[arg(short = 'e', long = "end")]
        end: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    GenesAt { chromosome: String, position: u64 },
    Gene { gene_id: String },
    Sorted { chromosome: String },
    Extract { chromosome: String, start: u64, end: u64 },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub gff_path: Option<PathBuf>,
    pub fasta_path: Option<PathBuf>,
    pub assembly_name: Option<String>,
    pub log_level: log::LevelFilter,
    pub json: bool,
    pub query: Query,
}

impl Settings {
    pub fn new(cli: Cli) -> Result<Self, FeatureError> {
        let log_level = match (cli.quiet, cli.verbose) {
            (true, _) => log::LevelFilter::Error,
            (false, 0) => log::LevelFilter::Info,
            (false, 1) => log::LevelFilter::Debug,
            (false, _) => log::LevelFilter::Trace,
        };

        let mut gff_path = None;
        let mut fasta_path = None;

        let query = match cli.command {
            Commands::GenesAt {
                gff,
                chromosome,
                position,
            } => {
                gff_path = Some(gff);
                Query::GenesAt {
                    chromosome,
                    position,
                }
            }
            Commands::Gene { gff, gene_id } => {
                gff_path = Some(gff);
                Query::Gene { gene_id }
            }
            Commands::Sorted { gff, chromosome } => {
                gff_path = Some(gff);
                Query::Sorted { chromosome }
            }
            Commands::Extract {
                fasta,
                chromosome,
                start,
                end,
            } => {
                if start > end {
                    return Err(FeatureError::CliError(format!(
                        "--start ({}) must not be greater than --end ({})",
                        start, end
                    )));
                }
                fasta_path = Some(fasta);
                Query::Extract {
                    chromosome,
                    start,
                    end,
                }
            }
        };

        Ok(Self {
            gff_path,
            fasta_path,
            assembly_name: cli.assembly,
            log_level,
            json: cli.json,
            query,
        })
    }
}
