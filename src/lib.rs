//! Chromosomes, genes and transcripts built from GFF features, with positional
//! gene lookup and sequence extraction.

pub mod chromosome;
pub mod error;
pub mod feature;
pub mod genome;
pub mod gff;
pub mod intervals;
pub mod sequence;
pub mod settings;
pub mod strand;

pub use chromosome::{Chromosome, DEFAULT_LOOKUP_ATTRIBUTES};
pub use error::FeatureError;
pub use feature::{Gene, GffFeature, Transcript};
pub use genome::Genome;
pub use strand::Strand;
