use crate::{error::FeatureError, genome::Genome};
use noodles::fasta;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Attach every FASTA record to the chromosome of the same name, creating the
/// chromosome if the annotation did not mention it. Returns the number of records.
pub fn attach_fasta(
    genome: &mut Genome,
    path: impl AsRef<Path>,
) -> Result<usize, FeatureError> {
    let file = File::open(path.as_ref())
        .map_err(|e| FeatureError::IOError(format!("{}: {}", path.as_ref().display(), e)))?;
    let mut reader = fasta::io::Reader::new(BufReader::new(file));

    let mut n_records = 0;
    for result in reader.records() {
        let record = result?;
        let name = String::from_utf8_lossy(record.name()).to_string();

        let chromosome = genome.chromosome_mut_or_insert(&name);
        chromosome.attach_nucleic_sequence(record.sequence().as_ref().to_vec());
        log::debug!("Attached {} bp to {}", chromosome.length, name);

        n_records += 1;
    }

    Ok(n_records)
}
