//! Binary model artifact
//!
//! Layout: four magic bytes, then a bincode-encoded header (format version,
//! crate version) followed by the fitted [`TriagePipeline`].

use crate::error::{Result, TriageError};
use crate::training::TriagePipeline;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::info;

const MAGIC: [u8; 4] = *b"DTRG";
const FORMAT_VERSION: u32 = 1;

/// Precedes the pipeline in the file
#[derive(Debug, Serialize, Deserialize)]
struct ArtifactHeader {
    format_version: u32,
    crate_version: String,
}

/// Write a fitted pipeline to `path`, replacing any existing file
pub fn save_model(model: &TriagePipeline, path: impl AsRef<Path>) -> Result<()> {
    if !model.is_fitted() {
        return Err(TriageError::ModelNotFitted);
    }

    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let header = ArtifactHeader {
        format_version: FORMAT_VERSION,
        crate_version: env!("CARGO_PKG_VERSION").to_string(),
    };
    writer.write_all(&MAGIC)?;
    bincode::serialize_into(&mut writer, &header)?;
    bincode::serialize_into(&mut writer, model)?;
    writer.flush()?;

    info!(path = %path.display(), categories = model.n_outputs(), "Model saved");
    Ok(())
}

/// Read a pipeline written by [`save_model`]
pub fn load_model(path: impl AsRef<Path>) -> Result<TriagePipeline> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut magic = [0u8; 4];
    let is_artifact = reader.read_exact(&mut magic).is_ok() && magic == MAGIC;
    if !is_artifact {
        return Err(TriageError::SerializationError(format!(
            "{} is not a model artifact",
            path.display()
        )));
    }

    let header: ArtifactHeader = bincode::deserialize_from(&mut reader)?;
    if header.format_version != FORMAT_VERSION {
        return Err(TriageError::SerializationError(format!(
            "Unsupported artifact format {} (written by version {}), expected {}",
            header.format_version, header.crate_version, FORMAT_VERSION
        )));
    }

    let pipeline: TriagePipeline = bincode::deserialize_from(&mut reader)?;
    Ok(pipeline)
}
