use crate::domain::model::PostalCode;
use crate::utils::error::{LocatorError, Result};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "MSA")]
    msa: String,
    #[serde(rename = "ZIP")]
    zip: String,
    #[serde(rename = "Addr")]
    addr: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRow {
    pub msa: u32,
    pub postal_code: PostalCode,
    pub addr: String,
}

/// In-memory MSA → ZIP reference table, one row per pair, in file order.
#[derive(Debug, Clone, Default)]
pub struct ZipTable {
    rows: Vec<ReferenceRow>,
}

impl ZipTable {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| LocatorError::ReferenceError {
            message: format!("{}: {}", path.display(), e),
        })?;
        let table = Self::from_reader(file)?;
        tracing::info!(
            "Loaded {} reference rows from {}",
            table.rows.len(),
            path.display()
        );
        Ok(table)
    }

    /// Reads CSV with `MSA`, `ZIP` and `Addr` headers. Extra columns are ignored,
    /// rows with an unusable MSA or ZIP are logged and dropped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut rows = Vec::new();

        for (index, raw) in csv_reader.deserialize::<RawRow>().enumerate() {
            let raw = raw?;
            let line = index + 2;

            let msa = match raw.msa.parse::<u32>() {
                Ok(msa) => msa,
                Err(_) => {
                    tracing::warn!("Skipping reference row {}: bad MSA '{}'", line, raw.msa);
                    continue;
                }
            };
            let postal_code = match PostalCode::parse(&raw.zip) {
                Ok(code) => code,
                Err(e) => {
                    tracing::warn!("Skipping reference row {}: {}", line, e);
                    continue;
                }
            };

            rows.push(ReferenceRow {
                msa,
                postal_code,
                addr: raw.addr,
            });
        }

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[ReferenceRow] {
        &self.rows
    }
}
