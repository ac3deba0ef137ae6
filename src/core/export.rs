use crate::domain::model::PhysicianRecord;
use crate::utils::error::Result;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Flat row handed to downstream geocoding and mapping tools.
#[derive(Debug, Serialize)]
struct PhysicianRow {
    npi: String,
    name: String,
    organization: String,
    specialties: String,
    address: String,
}

impl From<&PhysicianRecord> for PhysicianRow {
    fn from(record: &PhysicianRecord) -> Self {
        Self {
            npi: record.npi().unwrap_or_default(),
            name: record.full_name(),
            organization: record.organization_name().unwrap_or_default(),
            specialties: record.specialties(),
            address: record.location_address().unwrap_or_default(),
        }
    }
}

const HEADER: [&str; 5] = ["npi", "name", "organization", "specialties", "address"];

/// Writes the header row even when there are no records.
pub fn write_csv<W: Write>(records: &[PhysicianRecord], writer: W) -> Result<usize> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(HEADER)?;
    for record in records {
        csv_writer.serialize(PhysicianRow::from(record))?;
    }
    csv_writer.flush()?;
    Ok(records.len())
}

pub fn export_csv<P: AsRef<Path>>(records: &[PhysicianRecord], path: P) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)?;
    let written = write_csv(records, file)?;
    tracing::info!("Exported {} physicians to {}", written, path.display());
    Ok(written)
}
