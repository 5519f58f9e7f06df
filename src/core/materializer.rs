use crate::core::encoding;
use crate::domain::model::{Record, Value};
use crate::domain::ports::Storage;
use crate::utils::error::{CallerError, Result};

pub const OUTPUT_FILE: &str = "output.csv";

/// Output file name for a page: the first page gets `output.csv`, later
/// pages `output_<page>.csv`.
pub fn page_file_name(page: Option<i64>) -> String {
    match page {
        None => OUTPUT_FILE.to_string(),
        Some(page) => format!("output_{}.csv", page),
    }
}

/// One CSV cell: canonical text, line breaks removed, encoded to windows-1251.
pub fn render_cell(value: Option<&Value>) -> Vec<u8> {
    let text = value.map(Value::render).unwrap_or_default();
    let text = text.replace(['\n', '\r'], "");
    encoding::from_unicode(&text)
}

/// Encodes records as CSV. The header is the field order of the first record.
pub fn to_csv(records: &[Record]) -> Result<Vec<u8>> {
    let Some(first) = records.first() else {
        return Ok(Vec::new());
    };
    let header: Vec<&str> = first.field_names().collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header.iter().map(|name| encoding::from_unicode(name)))?;

    for record in records {
        writer.write_record(header.iter().map(|name| render_cell(record.get(name))))?;
    }

    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| CallerError::Io(e.into_error()))
}

/// Writes one page of records. An empty page is reported as `EmptyData`
/// and no file is created.
pub async fn save_records<S: Storage>(
    storage: &S,
    records: &[Record],
    file_name: &str,
) -> Result<usize> {
    if records.is_empty() {
        return Err(CallerError::EmptyData {
            file: file_name.to_string(),
        });
    }

    let data = to_csv(records)?;
    storage.write_file(file_name, &data).await?;

    tracing::info!("received {} records: {}", records.len(), file_name);
    Ok(records.len())
}
