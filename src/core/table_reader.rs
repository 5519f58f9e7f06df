use crate::core::encoding;
use crate::domain::model::{Record, RecordSet, Value};
use crate::domain::ports::Storage;
use crate::utils::error::{CallerError, Result};

/// Parses delimited windows-1251 text. Row 0 names the fields; every later
/// row is zipped against it. Short rows leave trailing fields unset, extra
/// cells are dropped. Malformed quoting is rejected before any row is read.
pub fn parse_table(bytes: &[u8]) -> Result<RecordSet> {
    check_quoting(bytes)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = reader.byte_records();
    let header: Vec<String> = match rows.next() {
        Some(row) => row?.iter().map(encoding::to_unicode_lossy).collect(),
        None => return Ok(Vec::new()),
    };

    let mut records = Vec::new();
    for row in rows {
        let row = row?;
        let mut record = Record::new();
        for (key, cell) in header.iter().zip(row.iter()) {
            record.insert(key.as_str(), Value::String(encoding::to_unicode_lossy(cell)));
        }
        records.push(record);
    }

    Ok(records)
}

fn quote_error(line: u64, reason: &str) -> CallerError {
    CallerError::InputParse {
        line,
        reason: reason.to_string(),
    }
}

/// Strict RFC 4180 quoting: a quote may only open a field, and a closing
/// quote must be followed by a delimiter, a line end or the end of input.
/// The `csv` reader accepts all of these silently.
fn check_quoting(bytes: &[u8]) -> Result<()> {
    let mut line = 1;
    let mut field_start = true;
    let mut i = 0;

    while i < bytes.len() {
        if field_start && bytes[i] == b'"' {
            let opened_on = line;
            i += 1;
            loop {
                match bytes.get(i) {
                    None => return Err(quote_error(opened_on, "quoted field is never closed")),
                    Some(b'"') => match bytes.get(i + 1) {
                        Some(b'"') => i += 2,
                        None | Some(b',') | Some(b'\n') => {
                            i += 1;
                            break;
                        }
                        Some(b'\r') if matches!(bytes.get(i + 2), None | Some(b'\n')) => {
                            i += 1;
                            break;
                        }
                        Some(_) => {
                            return Err(quote_error(line, "extraneous or missing \" in quoted field"))
                        }
                    },
                    Some(b'\n') => {
                        line += 1;
                        i += 1;
                    }
                    Some(_) => i += 1,
                }
            }
            field_start = false;
            continue;
        }

        match bytes[i] {
            b',' => field_start = true,
            b'\n' => {
                line += 1;
                field_start = true;
            }
            b'"' => return Err(quote_error(line, "bare \" in non-quoted field")),
            _ => field_start = false,
        }
        i += 1;
    }

    Ok(())
}

pub async fn read_table<S: Storage>(storage: &S, file_name: &str) -> Result<RecordSet> {
    let bytes = storage.read_file(file_name).await?;
    tracing::info!("Reading file: {}", file_name);
    parse_table(&bytes)
}

/// Reads a header + one data row file. `Ok(None)` when the file is absent.
pub async fn read_single_object<S: Storage>(storage: &S, file_name: &str) -> Result<Option<Record>> {
    let records = match read_table(storage, file_name).await {
        Ok(records) => records,
        Err(e) if e.is_not_found() => return Ok(None),
        Err(e) => return Err(e),
    };

    if records.len() > 1 {
        tracing::warn!(
            "{} holds {} data rows, only the first one is sent",
            file_name,
            records.len()
        );
    }

    records
        .into_iter()
        .next()
        .map(Some)
        .ok_or_else(|| CallerError::EmptyInput {
            file: file_name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::LocalStorage;
    use tempfile::TempDir;

    #[test]
    fn test_parse_basic_table() {
        let records = parse_table(b"key1,key2\nvalue1,value2\nvalue3,value4\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("key1"), Some(&Value::from("value1")));
        assert_eq!(records[1].get("key2"), Some(&Value::from("value4")));
        let names: Vec<&str> = records[0].field_names().collect();
        assert_eq!(names, vec!["key1", "key2"]);
    }

    #[test]
    fn test_short_and_long_rows() {
        let records = parse_table(b"a,b,c\n1\n1,2,3,4\n").unwrap();
        assert_eq!(records[0].len(), 1);
        assert_eq!(records[0].get("b"), None);
        assert_eq!(records[1].len(), 3);
        assert_eq!(records[1].get("c"), Some(&Value::from("3")));
    }

    #[test]
    fn test_cells_decoded_from_code_page() {
        let mut bytes = b"name\n".to_vec();
        bytes.extend_from_slice(&[0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2, b'\n']);
        let records = parse_table(&bytes).unwrap();
        assert_eq!(records[0].get("name"), Some(&Value::from("Привет")));
    }

    #[test]
    fn test_quoted_cells() {
        let records = parse_table(b"id,note\n1,\"hello, world\"\n").unwrap();
        assert_eq!(records[0].get("note"), Some(&Value::from("hello, world")));
    }

    #[test]
    fn test_escaped_quotes_and_multiline_cells() {
        let records = parse_table(b"id,note\r\n1,\"say \"\"hi\"\"\nthere\"\r\n").unwrap();
        assert_eq!(records[0].get("note"), Some(&Value::from("say \"hi\"\nthere")));
    }

    #[test]
    fn test_unterminated_quote_is_parse_error() {
        let err = parse_table(b"a,b\n1,\"unterminated\n").unwrap_err();
        assert!(matches!(err, CallerError::InputParse { line: 2, .. }));
    }

    #[test]
    fn test_bare_quote_is_parse_error() {
        let err = parse_table(b"a,b\n1,ab\"c\n").unwrap_err();
        assert!(matches!(err, CallerError::InputParse { line: 2, .. }));

        let err = parse_table(b"a,b\n1,\"ab\"c\n").unwrap_err();
        assert!(matches!(err, CallerError::InputParse { line: 2, .. }));
    }

    #[test]
    fn test_empty_file_has_no_records() {
        assert!(parse_table(b"").unwrap().is_empty());
        assert!(parse_table(b"a,b\n").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_single_object_missing_file() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_str().unwrap());
        assert!(read_single_object(&storage, "object.csv").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_single_object_empty_rows() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("object.csv"), "id,name\n").unwrap();
        let storage = LocalStorage::new(dir.path().to_str().unwrap());

        let err = read_single_object(&storage, "object.csv").await.unwrap_err();
        assert!(matches!(err, CallerError::EmptyInput { .. }));
    }

    #[tokio::test]
    async fn test_read_single_object_first_row() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("object.csv"), "id,name\n7,first\n8,second\n").unwrap();
        let storage = LocalStorage::new(dir.path().to_str().unwrap());

        let record = read_single_object(&storage, "object.csv")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.get("name"), Some(&Value::from("first")));
    }
}
