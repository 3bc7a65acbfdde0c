//! Lineage and op stream writers/readers.
//!
//! Two text formats carry the op stream:
//! - the lineage file, a JSON array with one record per line
//! - the height input, one `flush -> <n>` / `merge -> <b>-<e>` per line

use super::path::create_output;
use crate::lineage::schema::{CompletedOp, LineageRecord, OpId};
use crate::utils::config::{FLUSH_LINE_PREFIX, MERGE_LINE_PREFIX};
use crate::utils::error::{ForestError, OutputError};
use log::{debug, info};
use std::io::{BufRead, Read, Write};
use std::path::Path;

/// Write completed ops as a JSON array, one record per line
///
/// **Public** - lineage file writer
pub fn write_lineage<W: Write>(ops: &[CompletedOp], mut writer: W) -> Result<(), OutputError> {
    writer.write_all(b"[\n")?;
    for (i, op) in ops.iter().enumerate() {
        if i > 0 {
            writer.write_all(b",\n")?;
        }
        serde_json::to_writer(&mut writer, &op.to_record())?;
    }
    writer.write_all(b"\n]")?;
    writer.flush()?;
    Ok(())
}

/// Write the lineage file for `ops` to `output_path`
///
/// **Public** - main entry point for lineage output
///
/// # Errors
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
/// * `OutputError::WriteFailed` - I/O error during write
pub fn write_lineage_file(
    ops: &[CompletedOp],
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    info!("Writing lineage to: {}", output_path.display());

    write_lineage(ops, create_output(output_path)?)
}

/// Read op identities back from a lineage JSON array
///
/// **Public** - lets the height computation start from a lineage file
///
/// # Errors
/// * `OutputError::SerializationFailed` - Not a JSON array of records
/// * `OutputError::InvalidRecord` - A record id does not match its op
pub fn read_lineage<R: Read>(reader: R) -> Result<Vec<OpId>, OutputError> {
    let records: Vec<LineageRecord> = serde_json::from_reader(reader)?;
    debug!("Read {} lineage records", records.len());

    records
        .iter()
        .map(|record| {
            record.op_id().ok_or_else(|| {
                OutputError::InvalidRecord(format!(
                    "id '{}' is not valid for a {:?} record",
                    record.id, record.op
                ))
            })
        })
        .collect()
}

/// Format one op as a height input line
pub fn height_line(id: &OpId) -> String {
    match id {
        OpId::Flush(_) => format!("{}{}", FLUSH_LINE_PREFIX, id),
        OpId::Merge { .. } => format!("{}{}", MERGE_LINE_PREFIX, id),
    }
}

/// Write the height input for `ops`, one line per op
///
/// **Public** - op stream writer
pub fn write_height_input<'a, I, W>(ids: I, mut writer: W) -> Result<(), OutputError>
where
    I: IntoIterator<Item = &'a OpId>,
    W: Write,
{
    for id in ids {
        writeln!(writer, "{}", height_line(id))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the height input file for `ops` to `output_path`
pub fn write_height_input_file(
    ops: &[CompletedOp],
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    info!("Writing op stream to: {}", output_path.display());

    write_height_input(ops.iter().map(|op| &op.id), create_output(output_path)?)
}

/// Parse one height input line
///
/// # Returns
/// None for blank lines
///
/// # Errors
/// * `ForestError::MalformedHeightLine` - Neither a flush nor a merge line
pub fn parse_height_line(line_no: usize, line: &str) -> Result<Option<OpId>, ForestError> {
    let trimmed = line.trim_end();
    if trimmed.trim().is_empty() {
        return Ok(None);
    }

    let malformed = || ForestError::MalformedHeightLine {
        line: line_no,
        content: trimmed.to_string(),
    };

    let id = if let Some(rest) = trimmed.strip_prefix(FLUSH_LINE_PREFIX) {
        rest.trim().parse().ok().map(OpId::Flush)
    } else if let Some(rest) = trimmed.strip_prefix(MERGE_LINE_PREFIX) {
        rest.trim().split_once('-').and_then(|(b, e)| {
            Some(OpId::Merge {
                begin: b.trim().parse().ok()?,
                end: e.trim().parse().ok()?,
            })
        })
    } else {
        None
    };

    id.map(Some).ok_or_else(malformed)
}

/// Read a whole height input stream
///
/// **Public** - height input reader
pub fn read_height_input<R: BufRead>(reader: R) -> Result<Vec<OpId>, ForestError> {
    let mut ids = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        if let Some(id) = parse_height_line(index + 1, &line?)? {
            ids.push(id);
        }
    }
    debug!("Read {} ops from height input", ids.len());
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_ops() -> Vec<CompletedOp> {
        vec![
            CompletedOp {
                id: OpId::Flush(0),
                duration_micros: 12,
                size_bytes: Some(10),
            },
            CompletedOp {
                id: OpId::Flush(1),
                duration_micros: 8,
                size_bytes: Some(20),
            },
            CompletedOp {
                id: OpId::Merge { begin: 0, end: 1 },
                duration_micros: 40,
                size_bytes: Some(30),
            },
        ]
    }

    #[test]
    fn test_lineage_layout() {
        let mut out = Vec::new();
        write_lineage(&sample_ops(), &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "[\n\
             {\"op\":\"flush\",\"id\":\"0\",\"duration\":12,\"size\":10},\n\
             {\"op\":\"flush\",\"id\":\"1\",\"duration\":8,\"size\":20},\n\
             {\"op\":\"merge\",\"id\":\"0-1\",\"duration\":40,\"size\":30}\n\
             ]"
        );
    }

    #[test]
    fn test_empty_lineage_is_valid_json() {
        let mut out = Vec::new();
        write_lineage(&[], &mut out).unwrap();
        assert!(read_lineage(out.as_slice()).unwrap().is_empty());
    }

    #[test]
    fn test_read_lineage_ids() {
        let mut out = Vec::new();
        write_lineage(&sample_ops(), &mut out).unwrap();

        let ids = read_lineage(out.as_slice()).unwrap();
        assert_eq!(
            ids,
            vec![OpId::Flush(0), OpId::Flush(1), OpId::Merge { begin: 0, end: 1 }]
        );
    }

    #[test]
    fn test_read_lineage_rejects_bad_id() {
        let input = r#"[{"op":"merge","id":"7","duration":1,"size":1}]"#;
        assert!(matches!(
            read_lineage(input.as_bytes()),
            Err(OutputError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_height_input_text() {
        let mut out = Vec::new();
        let ops = sample_ops();
        write_height_input(ops.iter().map(|op| &op.id), &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "flush -> 0\nflush -> 1\nmerge -> 0-1\n"
        );
    }

    #[test]
    fn test_parse_height_lines() {
        let input = "flush -> 0\nflush -> 1\n\nmerge -> 0-1  \n";
        let ids = read_height_input(input.as_bytes()).unwrap();
        assert_eq!(
            ids,
            vec![OpId::Flush(0), OpId::Flush(1), OpId::Merge { begin: 0, end: 1 }]
        );
    }

    #[test]
    fn test_malformed_height_line() {
        let err = read_height_input("flush -> 0\nsplit -> 1\n".as_bytes()).unwrap_err();
        match err {
            ForestError::MalformedHeightLine { line, content } => {
                assert_eq!(line, 2);
                assert_eq!(content, "split -> 1");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(parse_height_line(1, "merge -> 4").is_err());
        assert!(parse_height_line(1, "flush -> x").is_err());
    }
}
