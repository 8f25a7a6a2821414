//! Delimited-file input and output
//!
//! Input: the first column of every record, no header row.
//! Output: a header row followed by one `Input,Result,Success,Error` row per result.

use std::io::{Read, Write};
use std::path::Path;

use crate::error::Result;
use crate::types::{OutputRow, ProcessResult};

/// Read the first column of every record in `path`
pub fn read_inputs(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let inputs = read_inputs_from(file)?;
    tracing::debug!(path = %path.display(), count = inputs.len(), "read inputs");
    Ok(inputs)
}

/// Read the first column of every record from `reader`
///
/// Records may have differing widths; empty records are skipped.
pub fn read_inputs_from<R: Read>(reader: R) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut inputs = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(first) = record.get(0) {
            inputs.push(first.to_string());
        }
    }
    Ok(inputs)
}

/// Write `results` to `path`, replacing any existing file
pub fn write_results(path: impl AsRef<Path>, results: &[ProcessResult]) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    write_results_to(file, results)?;
    tracing::debug!(path = %path.display(), count = results.len(), "wrote results");
    Ok(())
}

/// Write `results` as delimited records to `writer`
pub fn write_results_to<W: Write>(writer: W, results: &[ProcessResult]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    if results.is_empty() {
        // serialize() only emits the header alongside the first row
        writer.write_record(["Input", "Result", "Success", "Error"])?;
    }
    for result in results {
        writer.serialize(OutputRow::from(result))?;
    }
    writer.flush()?;
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, InvokeError, RetryError};
    use crate::types::{InputItem, ResponsePayload};

    fn item(index: usize, text: &str) -> InputItem {
        InputItem {
            index,
            text: text.to_string(),
        }
    }

    #[test]
    fn reads_first_column_only() {
        let data = "Acme Corp,ignored\nGlobex\n\"Initech, Inc\",x,y\n";
        let inputs = read_inputs_from(data.as_bytes()).unwrap();

        assert_eq!(inputs, vec!["Acme Corp", "Globex", "Initech, Inc"]);
    }

    #[test]
    fn first_row_is_data_not_header() {
        let inputs = read_inputs_from("data\nvalue\n".as_bytes()).unwrap();
        assert_eq!(inputs, vec!["data", "value"]);
    }

    #[test]
    fn empty_input_file_yields_no_inputs() {
        assert!(read_inputs_from("".as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn missing_input_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_inputs(dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, Error::Io(_)), "got {err:?}");
    }

    #[test]
    fn writes_header_and_rows_in_order() {
        let results = vec![
            ProcessResult::from_outcome(
                item(0, "a"),
                Ok(ResponsePayload {
                    result: "found a".into(),
                    success: true,
                    error: None,
                }),
            ),
            ProcessResult::from_outcome(
                item(1, "b"),
                Ok(ResponsePayload {
                    result: String::new(),
                    success: false,
                    error: Some("no match".into()),
                }),
            ),
            ProcessResult::from_outcome(
                item(2, "c"),
                Err(RetryError::Exhausted {
                    attempts: 3,
                    last: InvokeError::Transport("timed out".into()),
                }),
            ),
        ];

        let mut out = Vec::new();
        write_results_to(&mut out, &results).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Input,Result,Success,Error\n\
             a,found a,true,\n\
             b,,false,no match\n\
             c,,false,after 3 attempts: sending request: timed out\n"
        );
    }

    #[test]
    fn empty_results_still_write_header() {
        let mut out = Vec::new();
        write_results_to(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Input,Result,Success,Error\n");
    }

    #[test]
    fn file_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("in.csv");
        let output_path = dir.path().join("out.csv");
        std::fs::write(&input_path, "one\ntwo\n").unwrap();

        let inputs = read_inputs(&input_path).unwrap();
        let results: Vec<_> = InputItem::enumerate(inputs)
            .into_iter()
            .map(|i| ProcessResult::from_outcome(i, Ok(ResponsePayload::default())))
            .collect();
        write_results(&output_path, &results).unwrap();

        let written = std::fs::read_to_string(&output_path).unwrap();
        assert_eq!(
            written,
            "Input,Result,Success,Error\none,,false,\ntwo,,false,\n"
        );
    }
}
