//! JSON-lines event input.
//!
//! Each non-blank line is one [`Event`]:
//!
//! ```json
//! {"run":5,"event":100,"collections":{"muons":[{"energy":52.5,"pt":40.2,"px":30.0,"py":-26.8,
//!   "pz":33.1,"eta":0.75,"phi":-0.73,"charge":-1,"is_global":true,
//!   "combined_track":{"pt":39.5,"eta":0.74,"phi":-0.72}}]}}
//! ```

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use pox_core::{Error, Event, Result};

struct Input {
    label: String,
    reader: Box<dyn BufRead>,
    line_no: usize,
}

/// Iterator over events read from one or more JSON-lines inputs, in order.
///
/// Malformed lines are reported as [`Error::Validation`] naming the input and
/// line number; read errors as [`Error::Io`].
pub struct JsonLinesSource {
    inputs: VecDeque<Input>,
    buf: String,
}

impl JsonLinesSource {
    /// Open every file up front so a missing input fails before any output is created.
    pub fn open<P: Into<PathBuf>>(paths: impl IntoIterator<Item = P>) -> Result<Self> {
        let mut inputs = VecDeque::new();
        for path in paths {
            let path = path.into();
            let file = File::open(&path).map_err(|e| {
                Error::Validation(format!("failed to open input {}: {e}", path.display()))
            })?;
            inputs.push_back(Input {
                label: path.display().to_string(),
                reader: Box::new(BufReader::new(file)),
                line_no: 0,
            });
        }
        if inputs.is_empty() {
            return Err(Error::Validation("at least one input file is required".into()));
        }
        Ok(Self { inputs, buf: String::new() })
    }

    /// Read events from an in-memory or otherwise pre-opened reader.
    pub fn from_reader(label: impl Into<String>, reader: impl BufRead + 'static) -> Self {
        let input = Input { label: label.into(), reader: Box::new(reader), line_no: 0 };
        Self { inputs: VecDeque::from([input]), buf: String::new() }
    }
}

impl Iterator for JsonLinesSource {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let input = self.inputs.front_mut()?;
            self.buf.clear();
            match input.reader.read_line(&mut self.buf) {
                Ok(0) => {
                    tracing::debug!(input = %input.label, lines = input.line_no, "input exhausted");
                    self.inputs.pop_front();
                }
                Ok(_) => {
                    input.line_no += 1;
                    let line = self.buf.trim();
                    if line.is_empty() {
                        continue;
                    }
                    return Some(serde_json::from_str::<Event>(line).map_err(|e| {
                        Error::Validation(format!(
                            "{}:{}: invalid event record: {e}",
                            input.label, input.line_no
                        ))
                    }));
                }
                Err(e) => {
                    self.inputs.clear();
                    return Some(Err(Error::Io(e)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pox_core::{EventId, EventRecord};
    use std::io::Cursor;

    #[test]
    fn test_reads_events_and_skips_blank_lines() {
        let text = "{\"run\":1,\"event\":1,\"collections\":{\"muons\":[]}}\n\n\
                    {\"run\":1,\"event\":2}\n";
        let events: Vec<Event> =
            JsonLinesSource::from_reader("mem", Cursor::new(text)).collect::<Result<_>>().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].id(), EventId::new(1, 2));
        assert!(events[0].collection("muons").is_some());
        assert!(events[1].collection("muons").is_none());
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let text = "{\"run\":1,\"event\":1}\n{\"run\":\n";
        let mut src = JsonLinesSource::from_reader("mem", Cursor::new(text));
        assert!(src.next().unwrap().is_ok());
        let err = src.next().unwrap().unwrap_err().to_string();
        assert!(err.contains("mem:2"), "{err}");
    }

    #[test]
    fn test_event_number_beyond_i64_is_rejected() {
        let max = i64::MAX;
        let text = format!(
            "{{\"run\":1,\"event\":{max}}}\n{{\"run\":1,\"event\":18446744073709551615}}\n"
        );
        let mut src = JsonLinesSource::from_reader("mem", Cursor::new(text));
        assert_eq!(src.next().unwrap().unwrap().id(), EventId::new(1, max));
        let err = src.next().unwrap().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("mem:2"), "{err}");
    }

    #[test]
    fn test_open_requires_inputs() {
        assert!(JsonLinesSource::open(Vec::<PathBuf>::new()).is_err());
        assert!(JsonLinesSource::open(["/definitely/not/here.jsonl"]).is_err());
    }
}
