//! Job configuration (YAML or JSON).
//!
//! ```yaml
//! input_collection: muons
//! object: muon
//! inputs: [events_a.jsonl, events_b.jsonl]
//! max_events: 100
//! output:
//!   format: delimited
//!   path: MuonObjectInfo.csv
//!   max_slots: 10
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use pox_core::{Error, ObjectKind, Result};

use crate::sink::columnar::DEFAULT_ROW_GROUP_SIZE;
use crate::sink::delimited::{DEFAULT_MAX_SLOTS, check_max_slots};

/// Output discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Parquet table with list-valued attribute columns.
    #[default]
    Columnar,
    /// CSV with fixed object slots per line.
    Delimited,
}

impl OutputFormat {
    /// File extension of the default output path.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Columnar => "parquet",
            OutputFormat::Delimited => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Columnar => "columnar",
            OutputFormat::Delimited => "delimited",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "columnar" | "parquet" => Ok(OutputFormat::Columnar),
            "delimited" | "csv" => Ok(OutputFormat::Delimited),
            other => Err(Error::Validation(format!(
                "unknown output format '{other}': expected 'columnar' or 'delimited'"
            ))),
        }
    }
}

/// Output section of [`ExtractorConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Output discipline.
    #[serde(default)]
    pub format: OutputFormat,
    /// Output file; defaults to `<Kind>ObjectInfo.<ext>` in the working directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Object slots per line (delimited output only).
    #[serde(default = "default_max_slots")]
    pub max_slots: usize,
    /// Rows per Parquet row group (columnar output only).
    #[serde(default = "default_row_group_size")]
    pub row_group_size: usize,
}

fn default_max_slots() -> usize {
    DEFAULT_MAX_SLOTS
}

fn default_row_group_size() -> usize {
    DEFAULT_ROW_GROUP_SIZE
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            path: None,
            max_slots: DEFAULT_MAX_SLOTS,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }
}

/// One extraction job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractorConfig {
    /// Label of the candidate collection read from every event.
    pub input_collection: String,
    /// Object kind (selector and column layout).
    #[serde(default = "default_object")]
    pub object: ObjectKind,
    /// JSON-lines event files, read in order.
    #[serde(default)]
    pub inputs: Vec<PathBuf>,
    /// Stop after this many events.
    #[serde(default)]
    pub max_events: Option<usize>,
    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_object() -> ObjectKind {
    ObjectKind::Muon
}

impl ExtractorConfig {
    /// Minimal config for `collection` with default output settings.
    pub fn new(input_collection: impl Into<String>, object: ObjectKind) -> Self {
        Self {
            input_collection: input_collection.into(),
            object,
            inputs: Vec::new(),
            max_events: None,
            output: OutputConfig::default(),
        }
    }

    /// Check invariants not expressible in the type.
    pub fn validate(&self) -> Result<()> {
        if self.input_collection.trim().is_empty() {
            return Err(Error::Validation("input_collection must be non-empty".into()));
        }
        if self.inputs.is_empty() {
            return Err(Error::Validation("at least one input file is required".into()));
        }
        check_max_slots(self.output.max_slots)?;
        if self.output.row_group_size == 0 {
            return Err(Error::Validation("output.row_group_size must be >= 1".into()));
        }
        Ok(())
    }

    /// Anchor relative `inputs` and `output.path` at `base_dir`.
    pub fn resolve_paths(&mut self, base_dir: &Path) {
        for input in &mut self.inputs {
            *input = resolve_path(base_dir, input);
        }
        if let Some(path) = self.output.path.as_mut() {
            *path = resolve_path(base_dir, path);
        }
    }

    /// Output path, explicit or derived from the object kind and format.
    pub fn output_path(&self) -> PathBuf {
        self.output.path.clone().unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}.{}",
                self.object.default_file_stem(),
                self.output.format.extension()
            ))
        })
    }
}

fn resolve_path(base_dir: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() { p.to_path_buf() } else { base_dir.join(p) }
}

/// Read a job config; `.json` files are parsed as JSON, anything else as YAML.
///
/// Relative input and output paths are taken relative to the config file's
/// directory. The default output path stays in the working directory.
pub fn read_config(path: &Path) -> Result<ExtractorConfig> {
    let bytes = std::fs::read(path)?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
    let mut cfg: ExtractorConfig = if ext == "json" {
        serde_json::from_slice(&bytes)?
    } else {
        serde_yaml_ng::from_slice(&bytes).map_err(|e| {
            Error::Validation(format!("invalid YAML config {}: {e}", path.display()))
        })?
    };
    cfg.resolve_paths(path.parent().unwrap_or_else(|| Path::new(".")));
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_defaults() {
        let cfg: ExtractorConfig =
            serde_yaml_ng::from_str("input_collection: muons\ninputs: [a.jsonl]\n").unwrap();
        assert_eq!(cfg.object, ObjectKind::Muon);
        assert_eq!(cfg.output.format, OutputFormat::Columnar);
        assert_eq!(cfg.output.max_slots, 5);
        assert_eq!(cfg.max_events, None);
        assert_eq!(cfg.output_path(), PathBuf::from("MuonObjectInfo.parquet"));
        cfg.validate().unwrap();
    }

    #[test]
    fn test_json_full() {
        let cfg: ExtractorConfig = serde_json::from_str(
            r#"{"input_collection":"electrons","object":"electron","inputs":["e.jsonl"],
                "max_events":100,"output":{"format":"delimited","max_slots":10}}"#,
        )
        .unwrap();
        assert_eq!(cfg.object, ObjectKind::Electron);
        assert_eq!(cfg.max_events, Some(100));
        assert_eq!(cfg.output.max_slots, 10);
        assert_eq!(cfg.output_path(), PathBuf::from("ElectronObjectInfo.csv"));
    }

    #[test]
    fn test_read_yaml_fixture() {
        let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../tests/fixtures");
        let cfg = read_config(&fixtures.join("muon_job.yaml")).unwrap();
        assert_eq!(cfg.input_collection, "muons");
        assert_eq!(cfg.output.format, OutputFormat::Delimited);
        assert_eq!(cfg.output.max_slots, 10);
        assert_eq!(cfg.max_events, Some(100));
        assert_eq!(cfg.inputs, vec![fixtures.join("muon_events.jsonl")]);
        assert!(cfg.inputs[0].is_file());
        assert_eq!(cfg.output_path(), PathBuf::from("MuonObjectInfo.csv"));
    }

    #[test]
    fn test_relative_paths_follow_config_dir() {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("pox_cfg_{}_{nanos}", std::process::id()));
        std::fs::create_dir_all(dir.join("jobs")).unwrap();
        let abs = dir.join("abs.jsonl");
        let body = serde_json::json!({
            "input_collection": "muons",
            "inputs": ["data/a.jsonl", abs],
            "output": { "path": "out/table.parquet" },
        });
        let cfg_path = dir.join("jobs/job.json");
        std::fs::write(&cfg_path, serde_json::to_vec(&body).unwrap()).unwrap();

        let cfg = read_config(&cfg_path).unwrap();
        assert_eq!(cfg.inputs, vec![dir.join("jobs/data/a.jsonl"), abs]);
        assert_eq!(cfg.output_path(), dir.join("jobs/out/table.parquet"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_validation_errors() {
        let mut cfg = ExtractorConfig::new("muons", ObjectKind::Muon);
        assert!(cfg.validate().is_err(), "no inputs");
        cfg.inputs.push("a.jsonl".into());
        cfg.output.max_slots = 0;
        assert!(cfg.validate().is_err());
        cfg.output.max_slots = usize::MAX;
        assert!(matches!(cfg.validate(), Err(Error::Validation(_))));
        cfg.output.max_slots = crate::sink::MAX_SLOTS_LIMIT;
        cfg.validate().unwrap();
        cfg.output.max_slots = 1;
        cfg.input_collection = " ".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let res: std::result::Result<ExtractorConfig, _> =
            serde_yaml_ng::from_str("input_collection: muons\nmaxNumberMuons: 3\n");
        assert!(res.is_err());
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Delimited);
        assert_eq!("parquet".parse::<OutputFormat>().unwrap(), OutputFormat::Columnar);
        assert!("root".parse::<OutputFormat>().is_err());
    }
}
