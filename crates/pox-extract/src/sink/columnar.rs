//! Parquet object table.
//!
//! # Schema: `pox_object_table_v1`
//!
//! | Column                   | Arrow Type      | Description                               |
//! |--------------------------|-----------------|-------------------------------------------|
//! | `runno`                  | `Int64`         | Run number                                |
//! | `evtno`                  | `Int64`         | Event number                              |
//! | `nmu` / `nelectron`      | `Int32`         | Objects recorded for the event            |
//! | `<prefix>_<attribute>`   | `List<Float32>` | One value per recorded object             |
//!
//! Sequences are ragged across events but never within one: every list in a
//! row has `n<object>` entries.
//!
//! ## Parquet key-value metadata
//!
//! | Key                        | Value                       |
//! |----------------------------|-----------------------------|
//! | `pox.schema_version`       | `"pox_object_table_v1"`     |
//! | `pox.object_kind`          | `"muon"` / `"electron"`     |
//! | `pox.input_collection`     | Input collection label      |

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, Float32Builder, Int32Builder, Int64Builder, ListBuilder,
    PrimitiveArray,
};
use arrow::datatypes::{
    ArrowPrimitiveType, DataType, Field, Float32Type, Int32Type, Int64Type, Schema, SchemaRef,
};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use pox_core::{Error, EventId, ObjectKind, Result};

use super::{TabularSink, WriteOutcome};
use crate::accumulator::{EventRow, FillPolicy};
use crate::selector::Attribute;

/// Schema version string embedded in Parquet key-value metadata.
pub const OBJECT_TABLE_SCHEMA_V1: &str = "pox_object_table_v1";

/// Parquet metadata key for the schema version.
pub const META_KEY_SCHEMA_VERSION: &str = "pox.schema_version";

/// Parquet metadata key for the object kind.
pub const META_KEY_OBJECT_KIND: &str = "pox.object_kind";

/// Parquet metadata key for the input collection label.
pub const META_KEY_INPUT_COLLECTION: &str = "pox.input_collection";

/// Run number column.
pub const RUN_COLUMN: &str = "runno";

/// Event number column.
pub const EVENT_COLUMN: &str = "evtno";

/// Rows buffered before a record batch is handed to the Parquet writer.
pub const DEFAULT_ROW_GROUP_SIZE: usize = 1024;

/// Options for [`ColumnarSink`].
#[derive(Debug, Clone)]
pub struct ColumnarOptions {
    /// Input collection label, recorded in the file metadata.
    pub input_collection: String,
    /// Rows per record batch / row group.
    pub row_group_size: usize,
}

impl ColumnarOptions {
    /// Options with the default row group size.
    pub fn new(input_collection: impl Into<String>) -> Self {
        Self { input_collection: input_collection.into(), row_group_size: DEFAULT_ROW_GROUP_SIZE }
    }
}

fn list_type() -> DataType {
    DataType::List(Arc::new(Field::new_list_field(DataType::Float32, true)))
}

/// Arrow schema of the object table for `kind`.
pub fn object_table_schema(kind: ObjectKind, input_collection: &str) -> SchemaRef {
    let mut fields = vec![
        Field::new(RUN_COLUMN, DataType::Int64, false),
        Field::new(EVENT_COLUMN, DataType::Int64, false),
        Field::new(kind.count_column(), DataType::Int32, false),
    ];
    fields.extend(
        Attribute::columnar_layout(kind)
            .iter()
            .map(|a| Field::new(a.column_name(kind), list_type(), false)),
    );

    let metadata = HashMap::from([
        (META_KEY_SCHEMA_VERSION.to_string(), OBJECT_TABLE_SCHEMA_V1.to_string()),
        (META_KEY_OBJECT_KIND.to_string(), kind.as_str().to_string()),
        (META_KEY_INPUT_COLLECTION.to_string(), input_collection.to_string()),
    ]);

    Arc::new(Schema::new(fields).with_metadata(metadata))
}

fn default_compression() -> Compression {
    #[cfg(feature = "parquet-zstd")]
    {
        Compression::ZSTD(Default::default())
    }
    #[cfg(not(feature = "parquet-zstd"))]
    {
        Compression::SNAPPY
    }
}

/// Columnar sink writing one Parquet row per event.
///
/// Rows are buffered in Arrow builders and flushed every `row_group_size`
/// rows; [`TabularSink::close`] flushes the remainder and writes the footer.
/// A sink dropped without `close` leaves an unreadable file.
pub struct ColumnarSink<W: Write + Send> {
    target: String,
    attributes: &'static [Attribute],
    schema: SchemaRef,
    writer: Option<ArrowWriter<W>>,
    run: Int64Builder,
    event: Int64Builder,
    count: Int32Builder,
    lists: Vec<ListBuilder<Float32Builder>>,
    buffered: usize,
    row_group_size: usize,
    rows_written: u64,
}

impl ColumnarSink<File> {
    /// Create (or truncate) the table at `path` and declare its schema.
    pub fn create(path: &Path, kind: ObjectKind, options: &ColumnarOptions) -> Result<Self> {
        let file = File::create(path).map_err(|e| {
            Error::Output(format!("failed to create {}: {e}", path.display()))
        })?;
        Self::with_target(file, path.display().to_string(), kind, options)
    }
}

impl<W: Write + Send> ColumnarSink<W> {
    /// Open a table over an arbitrary writer (e.g. an in-memory buffer).
    pub fn new(writer: W, kind: ObjectKind, options: &ColumnarOptions) -> Result<Self> {
        Self::with_target(writer, "<memory>".to_string(), kind, options)
    }

    fn with_target(
        writer: W,
        target: String,
        kind: ObjectKind,
        options: &ColumnarOptions,
    ) -> Result<Self> {
        if options.row_group_size == 0 {
            return Err(Error::Validation("row_group_size must be >= 1".into()));
        }
        let attributes = Attribute::columnar_layout(kind);
        let schema = object_table_schema(kind, &options.input_collection);
        let props = WriterProperties::builder()
            .set_compression(default_compression())
            .set_max_row_group_size(options.row_group_size)
            .build();
        let writer = ArrowWriter::try_new(writer, schema.clone(), Some(props)).map_err(|e| {
            Error::Output(format!("failed to create Parquet writer for {target}: {e}"))
        })?;

        tracing::info!(
            target_file = %target,
            kind = %kind,
            columns = schema.fields().len(),
            "opened columnar object table"
        );

        Ok(Self {
            target,
            attributes,
            schema,
            writer: Some(writer),
            run: Int64Builder::new(),
            event: Int64Builder::new(),
            count: Int32Builder::new(),
            lists: attributes.iter().map(|_| ListBuilder::new(Float32Builder::new())).collect(),
            buffered: 0,
            row_group_size: options.row_group_size,
            rows_written: 0,
        })
    }

    /// Rows accepted so far (flushed or buffered).
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    fn flush_batch(&mut self) -> Result<()> {
        if self.buffered == 0 {
            return Ok(());
        }
        let Some(writer) = self.writer.as_mut() else {
            return Err(Error::Output(format!("{}: sink already closed", self.target)));
        };

        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(3 + self.lists.len());
        arrays.push(Arc::new(self.run.finish()));
        arrays.push(Arc::new(self.event.finish()));
        arrays.push(Arc::new(self.count.finish()));
        arrays.extend(self.lists.iter_mut().map(|b| Arc::new(b.finish()) as ArrayRef));

        let batch = RecordBatch::try_new(self.schema.clone(), arrays)
            .map_err(|e| Error::Output(format!("failed to build RecordBatch: {e}")))?;
        writer
            .write(&batch)
            .map_err(|e| Error::Output(format!("failed to write Parquet {}: {e}", self.target)))?;

        tracing::debug!(rows = self.buffered, "flushed record batch");
        self.buffered = 0;
        Ok(())
    }
}

impl<W: Write + Send> TabularSink for ColumnarSink<W> {
    fn fill_policy(&self) -> FillPolicy {
        FillPolicy::Sentinel
    }

    fn write_row(&mut self, row: &EventRow) -> Result<WriteOutcome> {
        if self.writer.is_none() {
            return Err(Error::Output(format!("{}: write after close", self.target)));
        }
        if row.attributes() != self.attributes {
            return Err(Error::Validation(format!(
                "event {}: row layout does not match table columns",
                row.id()
            )));
        }
        let count = i32::try_from(row.count()).map_err(|_| {
            Error::Output(format!(
                "event {}: object count {} overflows Int32",
                row.id(),
                row.count()
            ))
        })?;

        let id = row.id();
        self.run.append_value(id.run);
        self.event.append_value(id.event);
        self.count.append_value(count);
        for (builder, (_, values)) in self.lists.iter_mut().zip(row.columns()) {
            builder.values().append_slice(values);
            builder.append(true);
        }
        self.buffered += 1;
        self.rows_written += 1;

        if self.buffered >= self.row_group_size {
            self.flush_batch()?;
        }
        Ok(WriteOutcome::Written)
    }

    fn close(&mut self) -> Result<()> {
        if self.writer.is_none() {
            return Ok(());
        }
        self.flush_batch()?;
        if let Some(writer) = self.writer.take() {
            writer.close().map_err(|e| {
                Error::Output(format!("failed to close Parquet writer {}: {e}", self.target))
            })?;
        }
        tracing::info!(
            target_file = %self.target,
            rows = self.rows_written,
            "closed columnar object table"
        );
        Ok(())
    }
}

impl<W: Write + Send> Drop for ColumnarSink<W> {
    fn drop(&mut self) {
        if self.writer.is_some() {
            tracing::warn!(
                target_file = %self.target,
                rows = self.rows_written,
                "columnar sink dropped without close(); output is incomplete"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Read back
// ---------------------------------------------------------------------------

/// A decoded object table.
#[derive(Debug, Clone)]
pub struct ObjectTable {
    /// Object kind recorded in the metadata.
    pub kind: ObjectKind,
    /// Input collection recorded in the metadata.
    pub input_collection: String,
    /// One row per event, in file order.
    pub rows: Vec<EventRow>,
}

impl ObjectTable {
    /// Total objects across all rows.
    pub fn total_objects(&self) -> usize {
        self.rows.iter().map(EventRow::count).sum()
    }
}

/// Read an object table from a Parquet file.
pub fn read_object_table(path: &Path) -> Result<ObjectTable> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| Error::Validation(format!("failed to open Parquet {}: {e}", path.display())))?;
    decode_table(builder)
}

/// Read an object table from Parquet bytes in memory.
pub fn read_object_table_bytes(data: &[u8]) -> Result<ObjectTable> {
    let buf = bytes::Bytes::copy_from_slice(data);
    let builder = ParquetRecordBatchReaderBuilder::try_new(buf)
        .map_err(|e| Error::Validation(format!("failed to open Parquet bytes: {e}")))?;
    decode_table(builder)
}

fn decode_table<T: parquet::file::reader::ChunkReader + 'static>(
    builder: ParquetRecordBatchReaderBuilder<T>,
) -> Result<ObjectTable> {
    let metadata = builder.schema().metadata().clone();
    match metadata.get(META_KEY_SCHEMA_VERSION).map(String::as_str) {
        Some(OBJECT_TABLE_SCHEMA_V1) => {}
        Some(other) => {
            return Err(Error::Validation(format!("unsupported object table schema '{other}'")));
        }
        None => return Err(Error::Validation("missing pox.schema_version metadata".into())),
    }
    let kind: ObjectKind = metadata
        .get(META_KEY_OBJECT_KIND)
        .ok_or_else(|| Error::Validation("missing pox.object_kind metadata".into()))?
        .parse()?;
    let input_collection = metadata.get(META_KEY_INPUT_COLLECTION).cloned().unwrap_or_default();

    let reader = builder
        .build()
        .map_err(|e| Error::Validation(format!("failed to build Parquet reader: {e}")))?;

    let attributes = Attribute::columnar_layout(kind);
    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch.map_err(|e| Error::Validation(format!("failed to read batch: {e}")))?;
        let runs = primitive_column::<Int64Type>(&batch, RUN_COLUMN)?;
        let events = primitive_column::<Int64Type>(&batch, EVENT_COLUMN)?;
        let counts = primitive_column::<Int32Type>(&batch, kind.count_column())?;
        let lists = attributes
            .iter()
            .map(|a| {
                let name = a.column_name(kind);
                batch
                    .column_by_name(&name)
                    .and_then(|c| c.as_list_opt::<i32>())
                    .ok_or_else(|| Error::Validation(format!("missing list column '{name}'")))
            })
            .collect::<Result<Vec<_>>>()?;

        for i in 0..batch.num_rows() {
            let id = EventId::new(runs.value(i), events.value(i));
            let columns = lists
                .iter()
                .map(|l| {
                    let values = l.value(i);
                    values
                        .as_primitive_opt::<Float32Type>()
                        .map(|v| v.values().to_vec())
                        .ok_or_else(|| Error::Validation("list values must be Float32".into()))
                })
                .collect::<Result<Vec<_>>>()?;
            let row = EventRow::from_columns(id, attributes, columns)?;
            if i64::from(counts.value(i)) != row.count() as i64 {
                return Err(Error::Validation(format!(
                    "event {id}: {} = {} but sequences hold {} entries",
                    kind.count_column(),
                    counts.value(i),
                    row.count()
                )));
            }
            rows.push(row);
        }
    }

    Ok(ObjectTable { kind, input_collection, rows })
}

fn primitive_column<'a, T: ArrowPrimitiveType>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a PrimitiveArray<T>> {
    let col = batch
        .column_by_name(name)
        .ok_or_else(|| Error::Validation(format!("missing column '{name}'")))?;
    if col.null_count() > 0 {
        return Err(Error::Validation(format!("column '{name}' contains nulls")));
    }
    col.as_primitive_opt::<T>()
        .ok_or_else(|| Error::Validation(format!("column '{name}' has unexpected type")))
}
