use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::DataError;
use super::model::{Column, TimeSeries, Value, TIME};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a timestamped table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one column named `time` (recommended)
/// * `.parquet` – flat numeric / boolean / string columns
/// * `.json`    – `[{ "time": ..., "t1": ..., ... }, ...]`
pub fn load_file(path: &Path) -> Result<TimeSeries> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let series = match ext.as_str() {
        "csv" => load_csv(path),
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} rows with columns {:?} from {}",
        series.len(),
        series.column_names(),
        path.display()
    );
    Ok(series)
}

/// Assemble a series from named cell columns, pulling out `time`.
fn build_series(names: Vec<String>, cells: Vec<Vec<Value>>) -> Result<TimeSeries> {
    let time_idx = names
        .iter()
        .position(|h| h == TIME)
        .ok_or_else(|| DataError::MissingColumn(TIME.to_string()))?;

    let mut time = Vec::new();
    let mut columns = Vec::with_capacity(names.len().saturating_sub(1));
    for (idx, (name, values)) in names.into_iter().zip(cells).enumerate() {
        if idx == time_idx {
            time = parse_time(values)?;
        } else {
            columns.push((name, Column::from_values(values)));
        }
    }
    Ok(TimeSeries::new(time, columns)?)
}

fn parse_time(values: Vec<Value>) -> Result<Vec<f64>, DataError> {
    values
        .into_iter()
        .enumerate()
        .map(|(row, v)| match v {
            Value::Integer(i) => Ok(i as f64),
            Value::Float(f) if !f.is_nan() => Ok(f),
            other => Err(DataError::InvalidValue {
                column: TIME.to_string(),
                row,
                value: other.to_string(),
            }),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, e.g.
///   `time,t1,t2,t3,heater_on,fan_on`
/// or for events `time,event,code`. Quoted fields may carry spaces after
/// the delimiter; cells are trimmed.
fn load_csv(path: &Path) -> Result<TimeSeries> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .context("opening CSV")?;
    read_csv(&mut reader)
}

fn read_csv<R: std::io::Read>(reader: &mut csv::Reader<R>) -> Result<TimeSeries> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut cells: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() != headers.len() {
            bail!(
                "CSV row {row_no}: {} fields but the header has {}",
                record.len(),
                headers.len()
            );
        }
        for (col, value) in record.iter().enumerate() {
            cells[col].push(Value::parse(unquote(value)));
        }
    }

    build_series(headers, cells)
}

/// Strip quotes the CSV reader leaves on fields like `, "lid_open"` where
/// a space precedes the opening quote.
fn unquote(field: &str) -> &str {
    field
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .unwrap_or(field)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`:
///
/// ```json
/// [
///   { "time": 1614861060000000000, "t1": 21.3, "heater_on": true },
///   ...
/// ]
/// ```
/// Columns appear in the order their keys are first seen; a key missing
/// from a record is null there.
fn load_json(path: &Path) -> Result<TimeSeries> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut objects = Vec::with_capacity(records.len());
    let mut names: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
        objects.push(obj);
    }
    if names.is_empty() {
        names.push(TIME.to_string());
    }

    let mut cells: Vec<Vec<Value>> = vec![Vec::with_capacity(objects.len()); names.len()];
    for obj in &objects {
        for (col, name) in names.iter().enumerate() {
            cells[col].push(obj.get(name).map_or(Value::Null, json_to_value));
        }
    }

    build_series(names, cells)
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of flat columns.
///
/// Expected schema: a `time` column (Int64 or Float64), other columns of
/// Int32/Int64/Float32/Float64/Boolean/Utf8. Works with files written by
/// both **Pandas** (`df.to_parquet()`) and **Polars**.
fn load_parquet(path: &Path) -> Result<TimeSeries> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut cells: Vec<Vec<Value>> = vec![Vec::new(); names.len()];

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (col, column_cells) in cells.iter_mut().enumerate() {
            let array = batch.column(col);
            for row in 0..batch.num_rows() {
                let value = extract_value(array, row)
                    .with_context(|| format!("Row {row}: failed to read '{}'", names[col]))?;
                column_cells.push(value);
            }
        }
    }

    build_series(names, cells)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> Result<Value> {
    if col.is_null(row) {
        return Ok(Value::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => {
            let arr = col.as_any().downcast_ref::<StringArray>().context("expected StringArray")?;
            Value::String(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => Value::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>().context("expected Int32Array")?;
            Value::Integer(arr.value(row) as i64)
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().context("expected Int64Array")?;
            Value::Integer(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>().context("expected Float32Array")?;
            Value::Float(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>().context("expected Float64Array")?;
            Value::Float(arr.value(row))
        }
        DataType::Boolean => {
            let arr = col.as_any().downcast_ref::<BooleanArray>().context("expected BooleanArray")?;
            Value::Bool(arr.value(row))
        }
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_columns_get_inferred_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "data.csv",
            "time,t1,t2,t3,heater_on,fan_on\n\
             1614861060000000000,21.0,25.0,26.0,True,False\n\
             1614861063000000000,21.1,25.5,26.5,False,True\n",
        );
        let series = load_file(&path).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.time(), &[1614861060000000000.0, 1614861063000000000.0]);
        assert_eq!(series.numeric("t2").unwrap(), &[25.0, 25.5]);
        assert_eq!(series.flags("heater_on").unwrap(), vec![true, false]);
        assert_eq!(series.column("fan_on").unwrap(), &Column::Boolean(vec![false, true]));
    }

    #[test]
    fn csv_events_keep_text_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "events.csv",
            "time,event,code\n\
             1614861060000000000,\"Lid Opened\", \"lid_open\"\n\
             1614861220000000000,\"Lid Closed\", \"lid_close\"\n",
        );
        let series = load_file(&path).unwrap();
        assert_eq!(series.text("event").unwrap(), &["Lid Opened", "Lid Closed"]);
        assert_eq!(series.text("code").unwrap(), &["lid_open", "lid_close"]);
    }

    #[test]
    fn missing_time_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "data.csv", "t1,t2\n1,2\n");
        let err = load_file(&path).unwrap_err();
        let data_err = err.downcast_ref::<DataError>().unwrap();
        assert_eq!(data_err, &DataError::MissingColumn("time".into()));
    }

    #[test]
    fn non_numeric_time_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "data.csv", "time,t1\n0,1\nnoon,2\n");
        let err = load_file(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::InvalidValue { row: 1, .. })
        ));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_file(Path::new("data.xlsx")).unwrap_err();
        assert!(format!("{err:#}").contains("Unsupported file extension"));
    }

    #[test]
    fn json_records_are_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "data.json",
            r#"[{"time": 0, "t1": 20.5, "heater_on": true},
                {"time": 3, "t1": 20.7, "heater_on": false}]"#,
        );
        let series = load_file(&path).unwrap();
        assert_eq!(series.time(), &[0.0, 3.0]);
        assert_eq!(series.numeric("t1").unwrap(), &[20.5, 20.7]);
        assert_eq!(series.flags("heater_on").unwrap(), vec![true, false]);
    }

    #[test]
    fn json_keeps_key_order_and_late_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "data.json",
            r#"[{"time": 0, "t3": 30.0, "t1": 20.5},
                {"time": 3, "t3": 31.0, "t1": 20.7, "fan_on": 1}]"#,
        );
        let series = load_file(&path).unwrap();
        assert_eq!(series.column_names(), vec!["time", "t3", "t1", "fan_on"]);
        let fan = series.numeric("fan_on").unwrap();
        assert!(fan[0].is_nan());
        assert_eq!(fan[1], 1.0);
    }

    #[test]
    fn parquet_flat_columns_are_loaded() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("time", DataType::Int64, false),
            Field::new("t1", DataType::Float64, true),
            Field::new("heater_on", DataType::Boolean, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![10, 20, 30])),
                Arc::new(Float64Array::from(vec![Some(21.0), None, Some(22.0)])),
                Arc::new(BooleanArray::from(vec![true, true, false])),
            ],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let series = load_file(&path).unwrap();
        assert_eq!(series.time(), &[10.0, 20.0, 30.0]);
        let t1 = series.numeric("t1").unwrap();
        assert_eq!(t1[0], 21.0);
        assert!(t1[1].is_nan());
        assert_eq!(series.flags("heater_on").unwrap(), vec![true, true, false]);
    }
}
