// CSV-backed input tables.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::ast::Column;
use crate::error::{Error, Result};
use crate::executor::Tuple;
use crate::tuple::{is_integer_text, DataType, Value};

#[derive(Debug, Clone)]
pub struct InputTable {
    pub name: String,
    /// Qualified with `name`.
    pub columns: Vec<Column>,
    pub column_types: Vec<DataType>,
    pub rows: Vec<Tuple>,
}

impl InputTable {
    /// Reads `<name>.csv` from `dir`.
    pub fn load(dir: &Path, name: &str) -> Result<Self> {
        let path = locate(dir, name)?;
        let file = File::open(&path).map_err(|source| Error::FileOpen {
            path: path.clone(),
            source,
        })?;
        let table = InputTable::from_reader(name, file, &path)?;
        debug!(
            table = name,
            path = %path.display(),
            columns = table.columns.len(),
            rows = table.rows.len(),
            "loaded table"
        );
        Ok(table)
    }

    /// Parses CSV text: a header line, then data rows of the same width.
    /// `path` is only used in error reports.
    pub fn from_reader<R: Read>(name: &str, reader: R, path: &Path) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .quoting(false)
            .trim(Trim::None)
            .flexible(false)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| csv_error(path, e))?
            .clone();
        if headers.is_empty() {
            return Err(Error::CsvSyntax {
                path: path.to_path_buf(),
                reason: "missing header line".into(),
            });
        }

        let records = rdr
            .records()
            .collect::<std::result::Result<Vec<StringRecord>, _>>()
            .map_err(|e| csv_error(path, e))?;

        let width = headers.len();
        let mut column_types = Vec::with_capacity(width);
        let mut rows: Vec<Tuple> = records
            .iter()
            .map(|_| Tuple::new(Vec::with_capacity(width)))
            .collect();

        for i in 0..width {
            let integers = records
                .iter()
                .map(|record| integer_cell(&record[i]))
                .collect::<Option<Vec<i64>>>();
            match integers {
                Some(values) => {
                    column_types.push(DataType::Integer);
                    for (row, n) in rows.iter_mut().zip(values) {
                        row.values.push(Value::Integer(n));
                    }
                }
                None => {
                    column_types.push(DataType::String);
                    for (row, record) in rows.iter_mut().zip(&records) {
                        row.values.push(Value::String(record[i].to_string()));
                    }
                }
            }
        }

        Ok(InputTable {
            name: name.to_string(),
            columns: headers
                .iter()
                .map(|header| Column::qualified(name, header))
                .collect(),
            column_types,
            rows,
        })
    }
}

fn integer_cell(text: &str) -> Option<i64> {
    if is_integer_text(text) {
        text.parse().ok()
    } else {
        None
    }
}

fn csv_error(path: &Path, err: csv::Error) -> Error {
    let reason = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => Error::FileOpen {
            path: path.to_path_buf(),
            source,
        },
        _ => Error::CsvSyntax {
            path: path.to_path_buf(),
            reason,
        },
    }
}

/// `<dir>/<name>.csv`, or else the `.csv` file in `dir` whose stem equals `name`
/// ignoring ASCII case.
pub fn locate(dir: &Path, name: &str) -> Result<PathBuf> {
    let exact = dir.join(format!("{name}.csv"));
    if exact.is_file() {
        return Ok(exact);
    }

    let entries = fs::read_dir(dir).map_err(|source| Error::FileOpen {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
                && path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .is_some_and(|stem| stem.eq_ignore_ascii_case(name))
        })
        .collect();
    candidates.sort();

    candidates.into_iter().next().ok_or_else(|| Error::FileOpen {
        path: exact,
        source: io::Error::new(io::ErrorKind::NotFound, "no such table file"),
    })
}
