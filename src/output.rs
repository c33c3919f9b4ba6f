use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};
use tracing::debug;

use crate::error::{Error, Result};
use crate::executor::Tuple;

#[cfg(windows)]
const LINE_END: &[u8] = b"\r\n";
#[cfg(not(windows))]
const LINE_END: &[u8] = b"\n";

fn line_terminator() -> Terminator {
    if cfg!(windows) {
        Terminator::CRLF
    } else {
        Terminator::Any(b'\n')
    }
}

/// Sibling of `path` the output is staged in before it is renamed into place.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes a header line and one line per row. Fields are written verbatim, never quoted.
/// `path` only appears once every line is on disk.
pub fn write_csv(path: &Path, header: &[String], rows: &[Tuple]) -> Result<()> {
    let tmp_path = staging_path(path);
    let result = write_lines(path, &tmp_path, header, rows).and_then(|()| {
        fs::rename(&tmp_path, path).map_err(|source| Error::FileClose {
            path: path.to_path_buf(),
            source,
        })
    });
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result?;

    debug!(path = %path.display(), rows = rows.len(), "wrote output");
    Ok(())
}

fn write_lines(path: &Path, tmp_path: &Path, header: &[String], rows: &[Tuple]) -> Result<()> {
    let file = File::create(tmp_path).map_err(|source| Error::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let write_error = |source: io::Error| Error::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(line_terminator())
        .from_writer(file);

    write_record(&mut wtr, header).map_err(write_error)?;
    for row in rows {
        let fields = row.values.iter().map(|v| v.to_string()).collect::<Vec<_>>();
        write_record(&mut wtr, &fields).map_err(write_error)?;
    }

    let file = wtr
        .into_inner()
        .map_err(|e| write_error(e.into_error()))?;
    file.sync_all().map_err(|source| Error::FileClose {
        path: path.to_path_buf(),
        source,
    })
}

fn write_record(wtr: &mut Writer<File>, fields: &[String]) -> io::Result<()> {
    // csv quotes a lone empty field so the line is not mistaken for a blank one.
    if let [field] = fields {
        if field.is_empty() {
            wtr.flush()?;
            let mut file: &File = wtr.get_ref();
            return file.write_all(LINE_END);
        }
    }
    wtr.write_record(fields).map_err(io::Error::from)
}
