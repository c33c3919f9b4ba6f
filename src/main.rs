use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tinysql::{Config, Engine, ResultCode};

/// Run one SQL query over CSV tables
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Query text, e.g. "SELECT * FROM TABLE1"
    #[arg(value_name = "SQL")]
    sql: Option<String>,

    /// Read the query from a file instead
    #[arg(short, long, value_name = "FILE", conflicts_with = "sql")]
    file: Option<PathBuf>,

    /// Where the result is written
    #[arg(short, long, value_name = "OUTPUT", default_value = "output.csv")]
    output: PathBuf,

    /// Directory holding the <table>.csv files
    #[arg(short = 'd', long, value_name = "DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Fail with ERR_MEMORY_OVER once a result or sort buffer exceeds N rows
    #[arg(long, value_name = "N")]
    max_rows: Option<usize>,
}

fn read_query(args: &Args) -> Result<String> {
    match (&args.sql, &args.file) {
        (Some(sql), _) => Ok(sql.clone()),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("cannot read query from '{}'", path.display())),
        (None, None) => bail!("no query given; pass SQL or --file"),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let sql = match read_query(&args) {
        Ok(sql) => sql,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let engine = Engine::new(Config {
        data_dir: args.data_dir,
        max_rows: args.max_rows,
    });
    let code = match engine.run(&sql, &args.output) {
        Ok(()) => ResultCode::Ok,
        Err(e) => {
            eprintln!("error: {e}");
            e.code()
        }
    };
    ExitCode::from(code.as_i32() as u8)
}
