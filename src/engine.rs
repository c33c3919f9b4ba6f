use std::path::{Path, PathBuf};

use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::analyzer::{Analyzer, Schema};
use crate::error::{Result, ResultCode};
use crate::executor::{ExecutionEngine, Tuple};
use crate::output::write_csv;
use crate::parser::parse;
use crate::table::InputTable;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the `<table>.csv` files.
    pub data_dir: PathBuf,
    /// Upper bound on the rows a sort buffer or the final result may hold.
    pub max_rows: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("."),
            max_rows: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Tuple>,
}

pub struct Engine {
    config: Config,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        Engine { config }
    }

    /// Runs `sql` and writes the result to `output_path`, reporting failure as a code.
    pub fn execute(&self, sql: &str, output_path: &Path) -> ResultCode {
        match self.run(sql, output_path) {
            Ok(()) => ResultCode::Ok,
            Err(e) => {
                let code = e.code();
                warn!(error = %e, code = code.as_i32(), "query failed");
                code
            }
        }
    }

    /// Like [`Engine::execute`], but keeps the error. Nothing is written unless the query
    /// succeeds.
    pub fn run(&self, sql: &str, output_path: &Path) -> Result<()> {
        let result = self.query(sql)?;
        write_csv(output_path, &result.columns, &result.rows)
    }

    pub fn query(&self, sql: &str) -> Result<QueryResult> {
        let plan = parse(sql)?;

        // FROM T, t shares one load.
        let mut loaded: IndexMap<String, InputTable> = IndexMap::new();
        for name in &plan.table_names {
            if let Entry::Vacant(entry) = loaded.entry(name.to_ascii_lowercase()) {
                entry.insert(InputTable::load(&self.config.data_dir, name)?);
            }
        }
        let tables = plan
            .table_names
            .iter()
            .filter_map(|name| loaded.get(&name.to_ascii_lowercase()))
            .collect::<Vec<_>>();
        debug!(
            distinct = loaded.len(),
            joined = tables.len(),
            "tables loaded"
        );

        let schema = Schema::from_tables(&tables);
        let query = Analyzer::new(&schema).analyze(plan)?;
        let rows =
            ExecutionEngine::new(&tables, &schema, self.config.max_rows).execute(&query)?;

        Ok(QueryResult {
            columns: query.header(),
            rows,
        })
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(Config::default())
    }
}
