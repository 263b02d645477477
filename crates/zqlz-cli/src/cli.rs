//! `zqlz-optimize` - static optimization advice for a serialized query model
//!
//! ```text
//! zqlz-optimize query.json --config optimizer.toml --format table
//! zqlz-optimize --sql "SELECT * FROM users"
//! ```

mod logging;
mod report;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::io::Read;
use std::path::{Path, PathBuf};
use zqlz_core::QueryModel;
use zqlz_optimizer::{OptimizationResult, OptimizerConfig, QueryOptimizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "zqlz-optimize", version, about = "Suggest indexes, predicate order and join order for a query")]
struct Cli {
    /// Query model as JSON; `-` reads from stdin
    #[arg(required_unless_present = "sql")]
    query: Option<PathBuf>,

    /// Optimizer configuration (TOML)
    #[arg(long, env = "ZQLZ_OPTIMIZER_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Detailed summary and debug logging
    #[arg(long)]
    verbose: bool,

    /// SQL text to submit instead of a query model
    #[arg(long, conflicts_with = "query")]
    sql: Option<String>,

    /// Write logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let logging = if cli.verbose {
        logging::LoggingConfig::verbose()
    } else {
        logging::LoggingConfig::default()
    };
    logging::init(logging.with_json(cli.log_json))?;

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => OptimizerConfig::default(),
    };
    if cli.verbose {
        config = config.with_verbose_output(true);
    }

    let optimizer = QueryOptimizer::with_config(config).context("invalid optimizer configuration")?;

    let result = match (&cli.sql, &cli.query) {
        (Some(sql), _) => optimizer.optimize_sql(sql),
        (None, Some(path)) => {
            let query = load_query(path)?;
            tracing::info!(table = query.table(), predicates = query.predicates().len(), "analyzing query");
            optimizer.optimize(&query).context("query analysis failed")?
        }
        (None, None) => bail!("either a query file or --sql is required"),
    };

    print_result(&result, cli.format)
}

fn load_config(path: &Path) -> Result<OptimizerConfig> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    OptimizerConfig::from_toml_str(&source)
        .with_context(|| format!("failed to load config {}", path.display()))
}

fn load_query(path: &Path) -> Result<QueryModel> {
    let source = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read query from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read query {}", path.display()))?
    };

    serde_json::from_str(&source)
        .with_context(|| format!("failed to parse query model {}", path.display()))
}

fn print_result(result: &OptimizationResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", report::render_tables(result)),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sql_conflicts_with_query() {
        let parsed = Cli::try_parse_from(["zqlz-optimize", "q.json", "--sql", "SELECT 1"]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from(["zqlz-optimize", "--sql", "SELECT 1"]).unwrap();
        assert_eq!(parsed.sql.as_deref(), Some("SELECT 1"));
        assert_eq!(parsed.format, OutputFormat::Table);
    }

    #[test]
    fn test_query_or_sql_required() {
        assert!(Cli::try_parse_from(["zqlz-optimize"]).is_err());
    }

    #[test]
    fn test_format_flag() {
        let parsed = Cli::try_parse_from(["zqlz-optimize", "q.json", "--format", "json"]).unwrap();
        assert_eq!(parsed.format, OutputFormat::Json);
    }
}
