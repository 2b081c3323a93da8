use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, Table as ComfyTable};
use nom::{
    branch::alt,
    bytes::complete::tag,
    combinator::{recognize, rest},
    sequence::tuple,
    IResult,
};
use tracing_subscriber::EnvFilter;

use fluentdb::parser::common::{qualified_identifier, ws};
use fluentdb::{
    CsvTable, DatabaseError, Executable, Operand, QueryBuilder, Row, StoreConfig, Value,
};

/// Query flat-file tables from the command line
#[derive(Parser, Debug)]
#[command(name = "fq")]
#[command(about = "Fluent queries over a directory of CSV tables", long_about = None)]
struct Args {
    /// Config file (TOML); defaults to ./fluentdb.toml when present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Table directory, overrides the config
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Table name
    table: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print matching rows
    Get {
        /// Comma separated columns
        #[arg(short, long, value_delimiter = ',')]
        select: Vec<String>,

        /// Condition such as `age>=30`, `job=rat` or `salary=NULL`; repeat
        /// to AND several conditions
        #[arg(short = 'w', long = "where")]
        conditions: Vec<String>,

        #[arg(short, long, value_delimiter = ',')]
        order_by: Vec<String>,

        #[arg(long)]
        desc: bool,

        #[arg(short, long)]
        limit: Option<usize>,

        /// Print rows as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Count rows, or non-empty values of a column
    Count { column: Option<String> },
    /// Show the table header
    Columns,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("fluentdb={level}")))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// `column op value`, where op is one of = != <> >= <= > <.
fn condition(input: &str) -> IResult<&str, (&str, &str, &str)> {
    tuple((
        ws(recognize(qualified_identifier)),
        alt((tag(">="), tag("<="), tag("!="), tag("<>"), tag("="), tag(">"), tag("<"))),
        rest,
    ))(input)
}

fn parse_condition(input: &str) -> Result<(String, String, Operand), String> {
    let (_, (column, op, raw)) =
        condition(input).map_err(|_| format!("cannot parse condition '{input}'"))?;
    let raw = raw.trim();
    let operand = if raw.eq_ignore_ascii_case("NULL") {
        Operand::Null
    } else {
        Operand::from(Value::from_numeric_text(raw.to_string()))
    };
    Ok((column.to_string(), op.to_string(), operand))
}

fn print_rows(rows: &[Row], json: bool) -> Result<(), DatabaseError> {
    if json {
        for row in rows {
            println!("{}", serde_json::to_string(row)?);
        }
        return Ok(());
    }

    let Some(first) = rows.first() else {
        println!("(0 rows)");
        return Ok(());
    };

    let mut table = ComfyTable::new();
    table.load_preset(UTF8_FULL);
    table.set_header(first.columns().map(Cell::new));
    for row in rows {
        table.add_row(row.iter().map(|(_, v)| Cell::new(v)));
    }
    println!("{table}\n({} rows)", rows.len());
    Ok(())
}

async fn run(args: Args) -> Result<(), DatabaseError> {
    let mut config = StoreConfig::load(args.config.as_deref())?;
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    let store = config.open_csv();
    let mut table: CsvTable = store.table(&args.table);

    match args.command {
        Command::Get {
            select,
            conditions,
            order_by,
            desc,
            limit,
            json,
        } => {
            table.select(select);
            for (i, raw) in conditions.iter().enumerate() {
                let (column, op, operand) =
                    parse_condition(raw).map_err(DatabaseError::InvalidPredicateShape)?;
                if i == 0 {
                    table.filter_op(&column, &op, operand);
                } else {
                    table.and_op(&column, &op, operand);
                }
            }
            if !order_by.is_empty() {
                table.order_by(order_by);
            }
            if desc {
                table.desc();
            }
            if let Some(n) = limit {
                table.limit(n);
            }
            let rows = table.get().await?;
            print_rows(&rows, json)?;
        }
        Command::Count { column } => {
            println!("{}", table.count(column.as_deref()).await?);
        }
        Command::Columns => {
            let mut out = ComfyTable::new();
            out.load_preset(UTF8_FULL);
            out.set_header(vec!["column", "default"]);
            for column in table.columns().await? {
                let default = column
                    .default_value
                    .map_or_else(String::new, |v| v.to_string());
                out.add_row(vec![column.name, default]);
            }
            println!("{out}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
