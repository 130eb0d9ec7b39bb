//! `hrql` — a small CLI for parsing/compiling HRQL expressions, grounded in
//! `prqlc-cli`'s `cli::main` (env_logger + color_eyre + clap, exit(1) on
//! error). Compiles against the bundled fixture catalog (spec §4.11) rather
//! than a real database, since connection management is out of scope (spec
//! §1).

use std::process::exit;

use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use hrql::{compile, plan::Plan, sql, testing};

#[derive(Parser, Debug)]
#[command(name = "hrql", about = "Parse and compile HRQL expressions", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse an expression and print its AST.
    Parse {
        expr: String,
        #[arg(value_enum, long, default_value = "yaml")]
        format: Format,
    },
    /// Parse and compile an expression and print the resulting Plan.
    Plan {
        expr: String,
        /// The requesting employee's id, required when the expression uses `self`.
        #[arg(long)]
        self_id: Option<Uuid>,
        #[arg(value_enum, long, default_value = "yaml")]
        format: Format,
    },
    /// Parse, compile, and translate an expression into parameterized SQL.
    Compile {
        expr: String,
        #[arg(long)]
        self_id: Option<Uuid>,
    },
}

#[derive(ValueEnum, Clone, Debug)]
enum Format {
    Json,
    Yaml,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::eyre::Result<()> {
    env_logger::builder().format_timestamp(None).init();
    color_eyre::install()?;
    let cli = Cli::parse();

    if let Err(error) = run(cli).await {
        eprintln!("{error}");
        exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Parse { expr, format } => {
            let ast = hrql_parser::parse(&expr)?;
            print_serialized(&ast, format)?;
        }
        Command::Plan {
            expr,
            self_id,
            format,
        } => {
            let plan = compile_plan(&expr, self_id).await?;
            print_serialized(&plan, format)?;
        }
        Command::Compile { expr, self_id } => {
            let plan = compile_plan(&expr, self_id).await?;
            let catalog = testing::fixture_catalog();
            let query = sql::translate(&plan, &catalog, &[], None)?;
            println!("{}", query.sql);
            for (i, param) in query.params.iter().enumerate() {
                println!("  ${} = {:?}", i + 1, param);
            }
        }
    }
    Ok(())
}

async fn compile_plan(expr: &str, self_id: Option<Uuid>) -> anyhow::Result<Plan> {
    let ast = hrql_parser::parse(expr)?;
    let catalog = std::sync::Arc::new(testing::fixture_catalog());
    let resolver = testing::MemoryResolver::new();
    let plan = compile::compile(&ast, catalog, &resolver, self_id, CancellationToken::new()).await?;
    Ok(plan)
}

fn print_serialized<T: serde::Serialize>(value: &T, format: Format) -> anyhow::Result<()> {
    let text = match format {
        Format::Json => serde_json::to_string_pretty(value)?,
        Format::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{text}");
    Ok(())
}
