use clap::{Args, Parser, Subcommand};
use saas_report::{
    config::Settings,
    dashboard::{check_sections, run_dashboard},
    database_schema::load_database_schema,
    diagram::{render_diagram, DOT_FILE, PNG_FILE, SVG_FILE},
    dot_generator::DotStyle,
    error::ReportError,
    logging,
    renderer::{Renderer, INSTALL_HINT},
    report::ReportFormat,
    types::SchemaModel,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;

/// Schema diagrams and metrics reports for the SaaS analytics database.
#[derive(Parser, Debug)]
#[command(name = "saas-report", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write schema_diagram.dot and render it to PNG and SVG with Graphviz
    Erd(ErdArgs),
    /// Print the SaaS metrics dashboard
    Dashboard(DashboardArgs),
}

#[derive(Args, Debug)]
struct ErdArgs {
    /// Directory the diagram files are written to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Graphviz executable
    #[arg(long, env = "GRAPHVIZ_DOT", default_value = "dot")]
    dot: String,

    /// Read the schema from the database instead of the built-in model
    #[arg(long)]
    live: bool,

    /// TOML config file with a [database] table (used with --live)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Graph layout direction (TB, LR, BT, RL)
    #[arg(long, default_value = "TB")]
    rankdir: String,
}

#[derive(Args, Debug)]
struct DashboardArgs {
    /// TOML config file with [database] and [report] tables
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// Exit with status 2 when any report section failed
    #[arg(long)]
    strict: bool,
}

async fn load_schema(live: bool, config: Option<&Path>) -> SchemaModel {
    if !live {
        println!("ℹ Using the built-in schema model");
        return SchemaModel::saas();
    }

    let loaded = match Settings::load(config) {
        Ok(settings) => load_database_schema(&settings).await,
        Err(err) => Err(err.into()),
    };

    match loaded {
        Ok(schema) if !schema.tables.is_empty() => {
            println!("✓ Read {} tables from the database", schema.tables.len());
            schema
        }
        Ok(_) => {
            warn!("database has no tables in the public schema");
            println!("ℹ No tables found, will generate static ERD");
            SchemaModel::saas()
        }
        Err(err) => {
            println!("✗ {}", err);
            println!("ℹ Will generate static ERD without database connection");
            SchemaModel::saas()
        }
    }
}

async fn erd(args: ErdArgs) -> anyhow::Result<ExitCode> {
    let renderer = Renderer::new(args.dot);

    println!("🔧 Checking dependencies...");
    let checked = {
        let renderer = renderer.clone();
        tokio::task::spawn_blocking(move || renderer.check()).await?
    };
    if let Err(err) = checked {
        println!("✗ {}. {}", err, INSTALL_HINT);
        println!("❌ Cannot generate diagrams without Graphviz");
        return Ok(ExitCode::FAILURE);
    }
    println!("✓ Graphviz found");

    let schema = load_schema(args.live, args.config.as_deref()).await;

    println!("\n📊 Generating Entity Relationship Diagram...");
    let style = DotStyle {
        rankdir: args.rankdir,
        ..DotStyle::default()
    };
    let out_dir = args.out_dir;
    let program = renderer.program().to_string();
    let rendered =
        tokio::task::spawn_blocking(move || render_diagram(&renderer, &schema, &style, &out_dir))
            .await?;

    match rendered {
        Ok(artifacts) => {
            println!("✓ Generated {}", artifacts.dot.display());
            println!("✓ Generated {}", artifacts.png.display());
            println!("✓ Generated {}", artifacts.svg.display());
            println!("\n🎉 Schema diagrams generated successfully!");
            println!("📁 Files created:");
            println!("   - {} (Graphviz source)", DOT_FILE);
            println!("   - {} (Image)", PNG_FILE);
            println!("   - {} (Scalable vector)", SVG_FILE);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("✗ Error generating diagram: {}", err);
            eprintln!(
                "Make sure Graphviz is installed and the '{}' command is available",
                program
            );
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn dashboard(args: DashboardArgs) -> anyhow::Result<ExitCode> {
    let settings = Settings::load(args.config.as_deref())?;

    let report = match run_dashboard(&settings).await {
        Ok(report) => report,
        Err(err @ ReportError::Connect(_)) => {
            eprintln!("❌ {}", err);
            eprintln!("\nTry running: ./setup_database.sh");
            return Ok(ExitCode::FAILURE);
        }
        Err(err) => return Err(err.into()),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    report.write(args.format, &mut out)?;
    out.flush()?;

    let strict = args.strict || settings.report.fail_on_query_error;
    if let Err(err) = check_sections(&report, strict) {
        eprintln!("❌ {}", err);
        return Ok(ExitCode::from(2));
    }

    Ok(ExitCode::SUCCESS)
}

async fn run(command: Command) -> ExitCode {
    let result = match command {
        Command::Erd(args) => erd(args).await,
        Command::Dashboard(args) => dashboard(args).await,
    };

    result.unwrap_or_else(|err| {
        eprintln!("\n❌ Unexpected error: {:#}", err);
        ExitCode::FAILURE
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    tokio::select! {
        code = run(cli.command) => code,
        _ = tokio::signal::ctrl_c() => {
            println!("\n\n👋 Dashboard generation cancelled.");
            ExitCode::SUCCESS
        }
    }
}
