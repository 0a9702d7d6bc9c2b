use std::fmt::Write as _;
use std::path::PathBuf;

use aiida_backends::Config;
use clap::{Parser, ValueEnum};
use db_infra::orchestrate_migration;
use migration::{schema_chain, Direction, MigrationCommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Command {
    Up,
    Down,
    Fresh,
    Reset,
    Refresh,
    Status,
    /// Print the revision chain and the operations of each step; no database needed.
    Plan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PlanDirection {
    Forward,
    Backward,
}

#[derive(Parser, Debug)]
#[command(name = "aiida-migrate")]
#[command(about = "AiiDA database schema migration tool")]
struct Args {
    /// Migration command to run
    #[arg(value_enum)]
    command: Command,

    /// Profile whose database is migrated
    #[arg(short, long)]
    profile: Option<String>,

    /// Process name used to pick the default profile
    #[arg(long, default_value = "verdi")]
    process: String,

    /// Configuration file (defaults to config.json in $AIIDA_PATH or ~/.aiida)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Direction shown by `plan`
    #[arg(long, value_enum, default_value = "forward")]
    direction: PlanDirection,
}

fn migration_command(command: Command) -> Option<MigrationCommand> {
    match command {
        Command::Up => Some(MigrationCommand::Up),
        Command::Down => Some(MigrationCommand::Down),
        Command::Fresh => Some(MigrationCommand::Fresh),
        Command::Reset => Some(MigrationCommand::Reset),
        Command::Refresh => Some(MigrationCommand::Refresh),
        Command::Status => Some(MigrationCommand::Status),
        Command::Plan => None,
    }
}

fn render_plan(direction: Direction) -> String {
    let mut chain = schema_chain();
    if direction == Direction::Backward {
        chain.reverse();
    }

    let mut out = String::new();
    for link in chain {
        let _ = writeln!(
            out,
            "{} ({} -> {})",
            link.name,
            link.down_revision.unwrap_or("<base>"),
            link.revision
        );
        let Some(plan) = link.plan else {
            let _ = writeln!(out, "    (schema created from scratch)");
            continue;
        };
        for op in plan.steps(direction) {
            let _ = writeln!(out, "    {op}");
            if let Some(sql) = op.raw_sql() {
                let _ = writeln!(out, "        postgres: {sql}");
            }
        }
    }
    out
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .without_time()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_line_number(false)
        .with_file(false)
        .with_env_filter("migration=info,db_infra=info,sqlx=warn")
        .init();

    let args = Args::parse();

    let Some(command) = migration_command(args.command) else {
        let direction = match args.direction {
            PlanDirection::Forward => Direction::Forward,
            PlanDirection::Backward => Direction::Backward,
        };
        print!("{}", render_plan(direction));
        return;
    };

    let config = match &args.config {
        Some(path) => Config::load(path),
        None => Config::from_env(),
    };
    let settings = config
        .and_then(|c| c.resolve(Some(&args.process), args.profile.as_deref()))
        .and_then(|profile| profile.db_settings());
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    if settings.is_memory() {
        eprintln!("In-memory SQLite databases cannot be migrated from the CLI: the database would vanish when the command exits.");
        std::process::exit(2);
    }

    if let Err(e) = orchestrate_migration(&settings, command).await {
        eprintln!("Migration failed: {e}");
        std::process::exit(1);
    }
}
