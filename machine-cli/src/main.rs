use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use machine::{Machine, MachineError, MachineResources};
use tracing_subscriber::fmt::time::FormatTime;

/// Binary looked up on PATH when `--binary` and `MACHINE_BINARY` are
/// both absent.
const DEFAULT_TOOL: &str = "docker-machine";

struct Elapsed(Instant);

impl FormatTime for Elapsed {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> fmt::Result {
        let d = self.0.elapsed();
        let total_secs = d.as_secs();
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        let millis = d.subsec_millis();
        write!(w, "[{mins:02}:{secs:02}:{millis:03}]")
    }
}

/// Drive a docker-machine compatible provisioning tool.
#[derive(Debug, Parser)]
#[command(name = "machine-cli", version)]
struct Cli {
    /// Path to the provisioning binary (default: docker-machine on PATH)
    #[arg(long, env = "MACHINE_BINARY", global = true)]
    binary: Option<PathBuf>,

    /// Kill any tool invocation running longer than this many seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List machines as name/state/url rows
    Ls,
    /// Print a machine's configuration document as JSON
    Inspect { name: String },
    /// Start a machine
    Start { name: String },
    /// Stop a machine
    Stop { name: String },
    /// Remove a machine without prompting
    Rm {
        name: String,
        /// Remove even if the tool reports errors
        #[arg(long, short)]
        force: bool,
    },
    /// Create a machine
    Create(CreateArgs),
    /// Print the environment needed to talk to a machine's daemon
    Env { name: String },
    /// Print a machine's connection url
    Url { name: String },
    /// Print a machine's running state
    Status { name: String },
}

#[derive(Debug, Args)]
struct CreateArgs {
    name: String,

    /// Driver to hand to the tool, with raw options passed through
    #[arg(long, short)]
    driver: Option<String>,

    /// Memory in MB; resource creation through the default driver
    #[arg(long, conflicts_with = "driver")]
    memory: Option<u32>,

    /// Disk size in MB
    #[arg(long, conflicts_with = "driver")]
    disk: Option<u32>,

    /// CPU count
    #[arg(long, conflicts_with = "driver")]
    cpus: Option<u32>,

    /// Extra options handed to the tool verbatim, after `--`
    #[arg(last = true)]
    options: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("no docker-machine on PATH; pass --binary or set MACHINE_BINARY")]
    BinaryNotFound,

    #[error(transparent)]
    Machine(#[from] MachineError),

    #[error(transparent)]
    Exec(#[from] machine_exec::ExecError),

    #[error("render json: {0}")]
    Json(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_timer(Elapsed(Instant::now()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let binary = match cli.binary {
        Some(path) => path,
        None => which::which(DEFAULT_TOOL).map_err(|_| CliError::BinaryNotFound)?,
    };

    let mut machine = Machine::new(binary);
    if let Some(secs) = cli.timeout_secs {
        machine = machine.timeout(Duration::from_secs(secs));
    }

    match cli.command {
        Command::Ls => {
            let rows = machine.ls().await.into_result()?;
            for row in rows {
                println!("{}\t{}\t{}", row.name, row.state, row.url);
            }
        }
        Command::Inspect { name } => {
            let config = machine.inspect(&name).await.into_result()?;
            println!("{}", serde_json::to_string_pretty(config.document())?);
        }
        Command::Start { name } => {
            print!("{}", machine.start(&name).await.into_result()?);
        }
        Command::Stop { name } => {
            print!("{}", machine.stop(&name).await.into_result()?);
        }
        Command::Rm { name, force } => {
            print!("{}", machine.rm(&name, force).await.into_result()?);
        }
        Command::Create(args) => create(&machine, args).await?,
        Command::Env { name } => {
            // HashMap order is arbitrary; sort for stable shell output.
            let mut vars: Vec<_> = machine.env(&name).await.into_result()?.into_iter().collect();
            vars.sort();
            for (key, value) in vars {
                println!("{key}={value}");
            }
        }
        Command::Url { name } => match machine.url(&name).await? {
            Some(url) => println!("{url}"),
            None => println!("not running"),
        },
        Command::Status { name } => {
            println!("{}", machine.status(&name).await);
        }
    }
    Ok(())
}

async fn create(machine: &Machine, args: CreateArgs) -> Result<(), CliError> {
    let options: Vec<&str> = args.options.iter().map(String::as_str).collect();

    let log = match (args.driver.as_deref(), args.memory, args.disk, args.cpus) {
        (Some(driver), None, None, None) => {
            machine
                .create(&args.name, driver, &options)
                .await
                .into_result()?
        }
        (None, Some(memory), Some(disk), Some(cpus)) => {
            let resources = MachineResources {
                memory_mb: memory,
                disk_size_mb: disk,
                cpu_count: cpus,
            };
            machine
                .create_with_resources(&args.name, &resources, &options)
                .await
                .into_result()?
        }
        _ => {
            return Err(CliError::Usage(
                "pass --driver for raw creation, or all of --memory, --disk, and --cpus \
                 for resource creation through the default driver"
                    .to_owned(),
            ));
        }
    };
    print!("{log}");
    Ok(())
}
