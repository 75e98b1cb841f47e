use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "rollgrid",
    about = "rollgrid — budget-constrained rollout scheduler",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide which creations and deletions may be issued this tick.
    ///
    /// The snapshot is a JSON document with the fleet-wide `change_set`
    /// and the observed `pods_state`. It is split into groups with the
    /// policy's grouping definitions before scheduling.
    Plan {
        /// Rollout policy file (TOML)
        #[arg(short, long, default_value = "rollgrid.toml")]
        policy: String,
        /// Tick snapshot file (JSON)
        #[arg(short, long)]
        snapshot: String,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Validate a rollout policy and print it normalized
    Check {
        #[arg(short, long, default_value = "rollgrid.toml")]
        policy: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rollgrid=info".parse()?)
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan { policy, snapshot, format } => {
            commands::plan::run(&policy, &snapshot, &format)
        }
        Commands::Check { policy } => commands::check::run(&policy),
    }
}
