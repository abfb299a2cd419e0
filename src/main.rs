use clap::{Parser, Subcommand};
use env_logger::Builder;
use heval::{
    env::Env,
    tasks::{
        bins::BinSet,
        dataset::{KEY_COLUMN, VALUE_COLUMN},
        figures::{self, Figure, PlotArgs, PlotContext},
        speedup,
    },
};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = Env::SYS_NAME, about = "Evaluation figures for Helios")]
struct Cli {
    // The name of the task to execute
    #[clap(subcommand)]
    task: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render one or more figures and print their tables
    Plot {
        /// Figures to render
        #[arg(required = true, value_enum)]
        figures: Vec<Figure>,
        #[command(flatten)]
        args: PlotArgs,
    },
    /// Render every figure
    PlotAll {
        #[command(flatten)]
        args: PlotArgs,
    },
    /// Compare two block-stats CSV files without drawing anything
    Speedup {
        /// CSV with the baseline times
        baseline: PathBuf,
        /// CSV with the times to compare against the baseline
        target: PathBuf,
        #[arg(long, value_enum, default_value_t = BinSet::Coarse)]
        bins: BinSet,
        #[arg(long, default_value = KEY_COLUMN)]
        key_column: String,
        #[arg(long, default_value = VALUE_COLUMN)]
        value_column: String,
    },
    /// List every figure with its data directory and inputs
    List {
        /// Evaluation root (defaults to $HELIOS_EVAL_ROOT, then the current directory)
        #[arg(long)]
        root: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize the logger.
    let env = env_logger::Env::default().filter_or("RUST_LOG", "info");
    let mut builder = Builder::from_env(env);
    builder.init();

    let cli = Cli::parse();
    match &cli.task {
        Command::Plot {
            figures: selected,
            args,
        } => {
            let ctx = PlotContext::from_args(args)?;
            let mut requested = selected.clone();
            requested.sort();
            requested.dedup();

            for figure in requested {
                let paths = figures::plot(figure, &ctx)?;
                info!("{figure}: wrote {} file(s)", paths.len());
            }
        }
        Command::PlotAll { args } => {
            let ctx = PlotContext::from_args(args)?;
            let paths = figures::plot_all(&ctx)?;
            info!("wrote {} file(s)", paths.len());
        }
        Command::Speedup {
            baseline,
            target,
            bins,
            key_column,
            value_column,
        } => {
            speedup::compare_files(
                baseline,
                target,
                key_column,
                value_column,
                &bins.partition(),
            )?;
        }
        Command::List { root } => {
            let root = Env::eval_root(root.as_deref())?;
            figures::list(&root);
        }
    }

    Ok(())
}
