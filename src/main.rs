//! floranet - main entry point

use clap::Parser;
use floranet::cli::{cmd_crossval, cmd_holdout, cmd_inspect, Cli, Commands};

fn main() -> floranet::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "floranet=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { data } => {
            cmd_inspect(&data)?;
        }
        Commands::Holdout {
            table,
            net,
            train_fraction,
            seed,
            json,
        } => {
            cmd_holdout(&table, &net, train_fraction, seed, json)?;
        }
        Commands::Crossval {
            table,
            net,
            folds,
            stratified,
            seed,
            abort_on_failure,
            parallel,
            json,
        } => {
            cmd_crossval(
                &table,
                &net,
                folds,
                stratified,
                seed,
                abort_on_failure,
                parallel,
                json,
            )?;
        }
    }

    Ok(())
}
