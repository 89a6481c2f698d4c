use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use tracing_subscriber::EnvFilter;

mod cmd {
    pub mod build;
    pub mod render;
    pub mod serve;
}
mod config;

fn cli() -> Command {
    Command::new("pagesmith")
        .about("Store block-schema pages as static HTML and serve them")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(cmd::serve::make_subcommand())
        .subcommand(cmd::build::make_subcommand())
        .subcommand(cmd::render::make_subcommand())
}

fn init_tracing(verbose: bool) {
    // --verbose wins over RUST_LOG
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("serve", args)) => {
            init_tracing(args.get_flag("verbose"));
            cmd::serve::execute(args).await
        }
        Some(("build", args)) => {
            init_tracing(args.get_flag("verbose"));
            cmd::build::execute(args)
        }
        Some(("render", args)) => {
            init_tracing(args.get_flag("verbose"));
            cmd::render::execute(args)
        }
        _ => unreachable!("subcommand_required is set"),
    }
}
