use anyhow::Result;
use clap::{Arg, ArgMatches, Command, value_parser};
use pagesmith_server::CmsServer;

use crate::config::PagesmithConfig;

pub fn add_storage_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("uploads")
                .short('u')
                .long("uploads")
                .value_name("DIR")
                .help("Directory holding the page tree [default: ./uploads]"),
        )
        .arg(
            Arg::new("theme")
                .short('t')
                .long("theme")
                .value_name("DIR")
                .help("Theme directory with an optional page.html [default: ./theme]"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file [default: ./pagesmith.toml]"),
        )
}

pub fn make_subcommand() -> Command {
    add_storage_args(Command::new("serve"))
        .about("Start the page API server")
        .arg(
            Arg::new("files")
                .short('f')
                .long("files")
                .value_name("DIR")
                .help("Directory for uploaded images and videos [default: ./files]"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .value_parser(value_parser!(u16))
                .help("Port to serve on [default: 8080]"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST")
                .help("Host to bind to [default: 127.0.0.1]"),
        )
        .arg(
            Arg::new("open")
                .long("open")
                .help("Open browser automatically")
                .action(clap::ArgAction::SetTrue),
        )
}

pub async fn execute(args: &ArgMatches) -> Result<()> {
    let config = PagesmithConfig::load(args)?;
    tracing::debug!(?config, "loaded configuration");

    CmsServer::new(config.server_config()).run().await
}
