use anyhow::Result;
use clap::{ArgMatches, Command};
use pagesmith_core::{PageRenderer, PageStore};

use crate::cmd::serve::add_storage_args;
use crate::config::PagesmithConfig;

pub fn make_subcommand() -> Command {
    add_storage_args(Command::new("build"))
        .about("Re-render every stored page from its schema.json")
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let config = PagesmithConfig::load(args)?;
    let server = config.server_config();

    let renderer = PageRenderer::new(&server.theme)?.with_site(&server.site);
    let store = PageStore::new(&server.uploads, renderer);

    let rebuilt = store.rebuild_all()?;
    tracing::info!("Rebuilt {} page(s) in {}", rebuilt, server.uploads.display());

    Ok(())
}
