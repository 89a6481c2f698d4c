use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use pagesmith_core::{PageRenderer, PageSchema, StructureScanner};
use std::path::PathBuf;

use crate::cmd::serve::add_storage_args;
use crate::config::PagesmithConfig;

pub fn make_subcommand() -> Command {
    add_storage_args(Command::new("render"))
        .about("Render a single schema.json file to a standalone HTML document")
        .arg(
            Arg::new("schema")
                .value_name("SCHEMA")
                .help("Path to a schema.json file")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write the document here instead of stdout"),
        )
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let config = PagesmithConfig::load(args)?;
    let server = config.server_config();

    let schema_path = args
        .get_one::<String>("schema")
        .map(PathBuf::from)
        .context("missing schema path")?;
    let data = std::fs::read_to_string(&schema_path)
        .with_context(|| format!("reading {}", schema_path.display()))?;
    let schema = PageSchema::from_json(&data)?;

    // menus link to whatever the page tree currently holds
    let structure = StructureScanner::new(&server.uploads).scan()?;
    let renderer = PageRenderer::new(&server.theme)?.with_site(&server.site);
    let html = renderer.render_document(&schema, &structure)?;

    match args.get_one::<String>("output") {
        Some(output) => {
            std::fs::write(output, html).with_context(|| format!("writing {output}"))?;
            tracing::info!("Rendered {} to {}", schema_path.display(), output);
        }
        None => println!("{html}"),
    }

    Ok(())
}
