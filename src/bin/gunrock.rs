use std::{error::Error, fs::OpenOptions, path::Path, process};

use clap::Parser;
use gunrock::{FileService, Server, ServerOptions, ServiceRegistry};
use log::info;

fn main() -> Result<(), Box<dyn Error>> {
    let cli = ServerOptions::parse();
    init_logger(cli.log_file.as_deref())?;

    ctrlc::set_handler(|| {
        info!("interrupted, shutting down");
        process::exit(0);
    })?;

    if !cli.base_dir.is_dir() {
        return Err(format!("'{}' is not a directory", cli.base_dir.display()).into());
    }

    let files = FileService::new(&cli.base_dir);
    info!("serving files from {}", files.base().display());

    let mut registry = ServiceRegistry::new();
    registry.register("/", files);

    info!("init");
    let server = Server::bind(&cli, registry)?;
    server.serve()?;
    Ok(())
}

/// Log to stderr, or append to `path` when one is given. `RUST_LOG` overrides the `info` default.
fn init_logger(path: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    if let Some(path) = path {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}
