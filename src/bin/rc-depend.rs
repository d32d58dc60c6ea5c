//! rc-depend - CLI front-end over the dependency resolver library.
//!
//! Deliberately thin: a demonstration of the library's surface, not part of
//! the resolver itself.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use rc_depend::{
    build_and_persist, cache, context::Context, freshness, options::DepOptions, order, query,
    roster, state::MemoryStateStore, tag::TypeTag, CommandSource, StaticSource,
};

#[derive(Parser)]
#[command(name = "rc-depend")]
#[command(about = "Service dependency resolver and ordering engine")]
struct Args {
    /// Path to the dependency cache file
    #[arg(long, default_value = "/run/deptree")]
    cache: PathBuf,

    /// Path to the external-config side file
    #[arg(long, default_value = "/run/depconfig")]
    configs: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the cache from a producer script
    Update {
        /// Shell helper to run as the producer
        producer: PathBuf,
        /// Platform identifier for keyword filtering (e.g. LINUX)
        #[arg(long)]
        sys: Option<String>,
    },

    /// Rebuild the cache from a file already containing producer lines
    UpdateFromFile {
        path: PathBuf,
        #[arg(long)]
        sys: Option<String>,
    },

    /// Show a service's direct dependencies of one type
    Depend { service: String, type_tag: String },

    /// Compute the start order for a runlevel
    Order {
        runlevel: String,
        #[arg(long)]
        stop: bool,
    },

    /// List every service currently in the cache
    List,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("rc-depend: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        Command::Update { producer, sys } => {
            let mut source = CommandSource::new(producer);
            let outcome = build_and_persist(&mut source, sys.as_deref(), &args.cache, &args.configs)?;
            println!("wrote {} services to {}", outcome.tree.len(), args.cache.display());
            for warning in &outcome.warnings {
                log::warn!("{:?}", warning);
            }
        }
        Command::UpdateFromFile { path, sys } => {
            let lines = std::fs::read_to_string(&path)?.lines().map(str::to_string).collect();
            let mut source = StaticSource(lines);
            let outcome = build_and_persist(&mut source, sys.as_deref(), &args.cache, &args.configs)?;
            println!("wrote {} services to {}", outcome.tree.len(), args.cache.display());
        }
        Command::Depend { service, type_tag } => {
            let tree = cache::load_checked(&args.cache)?.ok_or("no cache found; run `update` first")?;
            let tag: TypeTag = type_tag.parse().map_err(|e: rc_depend::tag::UnknownTypeTag| e.to_string())?;
            let deps = query::depend(&tree, &service, tag)?;
            for dep in deps {
                println!("{}", dep);
            }
        }
        Command::Order { runlevel, stop } => {
            let tree = cache::load_checked(&args.cache)?.ok_or("no cache found; run `update` first")?;
            let ctx = Context::from_env(runlevel);
            let store = MemoryStateStore::new();
            let options = if stop { DepOptions::STOP } else { DepOptions::empty() };
            let seeds = roster::roster(&ctx, &store);
            let order = order::order_for_runlevel(&tree, &seeds, &ctx, options, &store);
            for service in order {
                println!("{}", service);
            }
        }
        Command::List => {
            let tree = cache::load_checked(&args.cache)?.ok_or("no cache found; run `update` first")?;
            for di in tree.iter() {
                println!("{}", di.service);
            }
            if let Some(age) = freshness::cache_age(&args.cache) {
                if let Ok(elapsed) = age.elapsed() {
                    log::debug!("cache {} is {}s old", args.cache.display(), elapsed.as_secs());
                }
            }
        }
    }

    Ok(())
}
