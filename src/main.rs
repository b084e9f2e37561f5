//! Main entry point for the docshelf CLI app

use docshelf::cli::{self, Commands};
use docshelf::config::{Config, CONTEXT_PARAM_FILE, DEFAULT_PROPERTIES};
use docshelf::registry::Registry;
use docshelf::resolver::{self, Resolution};

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("docshelf=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run_app() {
        if e.downcast_ref::<clap::Error>().is_none() {
            eprintln!("Error: {}", e);
        }
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

fn run_app() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::run()?;

    let mut builder = Config::builder().layer(DEFAULT_PROPERTIES);
    let context_params = args.bundles.join(CONTEXT_PARAM_FILE);
    if context_params.is_file() {
        builder = builder.layer(&std::fs::read_to_string(&context_params)?);
    }
    if let Some(path) = &args.config {
        builder = builder.layer(&std::fs::read_to_string(path)?);
    }
    let config = builder.build();

    let registry = Registry::build(&args.bundles, config);

    match &args.command {
        Commands::Scan => {
            let mut bundles: Vec<(&str, usize)> = registry
                .contents()
                .map(|(key, toc)| (key, toc.root.children.len()))
                .collect();
            bundles.sort_by_key(|(key, _)| (registry.sequence_order(key), key.to_string()));
            println!("{} bundle(s) loaded", registry.bundle_count());
            for (key, top_level) in bundles {
                println!("  {}  ({} top-level topics)", key, top_level);
            }
            if !registry.search_available() {
                println!("search: unavailable");
            }
        }
        Commands::Resolve { path, json } => {
            let stripped = resolver::strip_plugins_root(path);
            let resolution = resolver::resolve(&registry, stripped);
            if *json {
                println!("{}", serde_json::to_string_pretty(&resolution)?);
            } else {
                print_resolution(&registry, &resolution);
            }
        }
        Commands::Search { query, limit } => {
            let hits = registry.search(query, *limit);
            if hits.is_empty() {
                println!("no matches");
            }
            for hit in hits {
                println!("{}\t{}", hit.href, hit.title);
            }
        }
        Commands::Topic { keyword } => match registry.find_topic(keyword) {
            Some(found) => println!("/{}/{}", found.bundle_key, found.href),
            None => println!("no match"),
        },
    }

    Ok(())
}

fn print_resolution(registry: &Registry, resolution: &Resolution) {
    match resolution {
        Resolution::MovedPermanently { location } => println!("301 {}", location),
        Resolution::MovedTemporarily { location } => println!("302 {}", location),
        Resolution::Ok { archive_key, file_name, content_type, last_modified } => {
            println!("200 {}!/{}", archive_key, file_name);
            println!("content-type: {}", content_type);
            if let Some(cache) = registry.config().cache_control(content_type) {
                println!("cache-control: {}", cache);
            }
            if let Some(when) = last_modified {
                println!("last-modified: {}", when);
            }
        }
        Resolution::NotFound => println!("404"),
    }
}
