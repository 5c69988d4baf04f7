// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyframe CSG CLI

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use polyframe_csg::config::BuildConfig;
use polyframe_csg::geometry::mesh_executor;
use polyframe_csg::tree::{sample_tree, ConstructionTree};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "polyframe-csg")]
#[command(about = "Build JSON construction trees with the Polyframe mesh kernel", long_about = None)]
#[command(version)]
struct Cli {
    /// Construction tree JSON file
    #[arg(value_name = "FILE", required_unless_present = "sample")]
    input: Option<PathBuf>,

    /// Build the built-in sample tree instead of a file
    #[arg(long, conflicts_with = "input")]
    sample: bool,

    /// Config file (default: polyframe-csg.toml in the working directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Skip the non-empty check on built shapes
    #[arg(long)]
    no_validate: bool,

    /// Tessellation segments for curved primitives
    #[arg(short, long)]
    segments: Option<u32>,

    /// Verbosity (-v info, -vv debug, -vvv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red(), e);
        std::process::exit(1);
    }
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();
}

fn load_config(cli: &Cli) -> Result<BuildConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = BuildConfig::from_file(path)?;
            config.apply_env_overrides(|key| std::env::var(key).ok());
            config
        }
        None => BuildConfig::load()?,
    };

    // Results are always checked unless explicitly disabled
    config.validate_results = !cli.no_validate;
    if let Some(segments) = cli.segments {
        if segments < 3 {
            bail!("--segments must be at least 3, got {}", segments);
        }
        config.segments = segments;
    }
    Ok(config)
}

fn load_tree(cli: &Cli) -> Result<ConstructionTree> {
    match &cli.input {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read construction tree: {:?}", path))?;
            ConstructionTree::from_json(&source)
                .with_context(|| format!("Failed to load construction tree: {:?}", path))
        }
        None => Ok(sample_tree()),
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    info!(?config, "configuration loaded");

    let tree = load_tree(cli)?;
    let executor = mesh_executor(&config)?;

    println!(
        "Building '{}' ({} nodes, {} segments)",
        tree.root(),
        tree.len(),
        config.segments
    );
    let start = Instant::now();
    let output = executor.execute_with_stats(&tree)?;
    let elapsed = start.elapsed();

    let mesh = &output.shape;
    let stats = &output.stats;
    println!("{} built in {:.2?}", "✓".green(), elapsed);
    println!("Vertices:  {}", mesh.vertex_count());
    println!("Triangles: {}", mesh.triangle_count());

    let bbox = mesh.bounding_box();
    if bbox.is_empty() {
        println!("Bounds:    {}", "empty".yellow());
    } else {
        println!(
            "Bounds:    [{:.3}, {:.3}, {:.3}] .. [{:.3}, {:.3}, {:.3}]",
            bbox.min.x, bbox.min.y, bbox.min.z, bbox.max.x, bbox.max.y, bbox.max.z
        );
        println!("Volume:    {:.3}", mesh.volume());
    }

    println!(
        "Nodes evaluated: {} (cache hits: {}, depth: {})",
        stats.evaluated_nodes, stats.cache_hits, stats.max_depth
    );
    let mut invocations: Vec<(&String, &usize)> = stats.invocations.iter().collect();
    invocations.sort();
    for (kind, count) in invocations {
        println!("  {} {}", format!("{:<14}", kind).bold(), count);
    }

    Ok(())
}
