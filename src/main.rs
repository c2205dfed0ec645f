use carte::config::AppConfig;
use carte::geocode::{GeocodeResolver, NominatimGeocoder};
use carte::pipeline::{self, GenerationPlan};
use carte::types::{MapContext, MarkerColor, MarkerIcon};
use carte::{data, server};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the interactive map from a workbook
    Generate {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Workbook to read instead of the configured one
        #[arg(short, long, value_name = "FILE")]
        workbook: Option<PathBuf>,
        /// HTML file to write instead of the configured one
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Region framing the map
        #[arg(short, long)]
        region: Option<String>,
    },
    /// Serve the generated map for viewing and download
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// List the available colors, icons and regions
    Catalog {
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Generate {
            config,
            workbook,
            output,
            region,
        } => {
            info!("Generating map with config: {:?}", config);
            let mut app_config = AppConfig::load_from_file(&config)?;
            if let Some(workbook) = workbook {
                app_config.input.workbook = workbook;
            }
            if let Some(output) = output {
                app_config.output.html = output;
            }
            if let Some(region) = region {
                app_config.map.region = region;
            }
            generate(&app_config)?;
        }
        Commands::Serve { config } => {
            let app_config = AppConfig::load_from_file(&config)?;
            let map_path = app_config.output.html.clone();
            tokio::runtime::Runtime::new()?
                .block_on(server::start_server(app_config, &map_path))?;
        }
        Commands::Catalog { config } => {
            let regions = match config {
                Some(path) => AppConfig::load_from_file(&path)?.region_catalog(),
                None => carte::types::builtin_regions(),
            };
            println!("Colors:");
            for color in MarkerColor::ALL {
                println!("  {:<10} {}", color.as_str(), color.label());
            }
            println!("Icons:");
            for icon in MarkerIcon::ALL {
                println!("  {:<10} {}", icon.as_str(), icon.label());
            }
            println!("Regions:");
            for r in regions {
                println!(
                    "  {:<28} ({:.4}, {:.4}) zoom {}",
                    r.name, r.latitude, r.longitude, r.zoom
                );
            }
        }
    }

    Ok(())
}

fn generate(config: &AppConfig) -> Result<()> {
    // 1. Load Data
    let workbook = data::load_workbook(&config.input.workbook)?;

    for name in workbook.sheet_names() {
        if !config.styles.contains_key(name) {
            info!("No style configured for sheet '{}', using defaults", name);
        }
    }

    // 2. Frame the map
    let region = config.region(&config.map.region)?;
    let plan = GenerationPlan {
        context: MapContext::for_region(&region, config.map.tiles),
        styles: config.styles.clone(),
    };

    // 3. Resolve and assemble
    let geocoder = NominatimGeocoder::new(
        &config.geocoder.endpoint,
        &config.geocoder.user_agent,
        config.geocoder.timeout(),
    )?;
    let resolver = GeocodeResolver::new(geocoder, config.geocoder.retry_policy());
    let output = pipeline::run(&workbook, &plan, &resolver);

    for e in &output.errors {
        warn!("Skipped: {}", e);
    }

    // 4. Write
    output.document.write_html(&config.output.html)?;
    if let Some(path) = &config.output.geojson {
        output.document.write_geojson(path)?;
    }

    info!("Generation complete!");
    Ok(())
}
