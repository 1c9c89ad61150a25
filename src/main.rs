use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use pincode_locator::locality::AvailabilityResult;
use pincode_locator::proximity::{Candidate, SortKey};
use pincode_locator::{server, telemetry, AppConfig, AppError, EngineConfig, LocatorEngine};
use serde::Serialize;
use tracing::info;

/// Pincode locator: service availability and provider proximity ranking.
///
/// Examples:
///   locator check 380001
///   locator rank 380001 --candidates providers.json --sort rating
///   locator nearby Surat --radius 30
///   locator distance Ahmedabad 395001
///   locator serve --port 8080
#[derive(Parser)]
#[command(name = "locator", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a pincode to its availability tier.
    Check {
        pincode: String,
    },
    /// Rank providers from a JSON file around a pincode.
    Rank {
        pincode: String,
        /// JSON array of candidates ({"provider_id", "city_or_code", ...}).
        #[arg(long, short = 'c')]
        candidates: PathBuf,
        /// distance, rating, price-low, price-high or experience.
        #[arg(long, short = 's', default_value = "distance", value_parser = parse_sort)]
        sort: SortKey,
        /// Search radius in km. Defaults to the configured radius.
        #[arg(long, short = 'r')]
        radius: Option<f64>,
    },
    /// List registry cities within a radius of a city name or pincode.
    Nearby {
        place: String,
        #[arg(long, short = 'r')]
        radius: Option<f64>,
    },
    /// Distance between two city names or pincodes.
    Distance {
        from: String,
        to: String,
    },
    /// Start the HTTP service.
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        /// Default search radius in km for requests that omit one.
        #[arg(long, short = 'r')]
        radius: Option<f64>,
    },
}

fn parse_sort(s: &str) -> Result<SortKey, String> {
    s.parse::<SortKey>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let mut config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    if let Command::Serve { host, port, radius } = cli.command {
        if let Some(host) = host {
            config.server.host = host;
        }
        if let Some(port) = port {
            config.server.port = port;
        }
        if let Some(radius) = radius {
            let engine = &config.engine;
            config.engine = EngineConfig::new(
                engine.primary_state.clone(),
                engine.primary_district.clone(),
                radius,
                engine.cache_ttl_ms,
            )?;
        }
        let addr = config.server.socket_addr()?;
        info!(
            state = %config.engine.primary_state,
            district = %config.engine.primary_district,
            "starting server"
        );
        return server::start(addr, LocatorEngine::new(config.engine)).await;
    }

    let engine = LocatorEngine::new(config.engine);
    match cli.command {
        Command::Check { pincode } => {
            let result = engine.check_availability(&pincode);
            print_banner(&result);
            print_json(&result)
        }
        Command::Rank { pincode, candidates, sort, radius } => {
            let candidates = load_candidates(&candidates)?;
            let ranking = engine.rank_for_pincode(&pincode, &candidates, sort, radius)?;
            print_banner(&ranking.availability);
            eprintln!("  {} of {} providers ranked by {}", ranking.providers.len(), candidates.len(), sort);
            print_json(&ranking)
        }
        Command::Nearby { place, radius } => {
            let areas = engine.nearby_areas(&place, radius)?;
            for area in &areas {
                eprintln!("  {:<14} {:>6.1} km  ({})", area.city, area.distance_km, area.district);
            }
            print_json(&areas)
        }
        Command::Distance { from, to } => {
            let distance_km = engine.distance_between(&from, &to);
            match distance_km {
                Some(d) => eprintln!("  {} \u{2192} {}: {:.1} km", from, to, d),
                None => eprintln!("  Could not resolve '{}' or '{}'", from, to),
            }
            print_json(&serde_json::json!({ "from": from, "to": to, "distance_km": distance_km }))
        }
        Command::Serve { .. } => unreachable!("handled above"),
    }
}

fn load_candidates(path: &Path) -> Result<Vec<Candidate>, AppError> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn print_banner(result: &AvailabilityResult) {
    match &result.locality {
        Some(loc) => eprintln!("  \u{1F4CD} {} [{}]", loc.display_line(), result.tier),
        None => eprintln!("  \u{1F4CD} unresolved [{}]", result.tier),
    }
    eprintln!("  {}", result.message);
    if !result.nearby_localities.is_empty() {
        eprintln!("  Nearby: {}", result.nearby_localities.join(", "));
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
