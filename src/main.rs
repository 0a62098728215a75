use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use kombucha_flights::{Api, Catalog, CatalogError, Config, ConfigError, FlightService, MemoryStore, Params, Reply};

#[derive(Error, Debug)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("Failed to render reply: {0}")]
    Render(#[from] serde_json::Error),
}

#[derive(Parser)]
#[command(name = "kombucha-flights", version, about = "Pick kombucha tasting flights from a catalog")]
struct Cli {
    /// Catalog JSON to load (overrides KOMBUCHA_CATALOG)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Seed for reproducible draws (overrides KOMBUCHA_SEED)
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List kombuchas matching the filters
    Kombuchas(FilterArgs),
    /// List ratings with each kombucha's average
    Ratings,
    /// Create tasting flights
    Flight {
        #[command(flatten)]
        filters: FilterArgs,
        /// Kombucha that must appear in the flight
        #[arg(long)]
        recipe_name: Option<String>,
        /// Number of flights to create
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
    /// Show one stored flight at random
    Pick,
}

#[derive(Args)]
struct FilterArgs {
    #[arg(long)]
    fizziness: Option<String>,
    #[arg(long)]
    vegan: Option<bool>,
    #[arg(long)]
    caffeine_free: Option<bool>,
    #[arg(long)]
    ingredient: Option<String>,
    #[arg(long)]
    excluded_ingredient: Option<String>,
    #[arg(long)]
    min_rating: Option<f64>,
}

impl FilterArgs {
    fn params(&self) -> Params {
        [
            ("fizziness", self.fizziness.clone()),
            ("vegan", self.vegan.map(|v| v.to_string())),
            ("caffeine_free", self.caffeine_free.map(|v| v.to_string())),
            ("ingredient_name", self.ingredient.clone()),
            ("excluded_ingredient_name", self.excluded_ingredient.clone()),
            ("min_rating", self.min_rating.map(|v| v.to_string())),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key.to_string(), value)))
        .collect()
    }
}

fn run(cli: Cli) -> Result<bool, AppError> {
    let mut config = Config::load()?;
    if let Some(catalog) = cli.catalog {
        config.catalog = catalog;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    info!(catalog = %config.catalog.display(), "Loading catalog...");
    let store = MemoryStore::new();
    Catalog::from_path(&config.catalog)?.seed(&store)?;

    let flights = FlightService::new(store.clone())
        .with_attempts(config.flight_attempts)
        .with_seed(config.seed);
    let api = Api::new(store, flights);

    let replies: Vec<Reply> = match cli.command {
        Command::Kombuchas(filters) => vec![api.kombuchas_index(&filters.params())],
        Command::Ratings => vec![api.ratings_index()],
        Command::Flight { filters, recipe_name, count } => {
            let mut params = filters.params();
            if let Some(recipe_name) = recipe_name {
                params.insert("recipe_name".to_string(), recipe_name);
            }
            (0..count).map(|_| api.flights_create(&params)).collect()
        }
        Command::Pick => vec![api.flight_picker()],
    };

    for reply in &replies {
        println!("{}", serde_json::to_string_pretty(&reply.body)?);
    }
    Ok(replies.iter().all(|reply| reply.status.is_success()))
}

fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::from(2)
        }
    }
}
