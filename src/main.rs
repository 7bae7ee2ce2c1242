//! Pokémon battle prediction CLI
//!
//! Train a random forest on historical combats, then predict battles or score
//! single Pokémon.

use clap::{Parser, Subcommand};
use pokebattle::{Config, Result};

#[derive(Parser)]
#[command(name = "pokebattle")]
#[command(about = "Predict Pokémon battle outcomes or compute worth-it scores", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the battle model from the Pokémon and combats tables
    Train {
        /// Override number of trees
        #[arg(long)]
        trees: Option<usize>,
        /// Override random seed
        #[arg(long)]
        seed: Option<u64>,
        /// Fail on combats that reference unknown Pokémon instead of skipping them
        #[arg(long)]
        strict: bool,
    },
    /// Predict a battle winner, or score a single Pokémon
    Predict {
        /// Name or Pokédex number of the first Pokémon
        #[arg(long)]
        pokemon1: Option<String>,
        /// Name or Pokédex number of the second Pokémon
        #[arg(long)]
        pokemon2: Option<String>,
        /// Name or Pokédex number of a single Pokémon to score
        #[arg(long)]
        score: Option<String>,
        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Write stat histograms and a correlation heatmap
    Analyze {
        /// Output directory (defaults to data.figures_dir)
        #[arg(long)]
        out: Option<String>,
    },
    /// Model management commands
    Model {
        #[command(subcommand)]
        action: ModelCommands,
    },
    /// Write a default config file
    Init,
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Show model information
    Info,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use text or json.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Train {
            trees,
            seed,
            strict,
        } => commands::train(config, trees, seed, strict),
        Commands::Predict {
            pokemon1,
            pokemon2,
            score,
            format,
        } => commands::predict(&config, pokemon1, pokemon2, score, format),
        Commands::Analyze { out } => commands::analyze(&config, out),
        Commands::Model { action } => match action {
            ModelCommands::Info => commands::model_info(&config),
        },
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use pokebattle::analysis::{correlation_matrix, format_correlation_table, write_figures};
    use pokebattle::data::Pokedex;
    use pokebattle::predict::inference::{format_prediction, format_score};
    use pokebattle::predict::{ModelArtifact, Predictor};
    use pokebattle::training::Trainer;
    use pokebattle::BattleError;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        println!("\nNext steps:");
        println!(
            "  1. Place {} and {} next to the config",
            config.data.pokemon_path, config.data.combats_path
        );
        println!("  2. Run 'pokebattle train' to train the model");
        println!("  3. Run 'pokebattle predict --pokemon1 Pikachu --pokemon2 Bulbasaur'");

        Ok(())
    }

    pub fn train(
        mut config: Config,
        trees: Option<usize>,
        seed: Option<u64>,
        strict: bool,
    ) -> Result<()> {
        if let Some(t) = trees {
            config.forest.n_trees = t;
        }
        if let Some(s) = seed {
            config.forest.seed = s;
        }
        if strict {
            config.training.strict_combats = true;
        }
        config.validate()?;

        let summary = Trainer::from_config(&config).run(&config)?;

        println!("{}", summary);
        println!(
            "Model training complete. Saved to {}.",
            config.data.model_path
        );
        Ok(())
    }

    enum Request {
        Score(String),
        Battle(String, String),
    }

    fn request(
        pokemon1: Option<String>,
        pokemon2: Option<String>,
        score: Option<String>,
    ) -> Result<Request> {
        match (score, pokemon1, pokemon2) {
            (Some(s), _, _) if !s.is_empty() => Ok(Request::Score(s)),
            (_, Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => Ok(Request::Battle(a, b)),
            _ => Err(BattleError::Usage(
                "you must specify two Pokémon names or numbers using --pokemon1 and --pokemon2, \
                 or specify --score for a single Pokémon"
                    .to_string(),
            )),
        }
    }

    pub fn predict(
        config: &Config,
        pokemon1: Option<String>,
        pokemon2: Option<String>,
        score: Option<String>,
        format: OutputFormat,
    ) -> Result<()> {
        let artifact = ModelArtifact::load(&config.data.model_path)?;
        let mode = request(pokemon1, pokemon2, score)?;
        let pokedex = Pokedex::load(&config.data.pokemon_path)?;
        let predictor = Predictor::new(artifact, pokedex)?;

        match mode {
            Request::Score(token) => {
                let score = predictor.score(&token)?;

                match format {
                    OutputFormat::Text => println!("{}", format_score(&token, score)),
                    OutputFormat::Json => {
                        let json = serde_json::json!({
                            "pokemon": token,
                            "score": score,
                        });
                        println!("{}", serde_json::to_string_pretty(&json)?);
                    }
                }
            }
            Request::Battle(first, second) => {
                let prediction = predictor.predict(&first, &second)?;
                log::debug!(
                    "P({} wins) = {:.3}",
                    first,
                    prediction.first_win_prob
                );

                match format {
                    OutputFormat::Text => {
                        println!("{}", format_prediction(&first, &second, &prediction))
                    }
                    OutputFormat::Json => {
                        let json = serde_json::json!({
                            "first": first,
                            "second": second,
                            "winner": prediction.winner_name,
                            "winner_id": prediction.winner.0,
                            "first_win_prob": prediction.first_win_prob,
                        });
                        println!("{}", serde_json::to_string_pretty(&json)?);
                    }
                }
            }
        }

        Ok(())
    }

    pub fn analyze(config: &Config, out: Option<String>) -> Result<()> {
        let pokedex = Pokedex::load(&config.data.pokemon_path)?;
        let dir = out.unwrap_or_else(|| config.data.figures_dir.clone());

        write_figures(&pokedex, std::path::Path::new(&dir))?;

        println!("Correlation between base stats");
        print!("{}", format_correlation_table(&correlation_matrix(&pokedex)));
        println!("Analysis figures saved to {}/*.png", dir);
        Ok(())
    }

    pub fn model_info(config: &Config) -> Result<()> {
        let artifact = ModelArtifact::load(&config.data.model_path)?;
        let params = artifact.forest.params();

        println!("Model Information");
        println!("───────────────────────────────");
        println!("  Path:           {}", config.data.model_path);
        println!("  Format:         v{}", artifact.format_version);
        println!("  Trained at:     {}", artifact.trained_at.format("%Y-%m-%d %H:%M:%S UTC"));
        println!("  Features:       {}", artifact.features.join(", "));
        println!("  Trees:          {}", artifact.forest.n_trees());
        println!("  Seed:           {}", params.seed);
        match params.max_depth {
            Some(d) => println!("  Max depth:      {}", d),
            None => println!("  Max depth:      unlimited"),
        }
        println!("  Samples:        {}", artifact.training_samples);
        println!("  Skipped:        {}", artifact.skipped_combats);
        if let Some(acc) = artifact.oob_accuracy {
            println!("  OOB accuracy:   {:.1}%", acc * 100.0);
        }

        Ok(())
    }
}
