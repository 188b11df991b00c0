use crate::config::load_config;
use crate::features::{ClientProfile, Feature, FeatureVector};
use crate::oracle::load_oracle;
use crate::ranker::RankingPolicy;
use crate::recommend::Recommender;
use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Top-level CLI interface
#[derive(Parser)]
#[command(
    name = "intervention-ranker",
    version,
    about = "Rank social-service intervention combinations for a client"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score every intervention combination for one client and print the top K
    Recommend {
        /// JSON file: an intake profile object or a numeric feature array
        #[arg(short, long)]
        client: PathBuf,
        /// Configuration file (defaults to recommender.toml when present)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the configured number of combinations
        #[arg(long)]
        top_k: Option<usize>,
        /// ascending_tail or best_first
        #[arg(long)]
        policy: Option<RankingPolicy>,
        #[arg(long)]
        pretty: bool,
    },

    /// Print the canonical feature and intervention order
    Schema,
}

/// Client input as read from disk
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClientInput {
    Features(Vec<f64>),
    Profile(ClientProfile),
}

pub fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Recommend {
            client,
            config,
            top_k,
            policy,
            pretty,
        } => {
            let config = load_config(config.as_deref()).context("loading configuration")?;
            let oracle = load_oracle(&config.model).context("loading scoring model")?;

            let mut recommender = Recommender::from_config(&config, oracle)?;
            if let Some(k) = top_k {
                recommender = recommender.with_top_k(k);
            }
            if let Some(p) = policy {
                recommender = recommender.with_policy(p);
            }

            let raw = fs::read_to_string(&client)
                .with_context(|| format!("reading client file {}", client.display()))?;
            let input: ClientInput = serde_json::from_str(&raw)
                .with_context(|| format!("parsing client file {}", client.display()))?;

            let recommendation = match input {
                ClientInput::Features(values) => {
                    recommender.recommend(&FeatureVector::from_values(values)?)?
                }
                ClientInput::Profile(profile) => recommender.recommend_profile(&profile)?,
            };

            let out = if pretty {
                serde_json::to_string_pretty(&recommendation)?
            } else {
                serde_json::to_string(&recommendation)?
            };
            println!("{out}");
        }
        Commands::Schema => {
            println!("features:");
            for feature in Feature::ALL {
                println!("  {:>2} {}", feature.index(), feature.column());
            }
            println!("interventions:");
            for intervention in crate::interventions::Intervention::ALL {
                println!(
                    "  {:>2} {} ({})",
                    intervention.index(),
                    intervention.label(),
                    intervention.column()
                );
            }
        }
    }
    Ok(())
}
