use std::{error::Error, path::PathBuf, str::FromStr};
use anyhow::{bail, Context};
use chrono::NaiveTime;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use eatery_nav::{
    init_tracing, Algorithm, AppConfig, CampusStore, Coordinate, Factor, Graph, PreferenceVector,
    SearchRequest, Snapshot, SpatialIndex,
};


#[derive(Parser)]
#[command(name = "eatery-nav")]
#[command(about = "Find the best campus eatery and the shortest walk to it")]
struct Cli {
    /// Graph document, overrides data.graph_path
    #[arg(long, global = true)]
    graph: Option<PathBuf>,

    /// Eatery document, overrides data.eateries_path
    #[arg(long, global = true)]
    eateries: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route to the best reachable eatery
    FindPath {
        #[command(flatten)]
        query: QueryArgs,

        /// ucs or astar, defaults to search.algorithm
        #[arg(short, long)]
        algorithm: Option<Algorithm>,
    },

    /// Rank reachable eateries by preference score
    Rank {
        #[command(flatten)]
        query: QueryArgs,

        /// Number of eateries to list, defaults to ranking.top_n
        #[arg(short, long)]
        top: Option<usize>,
    },

    /// Run UCS and A* on the same query
    Compare {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Snap a map point to the closest graph node
    Nearest {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },

    /// Load and validate both documents
    Validate,
}

#[derive(Args)]
struct QueryArgs {
    /// Start node id
    #[arg(short, long)]
    start: String,

    /// Restrict the goal set, may be repeated
    #[arg(short, long = "goal")]
    goals: Vec<String>,

    /// Factor weight, e.g. --weight rating=2
    #[arg(short, long = "weight", value_parser = parse_key_val::<f64>)]
    weights: Vec<(String, f64)>,

    /// Factor rank where 1 is most important, e.g. --rank distance=1
    #[arg(short, long = "rank", value_parser = parse_key_val::<i64>)]
    ranks: Vec<(String, i64)>,

    /// Only consider eateries open at HH:MM
    #[arg(long, value_parser = parse_time)]
    open_at: Option<NaiveTime>,
}

impl QueryArgs {

    fn request(&self) -> anyhow::Result<SearchRequest> {
        let preferences = match (self.weights.is_empty(), self.ranks.is_empty()) {
            (true, true) => PreferenceVector::default(),
            (false, true) => PreferenceVector::from_named(self.weights.iter().map(|(k, v)| (k, *v)))?,
            (true, false) => {
                let ranks = self.ranks.iter()
                    .map(|(k, r)| Ok((k.parse::<Factor>()?, *r)))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                PreferenceVector::from_ranks(ranks)
            }
            (false, false) => bail!("use either --weight or --rank, not both"),
        };

        let mut request = SearchRequest::new(self.start.as_str()).with_preferences(preferences);
        if !self.goals.is_empty() {
            request = request.with_goals(self.goals.iter().cloned());
        }
        request.open_at = self.open_at;
        Ok(request)
    }
}


/// Parse a single `key=value` pair
fn parse_key_val<T>(s: &str) -> Result<(String, T), Box<dyn Error + Send + Sync + 'static>>
where
    T: FromStr,
    T::Err: Error + Send + Sync + 'static,
{
    let (key, value) = s.split_once('=')
        .ok_or_else(|| format!("invalid KEY=value: no `=` found in `{s}`"))?;
    Ok((key.trim().to_string(), value.trim().parse()?))
}

fn parse_time(s: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(s, "%H:%M").or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}


fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;

    let graph_path = cli.graph.unwrap_or_else(|| config.data.graph_path.clone());
    let eateries_path = cli.eateries.unwrap_or_else(|| config.data.eateries_path.clone());
    let store = CampusStore::load(&graph_path, &eateries_path)
        .with_context(|| format!("failed to load campus from {} and {}", graph_path.display(), eateries_path.display()))?;
    let snapshot = store.snapshot();
    let planner = snapshot.planner().with_options(config.planner_options());

    match cli.command {
        Commands::FindPath { query, algorithm } => {
            let request = query.request()?;
            let algorithm = algorithm.unwrap_or(config.search.algorithm);
            let result = planner.find_path(&request, algorithm)
                .with_context(|| format!("{algorithm} search from '{}' failed", request.start))?;
            print_json(&json!({
                "result": result,
                "eatery": snapshot.eateries.get(&result.goal),
            }))?;
        }

        Commands::Rank { query, top } => {
            let request = query.request()?;
            let top_n = top.unwrap_or(config.ranking.top_n);
            let ranked = planner.rank_eateries(&request, top_n)
                .with_context(|| format!("ranking from '{}' failed", request.start))?;
            print_json(&ranked)?;
        }

        Commands::Compare { query } => {
            let request = query.request()?;
            let comparison = planner.compare_algorithms(&request)
                .with_context(|| format!("comparison from '{}' failed", request.start))?;
            print_json(&json!({
                "agree": comparison.agree(),
                "ucs": comparison.ucs,
                "astar": comparison.astar,
            }))?;
        }

        Commands::Nearest { lat, lon } => {
            let point = Coordinate::new(lat, lon);
            if !point.is_valid() {
                bail!("coordinate ({lat}, {lon}) is out of range");
            }
            let index = SpatialIndex::build(&snapshot.graph)?;
            let Some((node, distance)) = index.nearest(point, config.search.metric)? else {
                bail!("graph has no nodes");
            };
            print_json(&json!({ "node": node, "distance": distance }))?;
        }

        Commands::Validate => {
            let unplaced = unplaced_eateries(&snapshot);
            for id in &unplaced {
                warn!(eatery = %id, "eatery has no graph node");
            }
            info!("campus is valid");
            print_json(&json!({
                "nodes": snapshot.graph.node_count(),
                "edges": snapshot.graph.edge_count(),
                "eateries": snapshot.eateries.len(),
                "unplaced_eateries": unplaced,
            }))?;
        }
    }

    Ok(())
}

/// Eatery records whose id is not a graph node, never searched for
fn unplaced_eateries(snapshot: &Snapshot) -> Vec<String> {
    snapshot.eateries.iter()
        .filter(|(id, _)| !snapshot.graph.contains(id))
        .map(|(id, _)| id.to_string())
        .collect()
}
