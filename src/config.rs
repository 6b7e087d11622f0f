use std::{env, path::{Path, PathBuf}, time::Duration};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::geometry::Metric;
use crate::planner::{Algorithm, DistanceBasis, PlannerOptions, MAX_TOP_EATERIES};


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub algorithm: Algorithm,
    pub metric: Metric,
    /// 0 disables the deadline
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    pub top_n: usize,
    pub max_top_n: usize,
    pub distance_basis: DistanceBasis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub graph_path: PathBuf,
    pub eateries_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub ranking: RankingConfig,
    pub data: DataConfig,
}

impl AppConfig {

    /// Defaults, then `config/default.*`, then `config/{RUN_MODE}.*`, then
    /// `EATERY_NAV__SECTION__KEY` environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        Self::load_from(Path::new("config"), &run_mode)
    }

    /// Same layering with the config files looked up in `dir`, both files optional
    pub fn load_from(dir: &Path, run_mode: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("search.algorithm", Algorithm::AStar.as_str())?
            .set_default("search.metric", "haversine")?
            .set_default("search.timeout_ms", 0_i64)?
            .set_default("ranking.top_n", 3_i64)?
            .set_default("ranking.max_top_n", MAX_TOP_EATERIES as i64)?
            .set_default("ranking.distance_basis", "straight")?
            .set_default("data.graph_path", "data/graph.json")?
            .set_default("data.eateries_path", "data/eateries.json")?
            .add_source(File::with_name(&dir.join("default").to_string_lossy()).required(false))
            .add_source(File::with_name(&dir.join(run_mode).to_string_lossy()).required(false))
            .add_source(Environment::with_prefix("EATERY_NAV").separator("__").try_parsing(true));

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let ranking = &self.ranking;
        if ranking.max_top_n == 0 || ranking.max_top_n > MAX_TOP_EATERIES {
            return Err(ConfigError::Invalid {
                key: "ranking.max_top_n",
                message: format!("must be between 1 and {MAX_TOP_EATERIES}, got {}", ranking.max_top_n),
            });
        }
        if ranking.top_n > ranking.max_top_n {
            return Err(ConfigError::Invalid {
                key: "ranking.top_n",
                message: format!("{} exceeds ranking.max_top_n ({})", ranking.top_n, ranking.max_top_n),
            });
        }
        Ok(())
    }

    pub fn planner_options(&self) -> PlannerOptions {
        PlannerOptions {
            metric: self.search.metric,
            distance_basis: self.ranking.distance_basis,
            max_top_n: self.ranking.max_top_n,
            timeout: (self.search.timeout_ms > 0).then(|| Duration::from_millis(self.search.timeout_ms)),
        }
    }
}
