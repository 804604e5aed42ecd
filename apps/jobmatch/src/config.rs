use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::clustering::kmeans::KMeansParams;

/// Application configuration loaded from environment variables.
/// Every value has a default; a present but unparsable value is an error.
#[derive(Debug, Clone)]
pub struct Config {
    pub store_path: PathBuf,
    pub vectorizer_path: PathBuf,
    pub model_path: PathBuf,
    pub clusters: usize,
    pub seed: u64,
    pub restarts: usize,
    pub max_iter: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            store_path: env_or("JOBMATCH_STORE_PATH", PathBuf::from("new_jobs_clustered.csv"))?,
            vectorizer_path: env_or("JOBMATCH_VECTORIZER_PATH", PathBuf::from("vectorizer.json"))?,
            model_path: env_or("JOBMATCH_MODEL_PATH", PathBuf::from("kmeans_model.json"))?,
            clusters: env_or("JOBMATCH_CLUSTERS", 5)?,
            seed: env_or("JOBMATCH_SEED", 42)?,
            restarts: env_or("JOBMATCH_RESTARTS", 10)?,
            max_iter: env_or("JOBMATCH_MAX_ITER", 300)?,
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// k-means parameters for offline training.
    pub fn kmeans_params(&self) -> KMeansParams {
        KMeansParams {
            k: self.clusters,
            n_init: self.restarts,
            max_iter: self.max_iter,
            seed: self.seed,
            ..KMeansParams::default()
        }
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    parse_or(key, std::env::var(key).ok(), default)
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{value}'")),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_value_uses_default() {
        let port: u16 = parse_or("PORT", None, 8080).unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_blank_value_uses_default() {
        let k: usize = parse_or("JOBMATCH_CLUSTERS", Some("  ".to_string()), 5).unwrap();
        assert_eq!(k, 5);
    }

    #[test]
    fn test_present_value_is_parsed() {
        let seed: u64 = parse_or("JOBMATCH_SEED", Some(" 7 ".to_string()), 42).unwrap();
        assert_eq!(seed, 7);
    }

    #[test]
    fn test_negative_cluster_count_is_rejected() {
        let err = parse_or::<usize>("JOBMATCH_CLUSTERS", Some("-3".to_string()), 5).unwrap_err();
        assert!(err.to_string().contains("JOBMATCH_CLUSTERS"));
    }
}
