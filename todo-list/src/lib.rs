pub mod config {
    use serde::Deserialize;

    #[derive(Deserialize, Debug, Clone)]
    pub struct Config {
        pub db_url: String,
        #[serde(default = "default_port")]
        pub port: u16,
        #[serde(default = "default_job_queue_capacity")]
        pub job_queue_capacity: usize,
        #[serde(default = "default_job_max_attempts")]
        pub job_max_attempts: u32,
        #[serde(default = "default_job_retry_delay_ms")]
        pub job_retry_delay_ms: u64,
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_environment(config::Environment::default())
        }

        /// Loads configuration from the given environment source.
        pub fn from_environment(environment: config::Environment) -> anyhow::Result<Self> {
            let settings = config::Config::builder()
                .add_source(environment)
                .build()?;

            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }
    }

    fn default_port() -> u16 {
        8080
    }

    pub(crate) fn default_job_queue_capacity() -> usize {
        1024
    }

    pub(crate) fn default_job_max_attempts() -> u32 {
        3
    }

    pub(crate) fn default_job_retry_delay_ms() -> u64 {
        1000
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::collections::HashMap;

        fn environment(vars: &[(&str, &str)]) -> config::Environment {
            let source: HashMap<String, String> = vars
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect();
            config::Environment::default().source(Some(source))
        }

        #[test]
        fn can_load_config_with_defaults() {
            let config =
                Config::from_environment(environment(&[("DB_URL", "postgres://localhost/todo")]))
                    .unwrap();

            assert_eq!(config.db_url, "postgres://localhost/todo");
            assert_eq!(config.port, 8080);
            assert_eq!(config.job_queue_capacity, 1024);
            assert_eq!(config.job_max_attempts, 3);
            assert_eq!(config.job_retry_delay_ms, 1000);
        }

        #[test]
        fn can_override_defaults() {
            let config = Config::from_environment(environment(&[
                ("DB_URL", "postgres://localhost/todo"),
                ("PORT", "3000"),
                ("JOB_MAX_ATTEMPTS", "5"),
            ]))
            .unwrap();

            assert_eq!(config.port, 3000);
            assert_eq!(config.job_max_attempts, 5);
        }

        #[test]
        fn requires_database_url() {
            let result = Config::from_environment(environment(&[("PORT", "3000")]));

            assert!(result.is_err());
        }
    }
}
pub mod entities;
pub mod item;
pub mod list;
pub mod repo;
pub mod validation;
pub mod web;
pub mod worker;
