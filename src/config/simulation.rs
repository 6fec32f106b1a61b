use serde::Deserialize;

/// Self-check driver knobs. Env vars override file values.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_entities")]
    pub entities: usize,
    #[serde(default = "default_conditions_per_entity")]
    pub conditions_per_entity: usize,
    #[serde(default = "default_validators")]
    pub validators: usize,
    /// Timestamp of the first simulated condition (Unix seconds)
    #[serde(default = "default_start_unix")]
    pub start_unix: i64,
    /// Spacing between consecutive conditions of one entity (seconds)
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: i64,
}

fn default_entities() -> usize {
    25
}

fn default_conditions_per_entity() -> usize {
    240
}

fn default_validators() -> usize {
    4
}

fn default_start_unix() -> i64 {
    // 2021-08-01T00:00:00Z
    1_627_776_000
}

fn default_interval_seconds() -> i64 {
    60
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            entities: default_entities(),
            conditions_per_entity: default_conditions_per_entity(),
            validators: default_validators(),
            start_unix: default_start_unix(),
            interval_seconds: default_interval_seconds(),
        }
    }
}

impl SimulationConfig {
    /// Apply env var overrides, keeping current values for unset or unparsable vars.
    pub fn apply_env(mut self) -> Self {
        if let Some(n) = env_parse::<usize>("LOADCHECK_ENTITIES") {
            self.entities = n;
        }
        if let Some(n) = env_parse::<usize>("LOADCHECK_CONDITIONS_PER_ENTITY") {
            self.conditions_per_entity = n;
        }
        if let Some(n) = env_parse::<usize>("LOADCHECK_VALIDATORS") {
            self.validators = n;
        }
        if let Some(n) = env_parse::<i64>("LOADCHECK_START_UNIX") {
            self.start_unix = n;
        }
        if let Some(n) = env_parse::<i64>("LOADCHECK_INTERVAL_SECONDS") {
            self.interval_seconds = n;
        }
        self
    }

    /// Timestamp one past the last simulated condition
    pub fn end_unix(&self) -> i64 {
        self.start_unix + self.interval_seconds * self.conditions_per_entity as i64
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.parse().ok()
}
