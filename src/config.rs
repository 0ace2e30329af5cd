use std::env;

use anyhow::Context;

use crate::classify::TierPolicy;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub tier_policy: TierPolicy,
    pub max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let tier_policy = match env::var("ATTENDANCE_TIER_POLICY") {
            Ok(value) => value
                .parse()
                .context("ATTENDANCE_TIER_POLICY is not a known tier policy")?,
            Err(_) => TierPolicy::default(),
        };

        let max_connections = match env::var("ATTENDANCE_DB_MAX_CONNECTIONS") {
            Ok(value) => value
                .parse()
                .context("ATTENDANCE_DB_MAX_CONNECTIONS must be a positive integer")?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok(),
            tier_policy,
            max_connections,
        })
    }

    pub fn database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set to a production Postgres instance")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_database_url_is_an_error() {
        let config = AppConfig {
            database_url: None,
            tier_policy: TierPolicy::default(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        };
        assert!(config.database_url().is_err());
    }

    #[test]
    fn default_policy_is_effective_attendance() {
        assert_eq!(TierPolicy::default(), TierPolicy::EffectiveAttendance);
    }
}
