//! Table configuration.

use serde::{Deserialize, Serialize};

use crate::game::entities::{Blinds, Chips};

/// Seating and betting rules for one table. Validated once at creation;
/// immutable afterwards.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    pub name: String,
    pub max_seats: usize,
    pub blinds: Blinds,
    /// Smallest raise delta the table accepts.
    pub min_raise: Chips,
    pub min_buy_in: Chips,
    pub max_buy_in: Chips,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Main Table".to_string(),
            max_seats: 9,
            blinds: Blinds { small: 10, big: 20 },
            min_raise: 20,
            min_buy_in: 400,
            max_buy_in: 2_000,
        }
    }
}

impl TableConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("table name must not be empty".to_string());
        }

        if !(2..=10).contains(&self.max_seats) {
            return Err("max seats must be between 2 and 10".to_string());
        }

        if self.blinds.small == 0 || self.blinds.big <= self.blinds.small {
            return Err("big blind must be greater than a non-zero small blind".to_string());
        }

        if self.min_raise == 0 {
            return Err("minimum raise must be positive".to_string());
        }

        if self.min_buy_in < self.blinds.big {
            return Err("minimum buy-in must cover the big blind".to_string());
        }

        if self.max_buy_in < self.min_buy_in {
            return Err("max buy-in must be at least the min buy-in".to_string());
        }

        Ok(())
    }

    pub fn buy_in_allowed(&self, buy_in: Chips) -> bool {
        (self.min_buy_in..=self.max_buy_in).contains(&buy_in)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(TableConfig::default().validate(), Ok(()));
    }

    #[test]
    fn inverted_blinds_are_rejected() {
        let config = TableConfig {
            blinds: Blinds { small: 20, big: 20 },
            ..TableConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn one_seat_tables_are_rejected() {
        let config = TableConfig {
            max_seats: 1,
            ..TableConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn buy_in_window_is_inclusive() {
        let config = TableConfig::default();
        assert!(config.buy_in_allowed(config.min_buy_in));
        assert!(config.buy_in_allowed(config.max_buy_in));
        assert!(!config.buy_in_allowed(config.min_buy_in - 1));
        assert!(!config.buy_in_allowed(config.max_buy_in + 1));
    }
}
