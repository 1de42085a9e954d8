use serde::{Deserialize, Serialize};

use crate::*;

/// Settings for every engine a cabinet can mount. Missing sections and fields fall
/// back to the defaults; out-of-range values are clamped when an engine is built.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcadeConfig {
    pub sliding: SlidingConfig,
    pub sweeper: SweeperConfig,
    pub snake: SnakeConfig,
    pub memory: MemoryConfig,
    pub reflex: ReflexConfig,
    pub economy: EconomyConfig,
    pub tictactoe: TicTacToeConfig,
}

impl ArcadeConfig {
    pub fn from_json(json: &str) -> core::result::Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        log::debug!("loaded arcade config: {:?}", config);
        Ok(config)
    }

    pub fn to_json(&self) -> core::result::Result<alloc::string::String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        assert_eq!(ArcadeConfig::from_json("{}").unwrap(), ArcadeConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config =
            ArcadeConfig::from_json(r#"{"snake":{"size":12},"sweeper":{"mines":30}}"#).unwrap();

        assert_eq!(config.snake.size, 12);
        assert_eq!(config.snake.step_interval_ms, 150);
        assert_eq!(config.sweeper.size, (10, 10));
        assert_eq!(config.sweeper.mines, 30);
        assert_eq!(config.memory, MemoryConfig::default());
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            ArcadeConfig::from_json(r#"{"snake":"#),
            Err(ConfigError::Malformed(_))
        ));
    }

    #[test]
    fn survives_a_json_trip() {
        let mut config = ArcadeConfig::default();
        config.reflex.max_delay_ms = 3000;
        config.tictactoe.opponent_delay_ms = 0;

        let json = config.to_json().unwrap();
        assert_eq!(ArcadeConfig::from_json(&json).unwrap(), config);
    }
}
