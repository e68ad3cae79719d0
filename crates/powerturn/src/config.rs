//! Loading match configs from disk.

use std::path::Path;

use powerturn_engine::GameConfig;

use crate::PowerturnError;

/// Reads a JSON match config and clamps every out-of-range value.
pub fn load_game_config(path: impl AsRef<Path>) -> Result<GameConfig, PowerturnError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| PowerturnError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config = GameConfig::from_json(&json)?.validated();
    tracing::info!(path = %path.display(), "game config loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = load_game_config("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, PowerturnError::Io { .. }));
        assert!(err.to_string().contains("not/here.json"));
    }

    #[test]
    fn test_loaded_config_is_validated() {
        let path = std::env::temp_dir().join(format!("powerturn-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "hand_size": 40, "turn_ms": 10 }"#).unwrap();

        let config = load_game_config(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.hand_size, GameConfig::MAX_HAND_SIZE);
        assert_eq!(config.turn_ms, GameConfig::MIN_DEADLINE_MS);
    }
}
