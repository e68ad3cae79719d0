//! Unified error type for the powerturn host.

use powerturn_engine::ConfigError;
use powerturn_protocol::ProtocolError;
use powerturn_seats::SeatError;
use powerturn_table::TableError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `powerturn` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// Game-rule rejections never show up here; the engine drops those.
#[derive(Debug, thiserror::Error)]
pub enum PowerturnError {
    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The seat directory produced an unusable roster.
    #[error(transparent)]
    Seats(#[from] SeatError),

    /// A table-level error (not found, not attached, actor gone).
    #[error(transparent)]
    Table(#[from] TableError),

    /// A match config file did not parse.
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use powerturn_engine::GameConfig;
    use powerturn_protocol::{ConnectionId, TableId};

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let wrapped: PowerturnError = err.into();
        assert!(matches!(wrapped, PowerturnError::Protocol(_)));
        assert!(wrapped.to_string().contains("bad"));
    }

    #[test]
    fn test_from_seat_error() {
        let err = SeatError::UnknownConnection(ConnectionId(4));
        let wrapped: PowerturnError = err.into();
        assert!(matches!(wrapped, PowerturnError::Seats(_)));
    }

    #[test]
    fn test_from_table_error() {
        let err = TableError::NotFound(TableId(1));
        let wrapped: PowerturnError = err.into();
        assert!(matches!(wrapped, PowerturnError::Table(_)));
        assert!(wrapped.to_string().contains("T-1"));
    }

    #[test]
    fn test_from_config_error() {
        let err = GameConfig::from_json("{ nope").unwrap_err();
        let wrapped: PowerturnError = err.into();
        assert!(matches!(wrapped, PowerturnError::Config(_)));
    }
}
