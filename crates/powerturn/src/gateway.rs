//! Frame gateway between an external transport and the table manager.
//!
//! The transport is not part of this crate. Whatever carries the bytes
//! (a WebSocket server, an in-process channel, a test) tags every inbound
//! frame with the [`ConnectionId`] it arrived on and drains one outbound
//! byte stream per connection. The gateway does the rest:
//!
//!   1. `connect` attaches a viewer to a table and returns its frame stream
//!   2. `handle_frame` decodes a request and routes it to the viewer's table
//!   3. `disconnect` detaches the viewer; the table marks the seat left

use std::sync::Arc;

use powerturn_protocol::{Codec, ConnectionId, Envelope, JsonCodec, TableId};
use powerturn_seats::SeatDirectory;
use powerturn_table::{GameLogic, TableInfo, TableManager};
use tokio::sync::{mpsc, Mutex};

use crate::PowerturnError;

/// Outbound frames for one connection, already encoded.
pub type FrameReceiver = mpsc::UnboundedReceiver<Vec<u8>>;

/// Shared entry point for every connection the host serves.
///
/// Cheap to share behind an `Arc`: the table manager sits behind a
/// `Mutex`, and each table's actor does the actual work.
pub struct Gateway<G: GameLogic, C: Codec = JsonCodec> {
    tables: Mutex<TableManager<G>>,
    codec: Arc<C>,
}

impl<G: GameLogic> Gateway<G, JsonCodec> {
    /// A gateway speaking JSON frames.
    pub fn json() -> Self {
        Self::new(JsonCodec)
    }
}

impl<G: GameLogic, C: Codec> Gateway<G, C> {
    pub fn new(codec: C) -> Self {
        Self {
            tables: Mutex::new(TableManager::new()),
            codec: Arc::new(codec),
        }
    }

    /// Starts a match for the seats the directory lists.
    pub async fn open_table(
        &self,
        directory: &impl SeatDirectory,
        config: G::Config,
    ) -> Result<TableId, PowerturnError> {
        let table_id = self.tables.lock().await.create_table(directory, config)?;
        tracing::info!(%table_id, "table opened");
        Ok(table_id)
    }

    /// Same as [`open_table`](Self::open_table) with a fixed seed.
    pub async fn open_table_seeded(
        &self,
        directory: &impl SeatDirectory,
        config: G::Config,
        seed: u64,
    ) -> Result<TableId, PowerturnError> {
        let table_id = self
            .tables
            .lock()
            .await
            .create_table_seeded(directory, config, seed)?;
        tracing::info!(%table_id, seed, "table opened");
        Ok(table_id)
    }

    /// Attaches `conn` to a table and returns the frames it should receive.
    ///
    /// The stream ends when the viewer is detached or the table shuts down.
    pub async fn connect(
        &self,
        conn: ConnectionId,
        table_id: TableId,
    ) -> Result<FrameReceiver, PowerturnError> {
        let (envelope_tx, envelope_rx) = mpsc::unbounded_channel();
        self.tables
            .lock()
            .await
            .attach_viewer(conn, table_id, envelope_tx)
            .await?;

        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        tokio::spawn(forward_frames::<G, C>(
            conn,
            envelope_rx,
            frame_tx,
            Arc::clone(&self.codec),
        ));

        tracing::debug!(%conn, %table_id, "viewer connected");
        Ok(frame_rx)
    }

    /// Decodes one inbound frame and routes it to `conn`'s table.
    ///
    /// A frame that does not decode is a protocol error for the caller to
    /// handle. A request that decodes but breaks a game rule is accepted
    /// here and dropped silently by the engine.
    pub async fn handle_frame(
        &self,
        conn: ConnectionId,
        frame: &[u8],
    ) -> Result<(), PowerturnError> {
        let request: G::ClientMessage = match self.codec.decode(frame) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(%conn, error = %e, "failed to decode request");
                return Err(e.into());
            }
        };

        self.tables
            .lock()
            .await
            .route_message(conn, request)
            .await?;
        Ok(())
    }

    /// Detaches `conn` from its table.
    pub async fn disconnect(&self, conn: ConnectionId) -> Result<(), PowerturnError> {
        self.tables.lock().await.detach_viewer(conn).await?;
        tracing::debug!(%conn, "viewer disconnected");
        Ok(())
    }

    pub async fn table_info(&self, table_id: TableId) -> Result<TableInfo, PowerturnError> {
        Ok(self.tables.lock().await.get_table_info(table_id).await?)
    }

    /// Shuts a table down. Its viewers' frame streams end.
    pub async fn close_table(&self, table_id: TableId) -> Result<(), PowerturnError> {
        self.tables.lock().await.destroy_table(table_id).await?;
        Ok(())
    }

    pub async fn table_of(&self, conn: ConnectionId) -> Option<TableId> {
        self.tables.lock().await.table_of(&conn)
    }
}

/// Encodes every envelope the table sends `conn` until either side hangs up.
async fn forward_frames<G: GameLogic, C: Codec>(
    conn: ConnectionId,
    mut envelopes: mpsc::UnboundedReceiver<Envelope<G::ServerMessage>>,
    frames: mpsc::UnboundedSender<Vec<u8>>,
    codec: Arc<C>,
) {
    while let Some(envelope) = envelopes.recv().await {
        let bytes = match codec.encode(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%conn, seq = envelope.seq, error = %e, "failed to encode event");
                continue;
            }
        };
        if frames.send(bytes).is_err() {
            tracing::debug!(%conn, "frame receiver dropped");
            break;
        }
    }
}
