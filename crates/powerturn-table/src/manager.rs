//! Table manager: creates tables, tracks which connection views which
//! table, and routes requests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use powerturn_protocol::{ConnectionId, TableId};
use powerturn_seats::{Roster, SeatDirectory};
use rand::Rng;

use crate::table::spawn_table;
use crate::{GameLogic, TableError, TableHandle, TableInfo, ViewerSender};

/// Counter for generating unique table IDs.
static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Owns every running table. Many matches run side by side; each has its
/// own actor and its own match context.
pub struct TableManager<G: GameLogic> {
    tables: HashMap<TableId, TableHandle<G>>,

    /// A connection views at most ONE table at a time (key invariant).
    viewer_tables: HashMap<ConnectionId, TableId>,
}

impl<G: GameLogic> TableManager<G> {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            viewer_tables: HashMap::new(),
        }
    }

    /// Reads the seat directory, creates a match with a random seed and
    /// returns its ID.
    pub fn create_table(
        &mut self,
        directory: &impl SeatDirectory,
        game_config: G::Config,
    ) -> Result<TableId, TableError> {
        let seed = rand::rng().random();
        self.create_table_seeded(directory, game_config, seed)
    }

    /// Same as [`create_table`](Self::create_table) with a fixed seed, for
    /// reproducible matches.
    pub fn create_table_seeded(
        &mut self,
        directory: &impl SeatDirectory,
        game_config: G::Config,
        seed: u64,
    ) -> Result<TableId, TableError> {
        let roster = Roster::from_directory(directory)?;
        let table_id = TableId(NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed));
        let handle = spawn_table::<G>(table_id, roster, &game_config, seed, G::table_config());
        self.tables.insert(table_id, handle);
        Ok(table_id)
    }

    /// Attaches `conn`'s viewer to a table.
    pub async fn attach_viewer(
        &mut self,
        conn: ConnectionId,
        table_id: TableId,
        sender: ViewerSender<G>,
    ) -> Result<(), TableError> {
        if let Some(current) = self.viewer_tables.get(&conn) {
            if *current == table_id {
                return Err(TableError::AlreadyAttached(conn, table_id));
            }
            return Err(TableError::InvalidState(format!(
                "connection {conn} is already viewing table {current}"
            )));
        }

        let handle = self
            .tables
            .get(&table_id)
            .ok_or(TableError::NotFound(table_id))?;

        handle.attach(conn, sender).await?;
        self.viewer_tables.insert(conn, table_id);
        Ok(())
    }

    /// Detaches `conn` from whatever table it views.
    pub async fn detach_viewer(&mut self, conn: ConnectionId) -> Result<(), TableError> {
        let table_id = self
            .viewer_tables
            .remove(&conn)
            .ok_or(TableError::NotAttached(conn))?;

        if let Some(handle) = self.tables.get(&table_id) {
            handle.detach(conn).await?;
        }
        Ok(())
    }

    /// Routes a request from `conn` to the table it views.
    pub async fn route_message(
        &self,
        conn: ConnectionId,
        msg: G::ClientMessage,
    ) -> Result<(), TableError> {
        let table_id = self
            .viewer_tables
            .get(&conn)
            .ok_or(TableError::NotAttached(conn))?;

        let handle = self
            .tables
            .get(table_id)
            .ok_or(TableError::NotFound(*table_id))?;

        handle.send_message(conn, msg).await
    }

    pub async fn get_table_info(&self, table_id: TableId) -> Result<TableInfo, TableError> {
        let handle = self
            .tables
            .get(&table_id)
            .ok_or(TableError::NotFound(table_id))?;
        handle.get_info().await
    }

    /// Shuts a table down and forgets every viewer attached to it.
    pub async fn destroy_table(&mut self, table_id: TableId) -> Result<(), TableError> {
        let handle = self
            .tables
            .remove(&table_id)
            .ok_or(TableError::NotFound(table_id))?;

        let _ = handle.shutdown().await;
        self.viewer_tables.retain(|_, tid| *tid != table_id);

        tracing::info!(%table_id, "table destroyed");
        Ok(())
    }

    pub fn table_of(&self, conn: &ConnectionId) -> Option<TableId> {
        self.viewer_tables.get(conn).copied()
    }

    /// Info for every table still running. Tables that fail to answer
    /// (shutting down) are skipped.
    pub async fn list_running(&self) -> Vec<TableInfo> {
        let mut infos = Vec::with_capacity(self.tables.len());
        for handle in self.tables.values() {
            if let Ok(info) = handle.get_info().await {
                if info.state.is_active() {
                    infos.push(info);
                }
            }
        }
        infos
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn table_ids(&self) -> Vec<TableId> {
        self.tables.keys().copied().collect()
    }
}

impl<G: GameLogic> Default for TableManager<G> {
    fn default() -> Self {
        Self::new()
    }
}
