//! Table actor: an isolated Tokio task that owns one match.
//!
//! Every request, attach, detach and host tick for a match goes through
//! this task's single `select!` loop, so no two handlers ever interleave
//! on the same match context. That is the whole concurrency story for a
//! match: no locks, one dispatch queue.

use std::collections::{HashMap, HashSet};

use powerturn_protocol::{ConnectionId, Envelope, Recipient, TableId};
use powerturn_seats::Roster;
use powerturn_tick::{HostTicker, TickConfig};
use tokio::sync::{mpsc, oneshot};

use crate::{GameLogic, Outbox, TableConfig, TableError, TableState};

/// Channel sender for delivering host messages to one viewer.
pub type ViewerSender<G> = mpsc::UnboundedSender<Envelope<<G as GameLogic>::ServerMessage>>;

/// Commands sent to a table actor through its queue.
pub(crate) enum TableCommand<G: GameLogic> {
    Attach {
        conn: ConnectionId,
        sender: ViewerSender<G>,
        reply: oneshot::Sender<Result<(), TableError>>,
    },

    Detach {
        conn: ConnectionId,
        reply: oneshot::Sender<Result<(), TableError>>,
    },

    /// A request from a viewer, tagged with the connection it arrived on.
    Message {
        sender: ConnectionId,
        msg: G::ClientMessage,
    },

    GetInfo {
        reply: oneshot::Sender<TableInfo>,
    },

    Shutdown,
}

/// A snapshot of table metadata (not the match itself).
#[derive(Debug, Clone)]
pub struct TableInfo {
    pub table_id: TableId,
    pub state: TableState,
    /// Seats at the table, bots included.
    pub seat_count: usize,
    /// Viewers currently attached.
    pub viewer_count: usize,
}

/// Handle to a running table actor. Cheap to clone.
#[derive(Clone)]
pub struct TableHandle<G: GameLogic> {
    table_id: TableId,
    sender: mpsc::Sender<TableCommand<G>>,
}

impl<G: GameLogic> TableHandle<G> {
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Attaches a viewer for the seat owned by `conn`.
    pub async fn attach(
        &self,
        conn: ConnectionId,
        sender: ViewerSender<G>,
    ) -> Result<(), TableError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(TableCommand::Attach {
            conn,
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| TableError::Unavailable(self.table_id))?
    }

    /// Detaches the viewer of `conn`. The game logic treats this as the
    /// seat leaving the match.
    pub async fn detach(&self, conn: ConnectionId) -> Result<(), TableError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(TableCommand::Detach {
            conn,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| TableError::Unavailable(self.table_id))?
    }

    /// Queues a request (fire-and-forget).
    pub async fn send_message(
        &self,
        sender: ConnectionId,
        msg: G::ClientMessage,
    ) -> Result<(), TableError> {
        self.send(TableCommand::Message { sender, msg }).await
    }

    pub async fn get_info(&self) -> Result<TableInfo, TableError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(TableCommand::GetInfo { reply: reply_tx }).await?;
        reply_rx
            .await
            .map_err(|_| TableError::Unavailable(self.table_id))
    }

    pub async fn shutdown(&self) -> Result<(), TableError> {
        self.send(TableCommand::Shutdown).await
    }

    async fn send(&self, cmd: TableCommand<G>) -> Result<(), TableError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| TableError::Unavailable(self.table_id))
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct TableActor<G: GameLogic> {
    table_id: TableId,
    state: TableState,
    /// Every connection that owns a seat; only these may attach.
    seated: HashSet<ConnectionId>,
    /// Human connections; only these may send requests. Bot requests are
    /// produced inside the game logic.
    humans: HashSet<ConnectionId>,
    viewers: HashMap<ConnectionId, ViewerSender<G>>,
    game: G::State,
    ticker: HostTicker,
    /// Last envelope sequence number handed out.
    seq: u64,
    receiver: mpsc::Receiver<TableCommand<G>>,
}

impl<G: GameLogic> TableActor<G> {
    async fn run(mut self) {
        tracing::info!(table_id = %self.table_id, "table actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    match cmd {
                        TableCommand::Attach { conn, sender, reply } => {
                            let result = self.handle_attach(conn, sender);
                            let _ = reply.send(result);
                        }
                        TableCommand::Detach { conn, reply } => {
                            let result = self.handle_detach(conn);
                            let _ = reply.send(result);
                        }
                        TableCommand::Message { sender, msg } => {
                            self.handle_message(sender, msg);
                        }
                        TableCommand::GetInfo { reply } => {
                            let _ = reply.send(self.info());
                        }
                        TableCommand::Shutdown => {
                            tracing::info!(table_id = %self.table_id, "table shutting down");
                            self.state = TableState::Destroying;
                            break;
                        }
                    }
                }
                tick = self.ticker.wait_for_tick() => {
                    if self.state.is_active() {
                        let out = G::tick(&mut self.game, tick.elapsed);
                        self.dispatch(out);
                        self.check_finished();
                    }
                }
            }
        }

        tracing::info!(table_id = %self.table_id, "table actor stopped");
    }

    fn handle_attach(
        &mut self,
        conn: ConnectionId,
        sender: ViewerSender<G>,
    ) -> Result<(), TableError> {
        if self.state == TableState::Destroying {
            return Err(TableError::InvalidState(format!(
                "cannot attach to table in state {}",
                self.state
            )));
        }
        if !self.seated.contains(&conn) {
            return Err(TableError::NotSeated(conn, self.table_id));
        }
        if self.viewers.contains_key(&conn) {
            return Err(TableError::AlreadyAttached(conn, self.table_id));
        }

        self.viewers.insert(conn, sender);
        tracing::info!(
            table_id = %self.table_id,
            %conn,
            viewers = self.viewers.len(),
            "viewer attached"
        );

        let out = G::on_viewer_attached(&mut self.game, conn);
        self.dispatch(out);
        Ok(())
    }

    fn handle_detach(&mut self, conn: ConnectionId) -> Result<(), TableError> {
        if self.viewers.remove(&conn).is_none() {
            return Err(TableError::NotAttached(conn));
        }

        tracing::info!(
            table_id = %self.table_id,
            %conn,
            viewers = self.viewers.len(),
            "viewer detached"
        );

        if self.state.is_active() {
            let out = G::on_viewer_detached(&mut self.game, conn);
            self.dispatch(out);
            self.check_finished();
        }
        Ok(())
    }

    fn handle_message(&mut self, sender: ConnectionId, msg: G::ClientMessage) {
        if !self.humans.contains(&sender) {
            tracing::warn!(
                table_id = %self.table_id,
                %sender,
                "request from a connection without a human seat, ignoring"
            );
            return;
        }
        if !self.state.is_active() {
            return;
        }

        if let Err(reason) = G::validate_message(&self.game, sender, &msg) {
            tracing::debug!(
                table_id = %self.table_id,
                %sender,
                %reason,
                "request dropped"
            );
            return;
        }

        let out = G::handle_message(&mut self.game, sender, msg);
        self.dispatch(out);
        self.check_finished();
    }

    fn check_finished(&mut self) {
        if self.state.is_active() && G::is_finished(&self.game) {
            self.state = TableState::Finished;
            self.ticker.pause();
            tracing::info!(table_id = %self.table_id, "match finished");
        }
    }

    /// Wraps each message in an envelope and delivers it to the
    /// connections its recipient names.
    fn dispatch(&mut self, out: Outbox<G::ServerMessage>) {
        let host_time_ms = self.ticker.host_time_ms();
        for (recipient, msg) in out {
            self.seq += 1;
            let envelope = Envelope::new(self.seq, host_time_ms, msg);
            match recipient {
                Recipient::Connection(conn) => self.send_to(conn, envelope),
                Recipient::All | Recipient::AllExcept(_) => {
                    for (conn, sender) in &self.viewers {
                        if recipient.includes(*conn) {
                            let _ = sender.send(envelope.clone());
                        }
                    }
                }
            }
        }
    }

    /// Silently drops if the viewer is gone.
    fn send_to(&self, conn: ConnectionId, envelope: Envelope<G::ServerMessage>) {
        if let Some(sender) = self.viewers.get(&conn) {
            let _ = sender.send(envelope);
        }
    }

    fn info(&self) -> TableInfo {
        TableInfo {
            table_id: self.table_id,
            state: self.state,
            seat_count: self.seated.len(),
            viewer_count: self.viewers.len(),
        }
    }
}

/// Creates the match context and spawns its actor task.
pub(crate) fn spawn_table<G: GameLogic>(
    table_id: TableId,
    roster: Roster,
    game_config: &G::Config,
    seed: u64,
    config: TableConfig,
) -> TableHandle<G> {
    let (tx, rx) = mpsc::channel(config.channel_size);

    let seated = roster.seats().iter().map(|s| s.connection_id).collect();
    let humans = roster.human_connections().collect();
    let seat_count = roster.len();
    let (game, initial) = G::init(game_config, roster, seed);

    let mut actor = TableActor::<G> {
        table_id,
        state: TableState::Running,
        seated,
        humans,
        viewers: HashMap::new(),
        game,
        ticker: HostTicker::new(TickConfig::with_rate(config.tick_rate_hz)),
        seq: 0,
        receiver: rx,
    };
    // Nobody is attached yet; this only advances `seq`. Viewers get the
    // opening state through `on_viewer_attached`.
    actor.dispatch(initial);

    tracing::info!(%table_id, seats = seat_count, seed, "match created");
    tokio::spawn(actor.run());

    TableHandle {
        table_id,
        sender: tx,
    }
}
