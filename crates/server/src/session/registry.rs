//! The session registry: the one shared mutable structure every task
//! touches. A mutex-guarded map of live connections plus a mutation lock
//! per game id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::session::protocol::ServerMessage;
use crate::storage::GameId;

pub type ConnId = u64;

/// One live socket: who it is, which game it watches, and the channel its
/// writer task drains.
#[derive(Debug, Clone)]
pub struct Connection {
    pub identity: String,
    pub game_id: GameId,
    pub tx: mpsc::UnboundedSender<ServerMessage>,
}

#[derive(Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnId, Connection>>,
    next_id: AtomicU64,
    game_locks: Mutex<HashMap<GameId, Arc<tokio::sync::Mutex<()>>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_conn_id(&self) -> ConnId {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn insert(&self, id: ConnId, connection: Connection) {
        let mut map = self.connections.lock().expect("registry lock poisoned");
        map.insert(id, connection);
    }

    pub fn remove(&self, id: ConnId) -> Option<Connection> {
        let mut map = self.connections.lock().expect("registry lock poisoned");
        map.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.connections.lock().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The mutation slot for a game. MOVE/RESIGN/LEAVE hold this across
    /// their read-modify-write so two near-simultaneous commands on one
    /// game cannot both read the same pre-move record.
    pub fn game_lock(&self, game_id: GameId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.game_locks.lock().expect("registry lock poisoned");
        locks
            .entry(game_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Drop a game's mutation slot once nothing is connected to it. Callers
    /// still holding a guard keep their clone of the mutex alive; only the
    /// map entry goes.
    pub fn prune_game_lock(&self, game_id: GameId) {
        let connections = self.connections.lock().expect("registry lock poisoned");
        if connections.values().all(|c| c.game_id != game_id) {
            let mut locks = self.game_locks.lock().expect("registry lock poisoned");
            locks.remove(&game_id);
        }
    }

    /// Send the same message to every connection in a game, minus an
    /// optional excluded sender. Works on a snapshot; connections whose
    /// channel has closed are pruned, never failing the rest.
    pub fn broadcast(&self, game_id: GameId, exclude: Option<ConnId>, message: &ServerMessage) {
        self.broadcast_with(game_id, exclude, |_| message.clone());
    }

    /// Broadcast with a per-recipient message, e.g. a board view oriented
    /// to each viewer's color.
    pub fn broadcast_with<F>(&self, game_id: GameId, exclude: Option<ConnId>, build: F)
    where
        F: Fn(&Connection) -> ServerMessage,
    {
        let snapshot: Vec<(ConnId, Connection)> = {
            let map = self.connections.lock().expect("registry lock poisoned");
            map.iter()
                .filter(|(_, c)| c.game_id == game_id)
                .map(|(&id, c)| (id, c.clone()))
                .collect()
        };

        let mut dead = Vec::new();
        for (id, connection) in snapshot {
            if exclude == Some(id) {
                continue;
            }
            if connection.tx.send(build(&connection)).is_err() {
                dead.push(id);
            }
        }
        for id in dead {
            tracing::debug!("pruning closed connection {id}");
            self.remove(id);
        }
    }
}
