//! Registry of live clients and their grid-cell subscriptions.
//!
//! One `GridRouter` is created at startup and shared by the WebSocket adapter
//! (which connects clients and manages subscriptions) and the domain services
//! (which publish through [`AlertEventPublisher`]). Each client owns an
//! unbounded channel, so publishing never waits on a slow socket.
//!
//! The registry lock is a `std::sync::Mutex`; nothing awaits while it is
//! held.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::UserId;
use crate::domain::events::{EventTopic, RealtimeEvent};
use crate::domain::geo::{Coordinates, GridCell};
use crate::domain::ports::AlertEventPublisher;

/// Receiving half handed to the connection that owns a client.
pub type EventReceiver = mpsc::UnboundedReceiver<Arc<RealtimeEvent>>;
type EventSender = mpsc::UnboundedSender<Arc<RealtimeEvent>>;

/// Which clients receive cell-scoped events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FanoutMode {
    /// Every event reaches every connected client; subscriptions are
    /// recorded but not used for routing.
    #[default]
    BroadcastAll,
    /// Cell events reach only clients subscribed to that cell.
    GeoFiltered,
}

/// Process-unique handle of one connected client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

struct ClientEntry {
    user_id: Option<UserId>,
    location: Option<Coordinates>,
    cells: HashSet<GridCell>,
    sender: EventSender,
}

#[derive(Default)]
struct RouterState {
    next_id: u64,
    clients: HashMap<ClientId, ClientEntry>,
    cells: HashMap<GridCell, HashSet<ClientId>>,
}

impl RouterState {
    fn join(&mut self, id: ClientId, centre: GridCell) {
        let Some(client) = self.clients.get_mut(&id) else {
            return;
        };
        for cell in centre.neighbourhood() {
            client.cells.insert(cell);
            self.cells.entry(cell).or_default().insert(id);
        }
    }

    fn leave(&mut self, id: ClientId, centre: GridCell) {
        let Some(client) = self.clients.get_mut(&id) else {
            return;
        };
        let cells = centre.neighbourhood();
        for cell in &cells {
            client.cells.remove(cell);
        }
        for cell in cells {
            self.drop_member(cell, id);
        }
    }

    fn drop_member(&mut self, cell: GridCell, id: ClientId) {
        if let Some(members) = self.cells.get_mut(&cell) {
            members.remove(&id);
            if members.is_empty() {
                self.cells.remove(&cell);
            }
        }
    }

    fn remove_client(&mut self, id: ClientId) -> Option<ClientEntry> {
        let client = self.clients.remove(&id)?;
        for cell in &client.cells {
            self.drop_member(*cell, id);
        }
        Some(client)
    }

    fn recipients(&self, mode: FanoutMode, topic: EventTopic) -> Vec<ClientId> {
        match (mode, topic) {
            (FanoutMode::GeoFiltered, EventTopic::Cell(cell)) => self
                .cells
                .get(&cell)
                .map(|members| members.iter().copied().collect())
                .unwrap_or_default(),
            _ => self.clients.keys().copied().collect(),
        }
    }
}

/// Connection registry and event router.
pub struct GridRouter {
    mode: FanoutMode,
    state: Mutex<RouterState>,
}

impl Default for GridRouter {
    fn default() -> Self {
        Self::new(FanoutMode::default())
    }
}

impl GridRouter {
    pub fn new(mode: FanoutMode) -> Self {
        Self {
            mode,
            state: Mutex::new(RouterState::default()),
        }
    }

    pub fn mode(&self) -> FanoutMode {
        self.mode
    }

    // Poisoning is ignored; every mutation leaves the maps consistent.
    fn lock(&self) -> MutexGuard<'_, RouterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a client and return the receiver its events arrive on.
    pub fn connect(&self, user_id: Option<UserId>) -> (ClientId, EventReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut state = self.lock();
        state.next_id += 1;
        let id = ClientId(state.next_id);
        state.clients.insert(
            id,
            ClientEntry {
                user_id,
                location: None,
                cells: HashSet::new(),
                sender,
            },
        );
        debug!(client_id = %id, user_id = ?user_id, "client connected");
        (id, receiver)
    }

    /// Forget a client and every cell it joined. Unknown ids are ignored.
    pub fn disconnect(&self, id: ClientId) {
        if self.lock().remove_client(id).is_some() {
            debug!(client_id = %id, "client disconnected");
        }
    }

    /// Record `position` and, in geo-filtered mode, join its 9-cell
    /// neighbourhood. Returns `false` for an unknown client.
    pub fn subscribe(&self, id: ClientId, position: Coordinates) -> bool {
        let mut state = self.lock();
        let Some(client) = state.clients.get_mut(&id) else {
            return false;
        };
        client.location = Some(position);
        if self.mode == FanoutMode::GeoFiltered {
            state.join(id, position.cell());
        }
        true
    }

    /// Leave the 9-cell neighbourhood of `position`.
    pub fn unsubscribe(&self, id: ClientId, position: Coordinates) -> bool {
        let mut state = self.lock();
        if !state.clients.contains_key(&id) {
            return false;
        }
        if self.mode == FanoutMode::GeoFiltered {
            state.leave(id, position.cell());
        }
        true
    }

    /// Move a client: leave the cells around its last location, join the
    /// cells around `position`.
    pub fn update_location(&self, id: ClientId, position: Coordinates) -> bool {
        let mut state = self.lock();
        let Some(client) = state.clients.get_mut(&id) else {
            return false;
        };
        let previous = client.location.replace(position);
        if self.mode == FanoutMode::GeoFiltered {
            if let Some(previous) = previous {
                state.leave(id, previous.cell());
            }
            state.join(id, position.cell());
        }
        true
    }

    pub fn connected_clients(&self) -> usize {
        self.lock().clients.len()
    }

    /// Number of clients subscribed to `cell`.
    pub fn subscribers_of(&self, cell: GridCell) -> usize {
        self.lock().cells.get(&cell).map_or(0, HashSet::len)
    }

    /// Cells `id` currently belongs to, sorted for stable comparisons.
    pub fn cells_of(&self, id: ClientId) -> Vec<GridCell> {
        let mut cells: Vec<GridCell> = self
            .lock()
            .clients
            .get(&id)
            .map(|client| client.cells.iter().copied().collect())
            .unwrap_or_default();
        cells.sort_by_key(|cell| (cell.lat_index(), cell.lon_index()));
        cells
    }

    /// Authenticated user behind a client, if any.
    pub fn user_of(&self, id: ClientId) -> Option<UserId> {
        self.lock().clients.get(&id).and_then(|client| client.user_id)
    }
}

impl AlertEventPublisher for GridRouter {
    fn publish(&self, topic: EventTopic, event: RealtimeEvent) {
        let event = Arc::new(event);
        let mut state = self.lock();
        let recipients = state.recipients(self.mode, topic);

        let mut closed = Vec::new();
        for id in &recipients {
            if let Some(client) = state.clients.get(id) {
                if client.sender.send(Arc::clone(&event)).is_err() {
                    closed.push(*id);
                }
            }
        }
        for id in closed {
            state.remove_client(id);
        }

        debug!(
            event = event.name(),
            ?topic,
            recipients = recipients.len(),
            "published realtime event"
        );
    }
}

#[cfg(test)]
#[path = "grid_router_tests.rs"]
mod tests;
