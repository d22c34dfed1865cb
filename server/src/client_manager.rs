//! Connection tracking for the pong server
//!
//! UDP has no connections, so a client is simply an address that sent a
//! `JoinRoom`. Every later packet from that address refreshes its activity
//! timestamp; addresses that stay silent past the timeout are dropped and
//! handled exactly like an explicit disconnect.

use crate::room::ClientId;
use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Client {
    pub id: ClientId,
    /// Where responses and room broadcasts are sent
    pub addr: SocketAddr,
    /// Last time any packet arrived from this client
    pub last_seen: Instant,
}

impl Client {
    pub fn new(id: ClientId, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Every known connection, indexed both by id and by address.
///
/// Ids are handed out sequentially from 1 and never reused while the
/// server runs.
pub struct ClientManager {
    clients: HashMap<ClientId, Client>,
    by_addr: HashMap<SocketAddr, ClientId>,
    next_client_id: ClientId,
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            by_addr: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Registers a new address. Returns `None` when the server is at capacity.
    pub fn add_client(&mut self, addr: SocketAddr) -> Option<ClientId> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} connected from {}", client_id, addr);
        self.clients.insert(client_id, Client::new(client_id, addr));
        self.by_addr.insert(addr, client_id);

        Some(client_id)
    }

    pub fn remove_client(&mut self, client_id: ClientId) -> bool {
        match self.clients.remove(&client_id) {
            Some(client) => {
                self.by_addr.remove(&client.addr);
                info!("Client {} disconnected", client.id);
                true
            }
            None => false,
        }
    }

    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<ClientId> {
        self.by_addr.get(&addr).copied()
    }

    /// Refreshes the activity timestamp. Returns false for unknown ids.
    pub fn touch(&mut self, client_id: ClientId) -> bool {
        match self.clients.get_mut(&client_id) {
            Some(client) => {
                client.touch();
                true
            }
            None => false,
        }
    }

    pub fn get_addr(&self, client_id: ClientId) -> Option<SocketAddr> {
        self.clients.get(&client_id).map(|client| client.addr)
    }

    /// Addresses for a set of ids, skipping any that are no longer connected.
    pub fn addrs_of(&self, client_ids: &[ClientId]) -> Vec<SocketAddr> {
        client_ids
            .iter()
            .filter_map(|id| self.get_addr(*id))
            .collect()
    }

    /// Removes clients silent for longer than `timeout` and returns their ids.
    pub fn check_timeouts(&mut self, timeout: Duration) -> Vec<ClientId> {
        let timed_out: Vec<ClientId> = self
            .clients
            .values()
            .filter(|client| client.is_timed_out(timeout))
            .map(|client| client.id)
            .collect();

        for client_id in &timed_out {
            self.remove_client(*client_id);
        }

        timed_out
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
