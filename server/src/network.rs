//! UDP transport and the fixed-rate tick driver
//!
//! Three background tasks do the I/O: a receiver that decodes datagrams, a
//! sender that encodes and writes outgoing packets, and a timeout checker.
//! Everything that touches room state runs on the task that owns `Server`,
//! so lobby operations and ticks are strictly serialized.

use crate::client_manager::ClientManager;
use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::lobby::{JoinRequest, Lobby, Outbound, Outbox};
use crate::room::ClientId;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::Packet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, MissedTickBehavior};

const RECV_BUFFER_SIZE: usize = 2048;
const TIMEOUT_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Messages sent from network tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { packet: Packet, addr: SocketAddr },
    ClientTimeout { client_id: ClientId },
    Shutdown,
}

/// Messages sent from the main loop to the sender task
#[derive(Debug)]
pub enum GameMessage {
    SendPacket {
        packet: Packet,
        addr: SocketAddr,
    },
    /// One packet to several recipients, encoded once.
    Multicast {
        packet: Packet,
        addrs: Vec<SocketAddr>,
    },
}

pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    lobby: Lobby,
    outbox: Outbox,
    config: ServerConfig,
    tick: u64,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(config: ServerConfig) -> Result<Self> {
        let addr: SocketAddr = config
            .bind_addr
            .parse()
            .map_err(|_| ServerError::InvalidAddr(config.bind_addr.clone()))?;
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(config.max_clients))),
            lobby: Lobby::new(),
            outbox: Outbox::new(),
            config,
            tick: 0,
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Handle for stopping `run` from another task via `ServerMessage::Shutdown`.
    pub fn shutdown_handle(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    pub fn lobby(&self) -> &Lobby {
        &self.lobby
    }

    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; RECV_BUFFER_SIZE];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => match deserialize::<Packet>(&buffer[..len]) {
                        Ok(packet) => {
                            if server_tx
                                .send(ServerMessage::PacketReceived { packet, addr })
                                .is_err()
                            {
                                debug!("Main loop gone, stopping receiver");
                                break;
                            }
                        }
                        Err(e) => warn!("Failed to decode packet from {}: {}", addr, e),
                    },
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, &[addr]).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    GameMessage::Multicast { packet, addrs } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, &addrs).await {
                            error!("Failed to multicast packet: {}", e);
                        }
                    }
                }
            }
        });
    }

    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();
        let timeout = self.config.client_timeout;

        tokio::spawn(async move {
            let mut interval = interval(TIMEOUT_CHECK_INTERVAL);

            loop {
                interval.tick().await;

                let timed_out = clients.write().await.check_timeouts(timeout);
                for client_id in timed_out {
                    info!("Client {} timed out", client_id);
                    if server_tx
                        .send(ServerMessage::ClientTimeout { client_id })
                        .is_err()
                    {
                        return;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addrs: &[SocketAddr],
    ) -> Result<()> {
        let data = serialize(packet)?;
        for addr in addrs {
            socket.send_to(&data, *addr).await?;
        }
        Ok(())
    }

    fn queue(&self, message: GameMessage) {
        if let Err(e) = self.game_tx.send(message) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    /// Resolves everything in the outbox to addresses and hands it to the sender.
    async fn dispatch(&mut self) {
        if self.outbox.is_empty() {
            return;
        }

        let clients = self.clients.read().await;
        for message in self.outbox.drain() {
            match message {
                Outbound::ToClient { client_id, packet } => match clients.get_addr(client_id) {
                    Some(addr) => {
                        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { packet, addr })
                        {
                            error!("Failed to queue packet for client {}: {}", client_id, e);
                        }
                    }
                    None => debug!("Dropping packet for departed client {}", client_id),
                },
                Outbound::ToRoom { room, packet } => {
                    let addrs = clients.addrs_of(&self.lobby.room_members(&room));
                    if addrs.is_empty() {
                        continue;
                    }
                    if let Err(e) = self.game_tx.send(GameMessage::Multicast { packet, addrs }) {
                        error!("Failed to queue broadcast for room {}: {}", room, e);
                    }
                }
            }
        }
    }

    /// Looks up the sender of a non-join packet and refreshes its timestamp.
    async fn known_client(&self, addr: SocketAddr) -> Option<ClientId> {
        let mut clients = self.clients.write().await;
        let client_id = clients.find_client_by_addr(addr)?;
        clients.touch(client_id);
        Some(client_id)
    }

    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        let now = Instant::now();

        match packet {
            Packet::JoinRoom {
                room,
                win_score,
                difficulty,
            } => {
                let client_id = match self.known_client(addr).await {
                    Some(id) => Some(id),
                    None => self.clients.write().await.add_client(addr),
                };

                let Some(client_id) = client_id else {
                    warn!("Rejecting {}: server full", addr);
                    self.queue(GameMessage::SendPacket {
                        packet: Packet::Disconnected {
                            reason: "Server full".to_string(),
                        },
                        addr,
                    });
                    return;
                };

                let request = JoinRequest {
                    room,
                    win_score,
                    difficulty,
                };
                self.lobby.join(client_id, request, now, &mut self.outbox);
            }

            Packet::PaddleMove { room, y } => {
                if let Some(client_id) = self.known_client(addr).await {
                    if let Err(e) = self.lobby.paddle_move(client_id, &room, y) {
                        debug!("Ignoring paddle move from client {}: {}", client_id, e);
                    }
                }
            }

            Packet::TogglePause { room, paused } => {
                if let Some(client_id) = self.known_client(addr).await {
                    if let Err(e) = self.lobby.toggle_pause(&room, paused, &mut self.outbox) {
                        debug!("Ignoring pause from client {}: {}", client_id, e);
                    }
                }
            }

            Packet::RestartGame { room } => {
                if let Some(client_id) = self.known_client(addr).await {
                    if let Err(e) = self.lobby.restart(&room, now, &mut self.outbox) {
                        debug!("Ignoring restart from client {}: {}", client_id, e);
                    }
                }
            }

            Packet::Heartbeat => {
                self.known_client(addr).await;
            }

            Packet::Disconnect => {
                let client_id = self.clients.read().await.find_client_by_addr(addr);
                if let Some(client_id) = client_id {
                    self.clients.write().await.remove_client(client_id);
                    self.leave_lobby(client_id);
                }
            }

            _ => {
                warn!("Unexpected packet type from {}", addr);
            }
        }

        self.dispatch().await;
    }

    fn leave_lobby(&mut self, client_id: ClientId) {
        if let Some(departure) = self.lobby.disconnect(client_id) {
            if departure.room_closed {
                debug!("Room {} closed after client {} left", departure.room, client_id);
            }
        }
    }

    async fn run_tick(&mut self, now: Instant) {
        let report = self.lobby.tick(now, &mut self.outbox);
        self.dispatch().await;
        self.tick += 1;

        if self.tick % u64::from(self.config.tick_rate.max(1)) == 0 && report.rooms > 0 {
            let client_count = self.clients.read().await.len();
            debug!(
                "Tick {}: {} clients, {} rooms, {} playing, {} timers",
                self.tick,
                client_count,
                report.rooms,
                report.advanced,
                self.lobby.pending_timers()
            );
        }
    }

    /// Main server loop. Returns once a shutdown message arrives.
    pub async fn run(&mut self) -> Result<()> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        let mut tick_interval = interval(self.config.tick_duration());
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Server started at {} Hz, max {} clients",
            self.config.tick_rate, self.config.max_clients
        );

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        Some(ServerMessage::ClientTimeout { client_id }) => {
                            self.leave_lobby(client_id);
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = tick_interval.tick() => {
                    self.run_tick(Instant::now()).await;
                },
            }
        }

        Ok(())
    }
}
