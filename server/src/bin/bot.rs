//! Headless player for soak-testing a running server.
//!
//! Joins a room, follows the ball with its paddle and keeps the connection
//! alive with heartbeats until Ctrl+C.

use bincode::{deserialize, serialize};
use clap::Parser;
use log::{debug, info, warn};
use shared::{GameSnapshot, Packet, Role, Side};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{interval, MissedTickBehavior};

#[derive(Parser, Debug)]
#[command(author, version, about = "Pong bot that tracks the ball")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    server: SocketAddr,

    /// Room to join; a new one is created when omitted
    #[arg(short, long)]
    room: Option<String>,

    /// Points needed to win, only used when the room is created
    #[arg(short, long)]
    win_score: Option<u32>,

    /// easy, medium or hard
    #[arg(short, long)]
    difficulty: Option<String>,
}

/// Paddle offset that centres the paddle on the ball.
fn track(snapshot: &GameSnapshot, side: Side) -> f32 {
    let ball_centre = snapshot.ball.y + snapshot.ball.size / 2.0;
    ball_centre - snapshot.paddle_height(side) / 2.0
}

async fn send(socket: &UdpSocket, server: SocketAddr, packet: &Packet) -> std::io::Result<()> {
    let data = serialize(packet).map_err(std::io::Error::other)?;
    socket.send_to(&data, server).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    info!("Bot bound to {}", socket.local_addr()?);

    send(
        &socket,
        args.server,
        &Packet::JoinRoom {
            room: args.room,
            win_score: args.win_score,
            difficulty: args.difficulty,
        },
    )
    .await?;

    let mut heartbeat = interval(Duration::from_secs(1));
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut buf = [0u8; 2048];
    let mut seat: Option<(String, Option<Side>)> = None;
    let mut last_target: Option<f32> = None;

    loop {
        tokio::select! {
            received = socket.recv_from(&mut buf) => {
                let (len, _) = received?;
                let packet = match deserialize::<Packet>(&buf[..len]) {
                    Ok(packet) => packet,
                    Err(e) => {
                        warn!("Failed to decode packet: {}", e);
                        continue;
                    }
                };

                match packet {
                    Packet::PlayerType { room, role } => {
                        info!("Joined room {} as {}", room, role);
                        if role == Role::Spectator {
                            info!("Room is full, watching only");
                        }
                        seat = Some((room, role.side()));
                    }
                    Packet::GameState(snapshot) => {
                        let Some((room, Some(side))) = &seat else { continue };
                        let target = track(&snapshot, *side);
                        if last_target.map_or(true, |last| (last - target).abs() > 1.0) {
                            last_target = Some(target);
                            send(&socket, args.server, &Packet::PaddleMove { room: room.clone(), y: target }).await?;
                        }
                    }
                    Packet::Visual(event) => debug!("Visual: {:?}", event),
                    Packet::PauseState { paused } => info!("Paused: {}", paused),
                    Packet::Disconnected { reason } => {
                        warn!("Server disconnected us: {}", reason);
                        break;
                    }
                    other => debug!("Ignoring {:?}", other),
                }
            }
            _ = heartbeat.tick() => {
                send(&socket, args.server, &Packet::Heartbeat).await?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Leaving");
                send(&socket, args.server, &Packet::Disconnect).await?;
                break;
            }
        }
    }

    Ok(())
}
