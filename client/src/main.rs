use clap::Parser;
use client::identity::Identity;
use client::input::{Brush, Command};
use client::network::{Client, ClientConfig, ReconnectPolicy};
use log::{info, warn};
use shared::{DEFAULT_PORT, DEFAULT_ROOM_ID, MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY_MS};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// WebSocket URL of the drawing server
    #[arg(short = 's', long, default_value_t = format!("ws://127.0.0.1:{}", DEFAULT_PORT))]
    server: String,

    /// Room to join
    #[arg(short = 'r', long, default_value = DEFAULT_ROOM_ID)]
    room: String,

    /// Display name (defaults to a prefix of the user id)
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// User id (random if omitted)
    #[arg(long)]
    user_id: Option<String>,

    /// Cursor and roster color (random palette entry if omitted)
    #[arg(short = 'c', long)]
    color: Option<String>,

    /// Stroke color for drawn lines
    #[arg(long, default_value = "#000000")]
    brush_color: String,

    /// Stroke width for drawn lines
    #[arg(long, default_value_t = 3.0)]
    brush_width: f64,

    /// Reconnect attempts after a lost connection
    #[arg(long, default_value_t = MAX_RECONNECT_ATTEMPTS)]
    max_reconnects: u32,

    /// Delay between reconnect attempts in milliseconds
    #[arg(long, default_value_t = RECONNECT_DELAY_MS)]
    reconnect_delay_ms: u64,
}

/// Forwards parsed stdin lines; the channel closes at end of input.
fn spawn_stdin_reader(command_tx: mpsc::Sender<Command>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Ok(command) => {
                    if command_tx.send(command).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!("{}", e),
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let identity = Identity::resolve(&mut rand::thread_rng(), args.user_id, args.name, args.color);

    info!("Starting client...");
    info!("Joining room {} on {} as {}", args.room, args.server, identity.user_id);
    info!("Commands: line x1 y1 x2 y2 [steps], cursor x y, undo, redo, clear, status, quit");

    let (command_tx, mut command_rx) = mpsc::channel(64);
    spawn_stdin_reader(command_tx);

    let config = ClientConfig {
        server_url: args.server,
        room_id: args.room,
        identity,
        brush: Brush {
            color: args.brush_color,
            width: args.brush_width,
        },
        reconnect: ReconnectPolicy::new(
            args.max_reconnects,
            Duration::from_millis(args.reconnect_delay_ms),
        ),
    };
    config.validate()?;

    let mut client = Client::new(config);
    client.run(&mut command_rx).await?;

    Ok(())
}
