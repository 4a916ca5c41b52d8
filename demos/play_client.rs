// RTMP Play Client
//
// Connects to a server, plays a live stream for about ten seconds and
// reports what arrived.
//
// Usage:
//   cargo run --example play_client -- <ip> <port> <app/stream>
//   cargo run --example play_client -- 127.0.0.1 1935 live/test

use rtmp::{ClientConfig, MessageHandler, PlayTarget, RtmpClient, RtmpMessage, Result};
use std::env;
use std::process::ExitCode;
use log::{error, info};

/// Counts media as it arrives
#[derive(Default)]
struct Counter {
    audio: usize,
    video: usize,
    bytes: usize,
}

impl MessageHandler for Counter {
    fn on_audio(&mut self, message: &RtmpMessage) {
        self.audio += 1;
        self.bytes += message.length();
    }

    fn on_video(&mut self, message: &RtmpMessage) {
        self.video += 1;
        self.bytes += message.length();
        if self.video % 100 == 0 {
            info!("{} video / {} audio messages, {} bytes", self.video, self.audio, self.bytes);
        }
    }
}

async fn play(target: PlayTarget) -> Result<()> {
    let config = ClientConfig::builder().build()?;
    let mut client = RtmpClient::connect_tcp(target, config)
        .await?
        .with_handler(Box::new(Counter::default()));

    let state = client.run().await?;
    info!("Finished in state {:?}, stream id {:?}", state, client.stream_id());
    client.close();
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 4 {
        eprintln!("Usage: {} <ip> <port> <app/stream>", args[0]);
        eprintln!("Example: {} 127.0.0.1 1935 live/test", args[0]);
        return ExitCode::FAILURE;
    }

    let port = match args[2].parse::<u16>() {
        Ok(port) => port,
        Err(e) => {
            eprintln!("Invalid port {}: {}", args[2], e);
            return ExitCode::FAILURE;
        }
    };

    let target = match PlayTarget::from_parts(&args[1], port, &args[3]) {
        Ok(target) => target,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match play(target).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Session failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
