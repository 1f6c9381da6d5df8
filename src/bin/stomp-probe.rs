use std::process::ExitCode;

use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use stomp_probe::script::{self, Exchange, Step};
use stomp_probe::*;

fn show(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).replace('\0', "^@")
}

fn print_exchange(exchange: &Exchange) {
    match encode(exchange.sent.clone()) {
        Ok(wire) => println!("Sending:\n{}", show(&wire)),
        Err(e) => println!("Sending: {} ({})", exchange.sent, e),
    }

    println!("\nReceived:");
    if exchange.received.is_empty() {
        println!("(nothing)");
        return;
    }
    println!("{}", show(&exchange.received));

    match decode_frames(&exchange.received) {
        Ok((items, rest)) => {
            for item in items {
                match item {
                    FrameOrKeepAlive::Frame(frame) => {
                        println!("  <- {}", frame);
                        if frame.body().is_some() {
                            println!("     {}", frame.body_lossy());
                        }
                    }
                    FrameOrKeepAlive::KeepAlive => println!("  <- heart-beat"),
                }
            }
            if rest > 0 {
                println!("  ({} bytes of an incomplete frame)", rest);
            }
        }
        Err(e) => warn!("Could not decode response: {}", e),
    }
}

async fn probe(config: &ProbeConfig) -> Result<()> {
    let mut plan = config.load_script()?;
    if let Some(receipt) = config.disconnect.as_deref() {
        plan.push(Step::new(Command::Disconnect).header("receipt", receipt));
    }
    let mut conn = connect(&config.host, config.port).await?;

    // `conn` is dropped, and the socket closed, if the run fails.
    script::run(&mut conn, &plan, config.timeout(), print_exchange).await?;
    conn.close().await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = ProbeConfig::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match probe(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(StompError::Connection { addr, source }) => {
            error!("connect failed: {}", source);
            eprintln!("Error: Could not connect to {}.", addr);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("probe failed: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
