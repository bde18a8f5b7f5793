//! Synthetic YUV pusher
//!
//! Run with: cargo run --example yuv_pusher URL [WIDTH HEIGHT FPS]
//!
//! Examples:
//!   cargo run --example yuv_pusher rtsp://127.0.0.1/live/test
//!   cargo run --example yuv_pusher rtmp://127.0.0.1/live/test 1920 1080 15
//!
//! Generates randomly colored frames, registers them as a source in the
//! in-process engine and pushes that source to URL while it is registered.
//! Stop with Ctrl+C.

use std::sync::Arc;

use tokio::sync::watch;

use yuv_pusher::engine::{LocalEngine, VideoInfo};
use yuv_pusher::{ColorMode, FrameProducer, PushConfig, PushOrchestrator};

fn print_usage() {
    eprintln!("Usage: yuv_pusher URL [WIDTH HEIGHT FPS] [--rgb]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  URL       Push destination (rtsp://, rtmp://, ...)");
    eprintln!("  WIDTH     Picture width (default: 640)");
    eprintln!("  HEIGHT    Picture height (default: 360)");
    eprintln!("  FPS       Frame rate (default: 25)");
    eprintln!("  --rgb     Pick random RGB colors and convert with BT.601");
}

fn parse_args(args: &[String]) -> Result<PushConfig, String> {
    let positional: Vec<&String> = args.iter().skip(1).filter(|a| !a.starts_with("--")).collect();

    let url = positional.first().ok_or("missing URL")?;
    let mut config = PushConfig::new(url.as_str());

    match positional.len() {
        1 => {}
        4 => {
            let parse = |name: &str, value: &str| {
                value
                    .parse::<u32>()
                    .map_err(|_| format!("invalid {}: '{}'", name, value))
            };
            config = config
                .size(parse("width", positional[1])?, parse("height", positional[2])?)
                .fps(parse("fps", positional[3])?);
        }
        _ => return Err("expected either URL or URL WIDTH HEIGHT FPS".to_string()),
    }

    if args.iter().any(|a| a == "--rgb") {
        config = config.color_mode(ColorMode::RandomRgb);
    }

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let config = match parse_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("yuv_pusher=info".parse()?),
        )
        .init();

    let engine = Arc::new(LocalEngine::from_config(&config));
    let (stop_tx, stop_rx) = watch::channel(false);

    let stopped = |mut rx: watch::Receiver<bool>| async move {
        let _ = rx.changed().await;
    };

    // Subscribe before the source registers so its first event is not missed
    let orchestrator = PushOrchestrator::new(Arc::clone(&engine), &config.target_url)
        .watch(config.source_key());
    let push_task = tokio::spawn(orchestrator.run_until(engine.subscribe(), stopped(stop_rx.clone())));

    let media = Arc::new(engine.create_media(config.source_key(), VideoInfo::from(&config)));
    media.init_complete();

    let producer = match FrameProducer::new(&config, Arc::clone(&media)) {
        Ok(producer) => producer,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start frame producer");
            std::process::exit(1);
        }
    };

    tracing::info!(
        url = %config.target_url,
        width = config.width,
        height = config.height,
        fps = config.fps,
        "Generating random YUV frames"
    );
    let producer_task = producer.spawn(stopped(stop_rx));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");
    let _ = stop_tx.send(true);

    let produced = producer_task.await?;
    media.release();
    let pushed = push_task.await?;

    tracing::info!(
        frames = produced.frames_submitted,
        sessions = pushed.sessions_created,
        failures = pushed.publish_failures,
        interruptions = pushed.interruptions,
        "Stopped"
    );

    Ok(())
}
