mod api;
mod config;
mod error;
mod watch;

use api::exchangerate::ExchangeRateClient;
use api::telegram::TelegramNotifier;
use config::Config;
use env_logger::Builder;
use log::{error, info, LevelFilter};
use std::error::Error;
use std::io::Write;
use tokio_util::sync::CancellationToken;
use watch::poll::{LoopExit, PollLoop};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    // A missing .env file is fine; real environment variables win.
    dotenvy::dotenv().ok();

    Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter_module("ratewatch", LevelFilter::Info)
        .parse_default_env() // RUST_LOG overrides the defaults above
        .format(|buf, record| {
            let ts = chrono::Local::now().format("%H:%M:%S%.3f");
            writeln!(
                buf,
                "[{} {:<5} {}] {}",
                ts,
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr)
        .init();

    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Starting {}/{} exchange rate watch with Telegram notifications...",
        cfg.base_currency, cfg.target_currency
    );
    info!("Threshold: > {:.4} {}", cfg.notification_threshold, cfg.target_currency);
    info!("Check interval: {:?}", cfg.check_interval);

    let http = reqwest::Client::builder()
        .timeout(cfg.request_timeout)
        .build()?;
    let source = ExchangeRateClient::new(http.clone(), &cfg.exchange_api_url, &cfg.api_key);
    let notifier = TelegramNotifier::new(
        http,
        &cfg.telegram_api_url,
        &cfg.telegram_token,
        &cfg.telegram_chat_id,
    );

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            cancel.cancel();
        }
    });

    let mut poll = PollLoop::new(cfg, source, notifier);
    match poll.run(cancel).await {
        LoopExit::ThresholdReached => info!("Threshold reached, exiting"),
        LoopExit::Cancelled => info!("Shutdown complete"),
    }
    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT"),
        () = terminate => info!("Received SIGTERM"),
    }
}
