use crate::context::ExecutionContext;
use crate::presentation::{LiveUpdateLine, Palette};
use anyhow::{Result, bail};
use gamewatch_runtime::{
    ConfigFileCatalog, LogNotifier, NetworkProber, PolicyNotifier, PollEngine, SqliteStore,
    StatusHub, StatusUpdate,
};
use gamewatch_types::ServerId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, warn};

pub fn handle(ctx: &ExecutionContext, duration: Option<u64>, quiet: bool) -> Result<()> {
    let config = ctx.config()?.clone();
    if config.servers.is_empty() {
        bail!(
            "No servers configured in {}. Add [[servers]] entries or run `gamewatch init`.",
            ctx.config_path().display()
        );
    }

    // Drop status rows of servers that left the config
    let keep: Vec<ServerId> = config.servers().iter().map(|s| s.id).collect();
    let removed = ctx.db()?.retain_statuses(&keep)?;
    if removed > 0 {
        info!(removed, "dropped status of servers no longer configured");
    }

    let store = Arc::new(SqliteStore::open(&ctx.db_path())?);
    let catalog = Arc::new(ConfigFileCatalog::new(
        ctx.config_path().to_path_buf(),
        config.servers(),
    ));
    let prober = Arc::new(NetworkProber::new(config.poller.probe_timeout()));
    let notifier = Arc::new(PolicyNotifier::new(Arc::new(LogNotifier), config.policies()));
    let hub = StatusHub::default();

    let palette = Palette::new(ctx.color);
    let json = ctx.is_json();
    let server_count = config.servers.len();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let printer = (!quiet).then(|| tokio::spawn(print_updates(hub.subscribe(), palette, json)));

        let engine = PollEngine::new(config.poller, catalog, store, prober)
            .with_sink(Arc::new(hub.clone()))
            .with_notifier(notifier)
            .start()
            .await?;

        let cancel = engine.cancel_token();
        let on_signal = cancel.clone();
        ctrlc::set_handler(move || on_signal.cancel())?;

        eprintln!("Polling {} servers. Press Ctrl-C to stop.", server_count);

        match duration {
            Some(secs) => {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(Duration::from_secs(secs)) => {}
                }
            }
            None => cancel.cancelled().await,
        }

        let report = engine.stop().await;
        drop(hub);
        if let Some(printer) = printer
            && let Err(err) = printer.await
        {
            warn!(error = %err, "status printer failed");
        }

        eprintln!(
            "Stopped: {} results applied, {} history points flushed",
            report.results_applied, report.history_flushed
        );
        if report.alerts_delivered.is_none() {
            eprintln!("Some alerts were not delivered before shutdown.");
        }
        Ok(())
    })
}

/// Print every status update until the hub closes.
async fn print_updates(mut updates: broadcast::Receiver<StatusUpdate>, palette: Palette, json: bool) {
    loop {
        match updates.recv().await {
            Ok(update) => {
                if json {
                    if let Ok(line) = serde_json::to_string(&update.snapshot) {
                        println!("{}", line);
                    }
                } else {
                    println!(
                        "{}",
                        LiveUpdateLine {
                            update: &update,
                            palette,
                        }
                    );
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                eprintln!("({} updates skipped)", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
