//! Full engine runs against loopback mock servers.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use gamewatch_index::Database;
use gamewatch_runtime::{
    MemoryStore, NetworkProber, PollEngine, PollerConfig, SqliteStore, StaticCatalog, StatusHub,
    StatusUpdate,
};
use gamewatch_testing::fixtures::{A2sInfo, SampInfo, minecraft_status_json};
use gamewatch_testing::{MockMinecraftServer, MockSampServer, MockSourceServer};
use gamewatch_types::{GameType, Server, ServerId};
use tokio::sync::broadcast;

fn fast_config() -> PollerConfig {
    PollerConfig {
        workers: 4,
        tick_ms: 20,
        active_interval_ms: 100,
        idle_interval_ms: 100,
        probe_timeout_ms: 150,
        batch_interval_ms: 100,
        alert_drain_timeout_ms: 1_000,
        ..PollerConfig::default()
    }
}

fn server(id: u64, game: GameType, addr: std::net::SocketAddr) -> Server {
    Server::new(id, addr.ip().to_string(), addr.port(), game)
}

async fn wait_until(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..500 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Next update matching `pred`, skipping the rest.
async fn next_update(
    rx: &mut broadcast::Receiver<StatusUpdate>,
    pred: impl Fn(&StatusUpdate) -> bool,
) -> StatusUpdate {
    let wait = async {
        loop {
            match rx.recv().await {
                Ok(update) if pred(&update) => return update,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("status hub closed"),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .expect("timed out waiting for status update")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_minecraft_roster_becomes_sessions() -> Result<()> {
    let mock = MockMinecraftServer::start(minecraft_status_json(
        2,
        20,
        &["Alice", "Bob"],
        "§aWelcome",
    ))
    .await?;
    let id = ServerId::new(1);
    let store = Arc::new(MemoryStore::new());
    let config = fast_config();

    let engine = PollEngine::new(
        config.clone(),
        Arc::new(StaticCatalog::new(vec![server(1, GameType::Minecraft, mock.addr())])),
        store.clone(),
        Arc::new(NetworkProber::new(config.probe_timeout())),
    )
    .start()
    .await?;

    assert!(wait_until(|| store.open_players(id) == vec!["Alice", "Bob"]).await);
    let status = store.status(id).unwrap();
    assert!(status.online);
    assert_eq!(status.players_now, 2);
    assert_eq!(status.players_max, 20);
    assert_eq!(status.map, "world");

    mock.set_json(minecraft_status_json(1, 20, &["Bob"], "§aWelcome"));
    assert!(wait_until(|| store.open_players(id) == vec!["Bob"]).await);

    let report = engine.stop().await;
    assert!(report.results_applied >= 2);

    let alice: Vec<_> = store
        .sessions()
        .into_iter()
        .filter(|s| s.player_name == "Alice")
        .collect();
    assert_eq!(alice.len(), 1);
    assert!(!alice[0].is_open());
    assert!(alice[0].duration_secs >= 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_samp_first_missed_probe_goes_offline() -> Result<()> {
    let mock = MockSampServer::start(
        SampInfo {
            players: 2,
            max_players: 50,
            hostname: "LS Roleplay".into(),
            gamemode: "Roleplay".into(),
            ..Default::default()
        },
        &["Alice", "Bob"],
    )
    .await?;
    let id = ServerId::new(5);
    let store = Arc::new(MemoryStore::new());
    let hub = StatusHub::new(64);
    let mut updates = hub.subscribe();
    let config = fast_config();

    let engine = PollEngine::new(
        config.clone(),
        Arc::new(StaticCatalog::new(vec![server(5, GameType::Samp, mock.addr())])),
        store.clone(),
        Arc::new(NetworkProber::new(config.probe_timeout())),
    )
    .with_sink(Arc::new(hub.clone()))
    .start()
    .await?;

    let online = next_update(&mut updates, |u| u.snapshot.online).await;
    assert_eq!(online.snapshot.server_name, "LS Roleplay");
    assert_eq!(online.snapshot.map, "Roleplay");
    assert!(wait_until(|| store.open_players(id).len() == 2).await);

    mock.set_responding(false);

    // The first miss flips the server; sessions are closed before it is published
    let offline = next_update(&mut updates, |u| !u.snapshot.online).await;
    assert_eq!(offline.server_id, id);
    assert_eq!(offline.snapshot.players_now, 0);
    assert!(store.open_players(id).is_empty());
    assert!(store.sessions().iter().all(|s| !s.is_open()));

    let report = engine.stop().await;
    assert_eq!(report.alerts_delivered, Some(1));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sqlite_store_receives_status_and_history() -> Result<()> {
    let mock = MockSourceServer::start(
        A2sInfo {
            name: "Dust Only".into(),
            players: 0,
            max_players: 24,
            ..Default::default()
        },
        &[],
        true,
    )
    .await?;
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("gamewatch.db");
    let store = Arc::new(SqliteStore::open(&db_path)?);
    let config = fast_config();
    let id = ServerId::new(3);

    let engine = PollEngine::new(
        config.clone(),
        Arc::new(StaticCatalog::new(vec![server(3, GameType::Source, mock.addr())])),
        store,
        Arc::new(NetworkProber::new(config.probe_timeout())),
    )
    .start()
    .await?;

    assert!(wait_until(|| mock.requests() >= 2).await);
    tokio::time::sleep(Duration::from_millis(200)).await;
    engine.stop().await;

    let db = Database::open(&db_path)?;
    let status = db.get_status(id)?.expect("status row");
    assert!(status.online);
    assert_eq!(status.players_max, 24);
    assert_eq!(status.map, "de_dust2");
    assert_eq!(db.count_statuses()?, 1);
    assert!(db.count_history(Some(id))? >= 1);
    Ok(())
}
