//! End-to-end: config load, application start, a few cycles against
//! `MockBroker`, then a clean stop.

use helion_bot::{Application, EngineConfig};
use helion_broker::mock::MockBroker;
use helion_core::{Price, Symbol};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn config(dir: &TempDir) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.symbols_to_trade = vec![Symbol::new("BTC/USDT"), Symbol::new("ETH/USDT")];
    config.paths.registry = dir.path().join("registry.json");
    config.paths.logs_dir = dir.path().join("logs");
    config
}

#[tokio::test]
async fn orchestrator_starts_all_configured_symbols_and_stops_cleanly() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let broker = Arc::new(MockBroker::new(Price::new(dec!(100))));

    let app = Application::new(broker, &config).await.unwrap();
    app.start().await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    let status = app.status();
    assert_eq!(status.total, 2);
    assert_eq!(status.running, 2);

    app.stop().await.unwrap();
    assert_eq!(app.status().total, 0);
}

#[tokio::test]
async fn restarting_an_engine_leaves_it_running_and_registry_updated() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let broker = Arc::new(MockBroker::new(Price::new(dec!(100))));

    let app = Application::new(broker, &config).await.unwrap();
    app.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    let symbol = Symbol::new("BTC/USDT");
    app.manager()
        .restart_engine(&symbol, Duration::from_secs(1))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(30)).await;
    let health = app.manager().get_status_one(&symbol).await.unwrap();
    assert_eq!(health.state, helion_core::EngineState::Running);

    app.stop().await.unwrap();
}
