//! End-to-end tests over a real Unix socket.
//!
//! Each test binds an `IpcServer` in its own temp directory, serves rates from
//! the static development table and talks to it through `converter-client`.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use converter_client::{ClientError, ConverterClient};
use converter_hex::{ConverterService, RateStore, inbound::IpcServer};
use converter_types::{CurrencyCode, IpcEndpoint, RateProvider, RateSnapshot};
use exchange_rates::StaticRateProvider;

struct TestServer {
    endpoint: IpcEndpoint,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<anyhow::Result<()>>,
    _dir: TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let provider = StaticRateProvider::default();
        let usd: CurrencyCode = "USD".parse().unwrap();
        let data = provider.fetch(&usd).await.unwrap();
        let snapshot = RateSnapshot::from_rate_data(data, Utc::now()).unwrap();
        let service = ConverterService::new(Arc::new(RateStore::new(snapshot)));

        let dir = tempfile::tempdir().unwrap();
        let endpoint = IpcEndpoint::from_path(dir.path().join("converter.sock"));
        let server = IpcServer::bind(service, &endpoint).unwrap();

        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(server.run_until(async {
            let _ = stopped.await;
        }));

        Self {
            endpoint,
            stop: Some(stop),
            task,
            _dir: dir,
        }
    }

    async fn client(&self) -> ConverterClient {
        ConverterClient::connect(&self.endpoint).await.unwrap()
    }

    async fn shutdown(self) {
        if let Some(stop) = self.stop {
            let _ = stop.send(());
        }
        self.task.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_convert_over_socket() {
    let server = TestServer::start().await;
    let client = server.client().await;

    let reply = client.convert_currency("USD", "EUR", 100.0).await.unwrap();
    assert_eq!(reply.source_currency.as_str(), "USD");
    assert_eq!(reply.target_currency.as_str(), "EUR");
    assert_eq!(reply.amount, 100.0);
    assert!((reply.converted_amount - 92.60101824).abs() < 1e-9);

    server.shutdown().await;
}

#[tokio::test]
async fn test_invalid_currency_is_error_reply() {
    let server = TestServer::start().await;
    let client = server.client().await;

    let value = client
        .send_raw(
            r#"{"action": "convert_currency", "data": {"source_currency": "USD", "target_currency": "XXX", "amount": 100.0}}"#,
        )
        .await
        .unwrap();
    assert_eq!(value, json!({"error": "Invalid currency code"}));

    let err = client.convert_currency("XXX", "EUR", 1.0).await.unwrap_err();
    assert!(matches!(err, ClientError::Service(ref m) if m == "Invalid currency code"));

    server.shutdown().await;
}

#[tokio::test]
async fn test_connection_survives_bad_requests() {
    let server = TestServer::start().await;
    let client = server.client().await;

    let value = client.send_raw("this is not json").await.unwrap();
    assert!(value["error"].as_str().unwrap().starts_with("Malformed request"));

    let value = client.send_raw(r#"{"action": "delete_everything"}"#).await.unwrap();
    assert_eq!(value, json!({"error": "Unknown action"}));

    let value = client
        .send_raw(
            r#"{"action": "convert_currency", "data": {"source_currency": "USD", "target_currency": "EUR", "amount": -1}}"#,
        )
        .await
        .unwrap();
    assert_eq!(value, json!({"error": "Amount must be a non-negative number"}));

    // Same connection still answers normally.
    let names = client.get_supported_currencies().await.unwrap();
    assert_eq!(names["USD"], "United States Dollar");

    server.shutdown().await;
}

#[tokio::test]
async fn test_rates_and_currencies_agree() {
    let server = TestServer::start().await;
    let client = server.client().await;

    let names = client.get_supported_currencies().await.unwrap();
    let rates = client.get_exchange_rates(None).await.unwrap();
    assert_eq!(rates["USD"], 1.0);
    assert!(names.keys().eq(rates.keys()));

    let eur = client.get_exchange_rates(Some("eur")).await.unwrap();
    assert_eq!(eur["EUR"], 1.0);
    assert!((eur["USD"] - 1.0 / 0.9260101824).abs() < 1e-9);

    server.shutdown().await;
}

#[tokio::test]
async fn test_replies_follow_request_order() {
    let server = TestServer::start().await;
    let client = server.client().await;

    // Several requests in one write; one reply line each, in order.
    let value = client
        .send_raw(concat!(
            r#"{"action": "get_exchange_rates", "data": {"currency_code": "GBP"}}"#,
            "\n\n",
            r#"{"action": "get_supported_currencies"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(value["GBP"], 1.0);

    let value: Value = client.send_raw("").await.unwrap();
    assert_eq!(value["EUR"], "Euro");

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_clients() {
    let server = TestServer::start().await;

    let mut tasks = Vec::new();
    for i in 0..16 {
        let endpoint = server.endpoint.clone();
        tasks.push(tokio::spawn(async move {
            let client = ConverterClient::connect(&endpoint).await.unwrap();
            for _ in 0..10 {
                let amount = f64::from(i) * 10.0;
                let reply = client.convert_currency("EUR", "JPY", amount).await.unwrap();
                let expected = amount * 149.62 / 0.9260101824;
                assert!((reply.converted_amount - expected).abs() < 1e-6);
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    server.shutdown().await;
}

#[tokio::test]
async fn test_bind_refuses_live_socket_and_cleans_up() {
    let server = TestServer::start().await;

    let store = Arc::new(RateStore::new(
        RateSnapshot::from_rate_data(
            StaticRateProvider::default()
                .fetch(&"USD".parse().unwrap())
                .await
                .unwrap(),
            Utc::now(),
        )
        .unwrap(),
    ));
    let second = IpcServer::bind(ConverterService::new(store), &server.endpoint);
    assert!(second.is_err());

    let path = server.endpoint.path().to_path_buf();
    server.shutdown().await;
    assert!(!path.exists());
}

fn usd_service() -> ConverterService {
    let snapshot = RateSnapshot::new(
        "USD".parse().unwrap(),
        [("EUR".parse().unwrap(), 0.9260101824)].into(),
        [
            ("USD".parse().unwrap(), "United States Dollar".to_string()),
            ("EUR".parse().unwrap(), "Euro".to_string()),
        ]
        .into(),
        Utc::now(),
    )
    .unwrap();
    ConverterService::new(Arc::new(RateStore::new(snapshot)))
}

#[tokio::test]
async fn test_bind_leaves_regular_file_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "keep me").unwrap();

    let err = IpcServer::bind(usd_service(), &IpcEndpoint::from_path(&path))
        .err()
        .unwrap();
    assert!(err.to_string().contains("not a socket"), "{err}");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me");
}

#[tokio::test]
async fn test_bind_replaces_stale_socket() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("converter.sock");

    // A socket file nobody is accepting on any more.
    drop(std::os::unix::net::UnixListener::bind(&path).unwrap());
    assert!(path.exists());

    let server = IpcServer::bind(usd_service(), &IpcEndpoint::from_path(&path)).unwrap();
    assert_eq!(server.local_path(), path.as_path());
}
