//! HTTP prober classification against a local server

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use sitewatch::monitoring::{
    CheckResult, HttpProber, Prober, RetryPolicy, SiteMonitor, Status, Target,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve every connection with the same canned response head
async fn serve(response_head: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let response_head = response_head.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {response_head}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}/")
}

async fn serve_status(status_line: &str) -> String {
    serve(status_line.to_string()).await
}

fn prober() -> HttpProber {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(1))
        .no_proxy()
        .build()
        .unwrap();
    HttpProber::from_client(client)
}

#[tokio::test]
async fn test_200_is_up() {
    let url = serve_status("200 OK").await;

    let result = prober().check(&Target::new(url)).await;

    assert_eq!(result.status, Status::Up);
    assert_eq!(result.status_code, Some(200));
    assert!(result.latency_ms.is_some());
    assert!(result.error_message.is_none());
}

#[tokio::test]
async fn test_404_is_down() {
    let url = serve_status("404 Not Found").await;

    let result = prober().check(&Target::new(url)).await;

    assert_eq!(result.status, Status::Down);
    assert_eq!(result.status_code, Some(404));
}

#[tokio::test]
async fn test_500_is_down() {
    let url = serve_status("500 Internal Server Error").await;

    let result = prober().check(&Target::new(url)).await;

    assert_eq!(result.status, Status::Down);
    assert_eq!(result.status_code, Some(500));
}

#[tokio::test]
async fn test_redirect_is_followed() {
    let destination = serve_status("200 OK").await;
    let url = serve(format!("301 Moved Permanently\r\nLocation: {destination}")).await;

    let result = prober().check(&Target::new(url)).await;

    assert_eq!(result.status, Status::Up);
    assert_eq!(result.status_code, Some(200));
}

#[tokio::test]
async fn test_connection_refused_is_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = prober().check(&Target::new(format!("http://{addr}/"))).await;

    assert_eq!(result.status, Status::Error);
    assert_eq!(result.status_code, None);
    assert!(result.error_message.is_some());
}

#[tokio::test]
async fn test_silent_server_times_out_as_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let result = prober().check(&Target::new(format!("http://{addr}/"))).await;

    assert_eq!(result.status, Status::Error);
}

#[tokio::test]
async fn test_monitor_over_http() {
    let healthy = serve_status("200 OK").await;
    let broken = serve_status("503 Service Unavailable").await;
    let seen: Arc<Mutex<Vec<CheckResult>>> = Arc::default();

    let reporter = {
        let seen = seen.clone();
        move |result: &CheckResult| seen.lock().push(result.clone())
    };

    let handle = SiteMonitor::new(
        [Target::new(healthy.clone()), Target::new(broken.clone())],
        Arc::new(prober()),
        Arc::new(reporter),
        RetryPolicy::fixed(Duration::from_millis(20)),
    )
    .unwrap()
    .spawn();

    tokio::time::sleep(Duration::from_millis(300)).await;
    handle.shutdown(Duration::from_secs(5)).await.unwrap();

    let seen = seen.lock();
    let statuses_for = |url: &str| -> Vec<Status> {
        seen.iter().filter(|r| r.target.as_str() == url).map(|r| r.status).collect()
    };

    let healthy_statuses = statuses_for(&healthy);
    let broken_statuses = statuses_for(&broken);
    assert!(healthy_statuses.len() >= 2);
    assert!(broken_statuses.len() >= 2);
    assert!(healthy_statuses.iter().all(|s| *s == Status::Up));
    assert!(broken_statuses.iter().all(|s| *s == Status::Down));
}
