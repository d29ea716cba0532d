//! Probe-driven eviction and recovery, observed through the proxy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use load_balancer::config::ProxyConfig;

mod common;

async fn body_counts(
    client: &reqwest::Client,
    proxy: std::net::SocketAddr,
    requests: usize,
) -> (usize, usize) {
    let mut b1 = 0;
    let mut b2 = 0;
    for _ in 0..requests {
        if let Ok(res) = client.get(format!("http://{proxy}")).send().await {
            match res.text().await.unwrap_or_default().as_str() {
                "b1" => b1 += 1,
                "b2" => b2 += 1,
                _ => {}
            }
        }
    }
    (b1, b2)
}

#[tokio::test]
async fn probe_evicts_and_recovers_peer() {
    let b1_addr = common::start_mock_backend("b1").await;

    let b2_up = Arc::new(AtomicBool::new(true));
    let b2_flag = b2_up.clone();
    let b2_addr = common::start_programmable_backend(move || {
        let up = b2_flag.load(Ordering::SeqCst);
        async move {
            if up {
                (200, "b2".to_string())
            } else {
                (500, "dead".to_string())
            }
        }
    })
    .await;

    let mut config = ProxyConfig::default();
    config.health_check.enabled = true;
    config.health_check.interval_secs = 1;
    config.health_check.timeout_secs = 1;
    let (proxy_addr, shutdown) = common::start_proxy(config, &[b1_addr, b2_addr]).await;

    // Let the startup probe pass complete.
    tokio::time::sleep(Duration::from_millis(1500)).await;

    let client = common::test_client();

    let (b1_hits, b2_hits) = body_counts(&client, proxy_addr, 10).await;
    assert!(b1_hits > 0, "b1 should receive traffic (got {b1_hits})");
    assert!(b2_hits > 0, "b2 should receive traffic (got {b2_hits})");

    // b2 starts failing its probes; the flag latches dead on the next pass.
    b2_up.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(2500)).await;

    let (b1_hits, b2_hits) = body_counts(&client, proxy_addr, 10).await;
    assert_eq!(b1_hits, 10, "only b1 should be selected after eviction");
    assert_eq!(b2_hits, 0, "b2 should be skipped while dead");

    // Recovery: a succeeding probe brings b2 back into rotation.
    b2_up.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(2500)).await;

    let (b1_hits, b2_hits) = body_counts(&client, proxy_addr, 10).await;
    assert!(b2_hits > 0, "b2 should rejoin rotation after recovery");
    assert_eq!(b1_hits + b2_hits, 10, "all requests served by the pair");

    shutdown.trigger();
}

#[tokio::test]
async fn startup_probe_marks_unreachable_peer_dead() {
    let live_addr = common::start_mock_backend("b1").await;

    // Reserve a port, then free it: connections to it are refused.
    let dead_addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let mut config = ProxyConfig::default();
    config.health_check.enabled = true;
    config.health_check.interval_secs = 1;
    config.health_check.timeout_secs = 1;
    let (proxy_addr, shutdown) = common::start_proxy(config, &[live_addr, dead_addr]).await;

    tokio::time::sleep(Duration::from_millis(1500)).await;

    let client = common::test_client();
    for _ in 0..6 {
        let res = client
            .get(format!("http://{proxy_addr}"))
            .send()
            .await
            .expect("proxy unreachable");
        assert_eq!(res.status(), 200);
        assert_eq!(res.text().await.unwrap(), "b1");
    }

    shutdown.trigger();
}
