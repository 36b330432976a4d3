//! Prometheus metrics server

use crate::config::MetricsSettings;
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};
use std::io::Write;
use std::net::SocketAddr;

/// Counters the API handlers increment
#[derive(Clone)]
pub struct AppMetrics {
    registry: Registry,
    pub http_requests_total: IntCounter,
    pub http_errors_total: IntCounter,
    pub check_ins_total: IntCounter,
    pub day_claims_total: IntCounter,
    pub settlements_total: IntCounter,
    pub payouts_total: IntCounter,
    pub payout_lamports_total: IntCounter,
}

impl AppMetrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let http_requests_total =
            IntCounter::new("sigil_http_requests_total", "Total API requests")?;
        let http_errors_total =
            IntCounter::new("sigil_http_errors_total", "API requests answered with an error")?;
        let check_ins_total =
            IntCounter::new("sigil_check_ins_total", "Check-ins recorded")?;
        let day_claims_total =
            IntCounter::new("sigil_day_claims_total", "Billboard claims registered")?;
        let settlements_total =
            IntCounter::new("sigil_settlements_total", "Days settled")?;
        let payouts_total = IntCounter::new("sigil_payouts_total", "Reward payouts sent")?;
        let payout_lamports_total =
            IntCounter::new("sigil_payout_lamports_total", "Lamports paid out")?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_errors_total.clone()))?;
        registry.register(Box::new(check_ins_total.clone()))?;
        registry.register(Box::new(day_claims_total.clone()))?;
        registry.register(Box::new(settlements_total.clone()))?;
        registry.register(Box::new(payouts_total.clone()))?;
        registry.register(Box::new(payout_lamports_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_errors_total,
            check_ins_total,
            day_claims_total,
            settlements_total,
            payouts_total,
            payout_lamports_total,
        })
    }

    pub fn registry(&self) -> Registry {
        self.registry.clone()
    }
}

/// Metrics server
pub struct MetricsServer {
    config: MetricsSettings,
    registry: Registry,
}

impl MetricsServer {
    pub fn new(config: &MetricsSettings, metrics: &AppMetrics) -> Self {
        Self {
            config: config.clone(),
            registry: metrics.registry(),
        }
    }

    /// Run the metrics server
    pub async fn run(&self) -> anyhow::Result<()> {
        let addr: SocketAddr = self.config.address.parse()?;

        tracing::info!("Starting metrics server on {}", addr);

        let listener = std::net::TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;

        loop {
            match listener.accept() {
                Ok((mut stream, _)) => {
                    let registry = self.registry.clone();

                    tokio::task::spawn_blocking(move || {
                        let mut buf = [0u8; 1024];
                        if let Ok(n) = std::io::Read::read(&mut stream, &mut buf) {
                            let request = String::from_utf8_lossy(&buf[..n]);

                            let response = if request.contains("GET /metrics") {
                                let encoder = TextEncoder::new();
                                let metric_families = registry.gather();
                                let mut buffer = Vec::new();
                                if encoder.encode(&metric_families, &mut buffer).is_err() {
                                    buffer.clear();
                                }

                                format!(
                                    "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
                                    buffer.len(),
                                    String::from_utf8_lossy(&buffer)
                                )
                            } else if request.contains("GET /health") {
                                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{\"status\":\"healthy\"}".to_string()
                            } else {
                                "HTTP/1.1 404 Not Found\r\n\r\n".to_string()
                            };

                            let _ = stream.write_all(response.as_bytes());
                        }
                    });
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                }
                Err(e) => {
                    tracing::error!("Accept error: {}", e);
                }
            }
        }
    }
}
