//! HTTP API server
//!
//! This module serves the public Sigil surface:
//! - Check-in and status endpoints for holders
//! - Reward queries and payout claims
//! - Billboard claim intake and the public calendar
//! - Bearer-guarded cron triggers for settlement and the notifier
//! - Per-IP rate limiting
//!
//! Field names in request and response bodies are part of the deployed
//! protocol and must not change.

use crate::config::ApiSettings;
use crate::metrics::AppMetrics;
use crate::notify::DayNotifier;
use serde_json::json;
use sigil_core::constants::CALENDAR_WINDOW_DAYS;
use sigil_core::{format_sol, sol_display, EpochDay, SigilError, TxSignature, WalletId};
use sigil_ledger::{DayClaim, LedgerStore};
use sigil_settlement::{
    CheckInRegistrar, DayRegistry, PayoutExecutor, RewardCalculator, SettleOutcome,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::RwLock;

const MAX_REQUEST_BYTES: usize = 64 * 1024;
const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything the request handlers reach for
pub struct AppContext {
    pub registrar: CheckInRegistrar,
    pub registry: DayRegistry,
    pub executor: PayoutExecutor,
    pub calculator: RewardCalculator,
    pub notifier: DayNotifier,
    pub store: Arc<dyn LedgerStore>,
    /// Unset leaves the cron surface open
    pub cron_secret: Option<String>,
    pub metrics: AppMetrics,
}

/// HTTP API server
pub struct ApiServer {
    config: ApiSettings,
    rate_limiter: Arc<RateLimiter>,
    ctx: Arc<AppContext>,
}

impl ApiServer {
    pub fn new(config: &ApiSettings, ctx: Arc<AppContext>) -> Self {
        Self {
            config: config.clone(),
            rate_limiter: Arc::new(RateLimiter::new(config.requests_per_second, config.burst)),
            ctx,
        }
    }

    /// Run the API server
    pub async fn run(&self) -> anyhow::Result<()> {
        let addr: SocketAddr = self.config.address.parse()?;

        tracing::info!("Starting API server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!("API server ready");

        loop {
            let (stream, peer_addr) = listener.accept().await?;

            let ctx = self.ctx.clone();
            let rate_limiter = self.rate_limiter.clone();
            let cors = self.config.cors_enabled;

            tokio::spawn(async move {
                let mut stream = stream;
                let peer_ip = peer_addr.ip().to_string();

                if !rate_limiter.check(&peer_ip).await {
                    ctx.metrics.http_errors_total.inc();
                    let reply = http_response(429, &json!({"error": "Too many requests"}), cors);
                    let _ = stream.write_all(reply.as_bytes()).await;
                    return;
                }

                if let Err(e) = handle_connection(stream, ctx, cors).await {
                    tracing::error!("Connection error from {}: {}", peer_addr, e);
                }
            });
        }
    }
}

/// Rate limiter with fixed one-second windows per client IP
pub struct RateLimiter {
    requests_per_second: u32,
    burst: u32,
    request_counts: RwLock<HashMap<String, RequestCounter>>,
}

#[derive(Clone, Default)]
struct RequestCounter {
    count: u32,
    window_start: i64,
}

impl RateLimiter {
    fn new(requests_per_second: u32, burst: u32) -> Self {
        Self {
            requests_per_second,
            burst,
            request_counts: RwLock::new(HashMap::new()),
        }
    }

    /// Check if a request from this IP is allowed
    async fn check(&self, ip: &str) -> bool {
        let now = chrono::Utc::now().timestamp();
        let mut counts = self.request_counts.write().await;

        let counter = counts.entry(ip.to_string()).or_default();

        // Reset window if expired
        if now - counter.window_start >= 1 {
            counter.count = 0;
            counter.window_start = now;
        }

        if counter.count >= self.requests_per_second + self.burst {
            return false;
        }

        counter.count += 1;
        true
    }
}

/// Handle a single connection
async fn handle_connection(
    mut stream: tokio::net::TcpStream,
    ctx: Arc<AppContext>,
    cors: bool,
) -> anyhow::Result<()> {
    let text = match tokio::time::timeout(READ_TIMEOUT, read_request(&mut stream)).await {
        Ok(result) => result?,
        Err(_) => return Ok(()),
    };
    if text.is_empty() {
        return Ok(());
    }

    let response = match Request::parse(&text) {
        None => http_response(400, &json!({"error": "Malformed request"}), cors),
        Some(request) if request.method == "OPTIONS" => {
            format!("HTTP/1.1 204 No Content\r\n{}\r\n", cors_headers(cors))
        }
        Some(request) => {
            let (status, body) = route(&ctx, &request).await;
            http_response(status, &body, cors)
        }
    };

    stream.write_all(response.as_bytes()).await?;
    Ok(())
}

/// Read one request, waiting until the Content-Length body is complete
async fn read_request(stream: &mut tokio::net::TcpStream) -> anyhow::Result<String> {
    let mut buf = Vec::with_capacity(8192);
    let mut chunk = [0u8; 8192];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        anyhow::ensure!(buf.len() <= MAX_REQUEST_BYTES, "request too large");

        if let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..header_end]);
            let content_length = head
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// A parsed HTTP/1.1 request
#[derive(Debug)]
struct Request {
    method: String,
    path: String,
    query: HashMap<String, String>,
    /// Header names lowercased
    headers: HashMap<String, String>,
    body: String,
}

impl Request {
    fn parse(text: &str) -> Option<Self> {
        let (head, body) = match text.split_once("\r\n\r\n") {
            Some((head, body)) => (head, body),
            None => (text, ""),
        };
        let mut lines = head.lines();

        let mut parts = lines.next()?.split_whitespace();
        let method = parts.next()?.to_string();
        let target = parts.next()?;

        let (path, query_str) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };
        let query: HashMap<String, String> = query_str
            .split('&')
            .filter_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                (!name.is_empty()).then(|| (name.to_string(), value.to_string()))
            })
            .collect();

        let headers: HashMap<String, String> = lines
            .filter_map(|line| {
                let (name, value) = line.split_once(':')?;
                Some((name.trim().to_ascii_lowercase(), value.trim().to_string()))
            })
            .collect();

        // Trailing bytes past Content-Length are not part of the body
        let body = match headers.get("content-length").and_then(|v| v.parse::<usize>().ok()) {
            Some(len) if len < body.len() => body.get(..len).unwrap_or(body).to_string(),
            _ => body.to_string(),
        };

        Some(Self {
            method,
            path: path.to_string(),
            query,
            headers,
            body,
        })
    }
}

async fn route(ctx: &AppContext, req: &Request) -> (u16, serde_json::Value) {
    ctx.metrics.http_requests_total.inc();

    let reply = match (req.method.as_str(), req.path.as_str()) {
        ("POST", "/check-in") => check_in(ctx, req).await,
        ("GET", "/check-in/status") => check_in_status(ctx, req).await,
        ("GET", "/rewards") => rewards(ctx, req).await,
        ("POST", "/rewards/claim") => claim_rewards(ctx, req).await,
        ("POST", "/claim") => register_day_claim(ctx, req).await,
        ("GET", "/calendar") => calendar(ctx).await,
        // Hosted schedulers fire GET; operators curl POST
        ("GET", "/cron/settle-day") | ("POST", "/cron/settle-day") => settle_day(ctx, req).await,
        ("POST", "/cron/notify") => notify(ctx, req).await,
        ("GET", "/health") => (200, json!({"status": "healthy"})),
        _ => (404, json!({"error": "Not found"})),
    };

    if reply.0 >= 400 {
        ctx.metrics.http_errors_total.inc();
    }
    reply
}

async fn check_in(ctx: &AppContext, req: &Request) -> (u16, serde_json::Value) {
    let Some((wallet, message, signature)) = signed_fields(&req.body) else {
        return (400, json!({"error": "Missing required fields"}));
    };
    match ctx.registrar.check_in(&wallet, &message, &signature).await {
        Ok(receipt) => {
            ctx.metrics.check_ins_total.inc();
            (
                200,
                json!({
                    "success": true,
                    "position": receipt.position,
                    "totalCheckedIn": receipt.position,
                    "weight": receipt.weight,
                    "bonusEarned": receipt.bonus,
                }),
            )
        }
        Err(err) => error_reply(&err),
    }
}

async fn check_in_status(ctx: &AppContext, req: &Request) -> (u16, serde_json::Value) {
    let Some(wallet) = req.query.get("wallet").filter(|w| !w.is_empty()) else {
        return (200, json!({"checkedIn": false, "totalCheckedIn": 0}));
    };
    let day = req
        .query
        .get("epochDay")
        .and_then(|d| d.parse::<u64>().ok())
        .map(EpochDay::new)
        .unwrap_or_else(EpochDay::today);

    match ctx.registrar.status(&WalletId::new(wallet.as_str()), day).await {
        Ok(status) => {
            let mut reply = json!({
                "checkedIn": status.checked_in,
                "totalCheckedIn": status.total_checked_in,
            });
            // weight is present only for wallets that did check in
            if let Some(weight) = status.weight {
                reply["weight"] = json!(weight);
            }
            (200, reply)
        }
        Err(err) => error_reply(&err),
    }
}

async fn rewards(ctx: &AppContext, req: &Request) -> (u16, serde_json::Value) {
    let Some(wallet) = req.query.get("wallet").filter(|w| !w.is_empty()) else {
        return (400, json!({"error": "Missing wallet parameter"}));
    };

    let position = match ctx
        .calculator
        .pending_rewards(&WalletId::new(wallet.as_str()))
        .await
    {
        Ok(position) => position,
        Err(err) => return error_reply(&err),
    };
    if position.days.is_empty() {
        return (
            200,
            json!({"pendingLamports": 0, "pendingSol": 0, "dayBreakdown": []}),
        );
    }

    let breakdown: Vec<serde_json::Value> = position
        .days
        .iter()
        .map(|d| {
            json!({
                "epochDay": d.day.index(),
                "weight": d.weight,
                "totalWeight": d.total_weight,
                "incentiveLamports": d.incentive_lamports,
                "earnedLamports": d.earned_lamports,
                "paidLamports": d.paid_lamports,
                "pendingLamports": d.pending_lamports,
            })
        })
        .collect();

    (
        200,
        json!({
            "pendingLamports": position.total_pending_lamports,
            "pendingSol": sol_display(position.total_pending_lamports),
            "daysCheckedIn": position.days_checked_in,
            "bonusDays": position.bonus_days,
            "dayBreakdown": breakdown,
        }),
    )
}

async fn claim_rewards(ctx: &AppContext, req: &Request) -> (u16, serde_json::Value) {
    let Some((wallet, message, signature)) = signed_fields(&req.body) else {
        return (400, json!({"error": "Missing required fields"}));
    };
    match ctx.executor.claim(&wallet, &message, &signature).await {
        Ok(outcome) => {
            ctx.metrics.payouts_total.inc();
            ctx.metrics.payout_lamports_total.inc_by(outcome.total_lamports);
            (
                200,
                json!({
                    "success": true,
                    "totalLamports": outcome.total_lamports,
                    "totalSol": sol_display(outcome.total_lamports),
                    "txSignature": outcome.tx_signature.as_str(),
                    "daysSettled": outcome.days_settled,
                }),
            )
        }
        Err(err) => error_reply(&err),
    }
}

async fn register_day_claim(ctx: &AppContext, req: &Request) -> (u16, serde_json::Value) {
    let body: serde_json::Value = match serde_json::from_str(&req.body) {
        Ok(v) => v,
        Err(_) => return (400, json!({"error": "Missing required fields"})),
    };
    let tx = body.get("txSignature").and_then(|v| v.as_str()).unwrap_or("");
    let day = match body.get("epochDay").and_then(|v| v.as_u64()) {
        Some(day) if !tx.is_empty() => day,
        _ => return (400, json!({"error": "Missing required fields"})),
    };
    let incentive = body
        .get("incentiveLamports")
        .and_then(|v| v.as_u64())
        .unwrap_or(0);

    match ctx
        .registry
        .register_claim(&TxSignature::new(tx), EpochDay::new(day), incentive)
        .await
    {
        Ok(claim) => {
            ctx.metrics.day_claims_total.inc();
            (
                200,
                json!({
                    "success": true,
                    "epochDay": claim.day.index(),
                    "claimerWallet": claim.claimer.as_str(),
                }),
            )
        }
        Err(err) => error_reply(&err),
    }
}

async fn calendar(ctx: &AppContext) -> (u16, serde_json::Value) {
    let today = EpochDay::today();
    let window_end = EpochDay::new(today.index() + CALENDAR_WINDOW_DAYS);

    let claims = match ctx.store.list_claims_in_range(today, window_end).await {
        Ok(claims) => claims,
        Err(err) => return error_reply(&err),
    };
    let by_day: HashMap<EpochDay, &DayClaim> = claims.iter().map(|c| (c.day, c)).collect();

    let mut days = Vec::with_capacity(CALENDAR_WINDOW_DAYS as usize + 1);
    for index in today.index()..=window_end.index() {
        let day = EpochDay::new(index);
        let claim = by_day.get(&day);
        let (date, label) = match day.date() {
            Some(date) => (
                json!(date.to_string()),
                json!(date.format("%b %-d").to_string()),
            ),
            None => (serde_json::Value::Null, serde_json::Value::Null),
        };
        days.push(json!({
            "epochDay": index,
            "date": date,
            "label": label,
            "isToday": day == today,
            "claimed": claim.is_some(),
            "incentiveSol": claim.map(|c| format_sol(c.incentive_lamports)),
            "wallet": claim.map(|c| c.claimer.as_str()),
        }));
    }

    (
        200,
        json!({
            "days": days,
            "today": today.index(),
            "totalClaims": claims.len(),
        }),
    )
}

async fn settle_day(ctx: &AppContext, req: &Request) -> (u16, serde_json::Value) {
    if !cron_authorized(ctx, req) {
        return (401, json!({"error": "Unauthorized"}));
    }
    match ctx.registry.settle_yesterday().await {
        Ok(SettleOutcome::Settled {
            day,
            total_weight,
            incentive_lamports,
        }) => {
            ctx.metrics.settlements_total.inc();
            (
                200,
                json!({
                    "settled": true,
                    "epochDay": day.index(),
                    "totalWeight": total_weight,
                    "incentiveLamports": incentive_lamports,
                }),
            )
        }
        Ok(SettleOutcome::NoClaim { .. }) => (
            200,
            json!({"message": "No claim for yesterday", "settled": false}),
        ),
        Ok(SettleOutcome::AlreadySettled { .. }) => {
            (200, json!({"message": "Already settled", "settled": false}))
        }
        Ok(SettleOutcome::NoCheckIns { .. }) => (
            200,
            json!({"message": "No check-ins for yesterday", "settled": false}),
        ),
        Err(err) => error_reply(&err),
    }
}

async fn notify(ctx: &AppContext, req: &Request) -> (u16, serde_json::Value) {
    if !cron_authorized(ctx, req) {
        return (401, json!({"error": "Unauthorized"}));
    }
    match ctx.notifier.notify_day_flip().await {
        Ok(summary) => (
            200,
            json!({
                "ok": true,
                "posted": summary.posted,
                "today": summary.today.index(),
                "yesterday": summary.yesterday.index(),
            }),
        ),
        Err(err) => error_reply(&err),
    }
}

fn cron_authorized(ctx: &AppContext, req: &Request) -> bool {
    match &ctx.cron_secret {
        None => true,
        Some(secret) => req
            .headers
            .get("authorization")
            .is_some_and(|value| value == &format!("Bearer {secret}")),
    }
}

/// The three fields every signed POST carries
fn signed_fields(body: &str) -> Option<(WalletId, String, String)> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    let wallet = v.get("wallet")?.as_str()?;
    let message = v.get("message")?.as_str()?;
    let signature = v.get("signature")?.as_str()?;
    if wallet.is_empty() || message.is_empty() || signature.is_empty() {
        return None;
    }
    Some((
        WalletId::new(wallet),
        message.to_string(),
        signature.to_string(),
    ))
}

/// Map a pipeline error onto the status and public message the API serves
fn error_reply(err: &SigilError) -> (u16, serde_json::Value) {
    let status = match err {
        SigilError::InvalidAuth(_)
        | SigilError::InvalidSignature
        | SigilError::NothingPending
        | SigilError::InvalidInput(_) => 400,
        SigilError::InvalidEligibility => 403,
        SigilError::AlreadyCheckedIn { .. } => 409,
        SigilError::TransferFailed(_)
        | SigilError::ConfirmationTimeout { .. }
        | SigilError::Chain(_) => 502,
        SigilError::Storage(_) => 500,
    };
    let message = match err {
        SigilError::AlreadyCheckedIn { .. } => "Already checked in today".to_string(),
        SigilError::ConfirmationTimeout { .. } => "Transaction confirmation timeout".to_string(),
        SigilError::Storage(_) => {
            tracing::error!(%err, "storage failure surfaced to the API");
            "Internal server error".to_string()
        }
        other => other.to_string(),
    };
    (status, json!({"error": message}))
}

fn cors_headers(enabled: bool) -> &'static str {
    if enabled {
        "Access-Control-Allow-Origin: *\r\n\
         Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
         Access-Control-Allow-Headers: Content-Type, Authorization\r\n"
    } else {
        ""
    }
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        429 => "Too Many Requests",
        502 => "Bad Gateway",
        _ => "Internal Server Error",
    }
}

fn http_response(status: u16, body: &serde_json::Value, cors: bool) -> String {
    let body = body.to_string();
    format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: application/json\r\n\
         {}Content-Length: {}\r\n\r\n{}",
        status,
        status_text(status),
        cors_headers(cors),
        body.len(),
        body
    )
}
