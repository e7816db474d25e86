//! Response caching middleware
//!
//! On a hit the stored snapshot is replayed and the chain
//! short-circuits. On a miss the middleware subscribes to the response's
//! status and header taps and pushes a passthrough body transform; when
//! the body finishes, the assembled snapshot lands in a shared TTL cache.
//!
//! Register after any encoding middleware so the snapshot sees the bytes
//! before they are transformed.

use crate::error::Result;
use crate::matcher::PathMatch;
use crate::request::{Method, Request};
use crate::response::Response;
use crate::router::{Handler, HandlerFuture};
use crate::transform::BodyTransform;
use crate::util::{Scheduler, TtlCache};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Headers the snapshot never records: per-connection and framing
/// headers, plus anything this middleware emits itself.
const EXCLUDED_HEADERS: &[&str] = &[
    "date",
    "server",
    "connection",
    "transfer-encoding",
    "content-length",
    "content-encoding",
    "x-cache",
];

/// A replayable response snapshot
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

#[derive(Default)]
struct Snapshot {
    status: Option<u16>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

/// Cache middleware over a shared TTL store
pub struct Cache {
    store: TtlCache<String, CachedResponse>,
    ttl: Duration,
}

impl Cache {
    pub fn new(scheduler: Scheduler, ttl: Duration) -> Self {
        Self {
            store: TtlCache::new(scheduler),
            ttl,
        }
    }

    /// The shared store, for invalidation from application code
    pub fn store(&self) -> &TtlCache<String, CachedResponse> {
        &self.store
    }

    fn key(req: &Request) -> String {
        format!("{}:{}", req.method, req.target)
    }

    async fn replay(res: &mut Response, entry: &CachedResponse) -> Result<()> {
        res.set_body_size(entry.body.len() as u64)?;
        res.write_status(entry.status, None).await?;
        for (name, value) in &entry.headers {
            res.write_header(name, value.clone()).await?;
        }
        res.write_header("X-Cache", "HIT").await?;
        res.write_body(&entry.body).await?;
        res.end().await
    }
}

impl Handler for Cache {
    fn call<'a>(
        &'a self,
        _matched: &'a PathMatch,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            // Only GET responses are worth replaying; HEAD shares the GET
            // entry through body suppression.
            if req.method != Method::Get && req.method != Method::Head {
                return Ok(true);
            }

            let key = Cache::key(req);
            if let Some(entry) = self.store.get(&key) {
                Cache::replay(res, &entry).await?;
                return Ok(false);
            }

            let snapshot = Arc::new(Mutex::new(Snapshot::default()));

            let snap = snapshot.clone();
            res.on_status(move |code| {
                snap.lock().status = Some(code);
            });
            let snap = snapshot.clone();
            res.on_header(move |name, value| {
                if !EXCLUDED_HEADERS.iter().any(|h| name.eq_ignore_ascii_case(h)) {
                    snap.lock().headers.push((name.to_string(), value.to_string()));
                }
            });
            res.push_body_transform(Box::new(SnapshotTransform {
                snapshot,
                store: self.store.clone(),
                key,
                ttl: self.ttl,
            }))?;

            Ok(true)
        })
    }
}

/// Passthrough transform that stores the snapshot once the body is done
struct SnapshotTransform {
    snapshot: Arc<Mutex<Snapshot>>,
    store: TtlCache<String, CachedResponse>,
    key: String,
    ttl: Duration,
}

impl BodyTransform for SnapshotTransform {
    fn transform(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        self.snapshot.lock().body.extend_from_slice(chunk);
        Ok(chunk.to_vec())
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        let snapshot = self.snapshot.lock();
        if let Some(status) = snapshot.status {
            // Only successful responses are replayable.
            if (200..300).contains(&status) {
                self.store.put(
                    self.key.clone(),
                    CachedResponse {
                        status,
                        headers: snapshot.headers.clone(),
                        body: snapshot.body.clone(),
                    },
                    Instant::now() + self.ttl,
                );
            }
        }
        Ok(Vec::new())
    }
}
