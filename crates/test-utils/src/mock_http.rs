//! In-memory HTTP backend for catalog and tile requests.
//!
//! Routes are matched exactly first, then by longest prefix. Unmatched URLs
//! get the fallback status (404 unless changed).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use radar_source::{FetchError, HttpFetch, HttpResponse};

#[derive(Debug, Clone)]
enum Reply {
    Response { status: u16, body: Bytes },
    Fail(FetchError),
}

#[derive(Debug, Clone)]
struct Route {
    reply: Reply,
    delay: Option<Duration>,
}

#[derive(Default)]
struct Routes {
    exact: HashMap<String, Route>,
    prefix: Vec<(String, Route)>,
}

impl Routes {
    fn lookup(&self, url: &str) -> Option<Route> {
        if let Some(route) = self.exact.get(url) {
            return Some(route.clone());
        }
        self.prefix
            .iter()
            .filter(|(p, _)| url.starts_with(p.as_str()))
            .max_by_key(|(p, _)| p.len())
            .map(|(_, r)| r.clone())
    }
}

/// Scriptable [`HttpFetch`] that records every request.
pub struct MockHttp {
    routes: Mutex<Routes>,
    fallback_status: Mutex<u16>,
    requested: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl Default for MockHttp {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHttp {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(Routes::default()),
            fallback_status: Mutex::new(404),
            requested: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    fn insert_exact(&self, url: impl Into<String>, route: Route) {
        self.routes.lock().unwrap().exact.insert(url.into(), route);
    }

    fn insert_prefix(&self, prefix: impl Into<String>, route: Route) {
        self.routes.lock().unwrap().prefix.push((prefix.into(), route));
    }

    /// Serve `body` with status 200 for exactly `url`.
    pub fn serve(&self, url: impl Into<String>, body: impl Into<Bytes>) -> &Self {
        self.serve_status(url, 200, body)
    }

    pub fn serve_status(&self, url: impl Into<String>, status: u16, body: impl Into<Bytes>) -> &Self {
        self.insert_exact(
            url,
            Route {
                reply: Reply::Response {
                    status,
                    body: body.into(),
                },
                delay: None,
            },
        );
        self
    }

    /// Serve `body` with status 200 for every URL starting with `prefix`.
    pub fn serve_prefix(&self, prefix: impl Into<String>, body: impl Into<Bytes>) -> &Self {
        self.insert_prefix(
            prefix,
            Route {
                reply: Reply::Response {
                    status: 200,
                    body: body.into(),
                },
                delay: None,
            },
        );
        self
    }

    /// Serve `body` for `url` only after sleeping for `delay`.
    pub fn serve_delayed(&self, url: impl Into<String>, body: impl Into<Bytes>, delay: Duration) -> &Self {
        self.insert_exact(
            url,
            Route {
                reply: Reply::Response {
                    status: 200,
                    body: body.into(),
                },
                delay: Some(delay),
            },
        );
        self
    }

    /// Answer every URL starting with `prefix` after `delay`.
    pub fn serve_prefix_delayed(&self, prefix: impl Into<String>, body: impl Into<Bytes>, delay: Duration) -> &Self {
        self.insert_prefix(
            prefix,
            Route {
                reply: Reply::Response {
                    status: 200,
                    body: body.into(),
                },
                delay: Some(delay),
            },
        );
        self
    }

    /// Fail requests for `url` with a transport error.
    pub fn fail(&self, url: impl Into<String>, error: FetchError) -> &Self {
        self.insert_exact(
            url,
            Route {
                reply: Reply::Fail(error),
                delay: None,
            },
        );
        self
    }

    /// Status returned for URLs no route matches.
    pub fn set_fallback_status(&self, status: u16) -> &Self {
        *self.fallback_status.lock().unwrap() = status;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// URLs requested so far, in arrival order.
    pub fn requested_urls(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    /// Number of requests whose URL starts with `prefix`.
    pub fn requests_with_prefix(&self, prefix: &str) -> usize {
        self.requested
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl HttpFetch for MockHttp {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(url.to_string());

        let route = self.routes.lock().unwrap().lookup(url);
        let Some(route) = route else {
            let status = *self.fallback_status.lock().unwrap();
            return Ok(HttpResponse {
                status,
                body: Bytes::new(),
            });
        };

        if let Some(delay) = route.delay {
            if delay >= timeout {
                tokio::time::sleep(timeout).await;
                return Err(FetchError::Timeout);
            }
            tokio::time::sleep(delay).await;
        }

        match route.reply {
            Reply::Response { status, body } => Ok(HttpResponse { status, body }),
            Reply::Fail(e) => Err(e),
        }
    }
}
