//! In-memory doubles for [`TokenStore`] and [`OAuthClient`], plus a one-shot
//! HTTP responder.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::BoxFuture;
use crate::error::{AuthError, AuthResult};
use crate::oauth::OAuthClient;
use crate::record::TokenRecord;
use crate::store::TokenStore;

/// Keeps the record in memory and counts saves.
#[derive(Default)]
pub struct MemoryStore {
    record: Mutex<Option<TokenRecord>>,
    saves: AtomicUsize,
    reject_saves: AtomicBool,
}

impl MemoryStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(record: TokenRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
            ..Self::default()
        }
    }

    /// Every save reports `false` and leaves the stored record untouched.
    pub fn rejecting_saves(self) -> Self {
        self.reject_saves.store(true, Ordering::SeqCst);
        self
    }

    pub fn save_calls(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl TokenStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn save<'a>(&'a self, record: &'a TokenRecord) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            self.saves.fetch_add(1, Ordering::SeqCst);
            if self.reject_saves.load(Ordering::SeqCst) {
                return false;
            }
            *self.record.lock().unwrap() = Some(record.clone());
            true
        })
    }

    fn load(&self) -> BoxFuture<'_, Option<TokenRecord>> {
        Box::pin(async move { self.record.lock().unwrap().clone() })
    }
}

type ErrorFactory = Box<dyn Fn() -> AuthError + Send + Sync>;

/// Answers every exchange and refresh with the same scripted outcome.
pub struct ScriptedOAuth {
    record: Option<TokenRecord>,
    error: Option<ErrorFactory>,
    refreshes: AtomicUsize,
    exchanges: AtomicUsize,
    last_refresh_token: Mutex<Option<String>>,
    last_code: Mutex<Option<String>>,
}

impl ScriptedOAuth {
    pub fn returning(record: TokenRecord) -> Self {
        Self::build(Some(record), None)
    }

    pub fn failing(error: impl Fn() -> AuthError + Send + Sync + 'static) -> Self {
        Self::build(None, Some(Box::new(error)))
    }

    fn build(record: Option<TokenRecord>, error: Option<ErrorFactory>) -> Self {
        Self {
            record,
            error,
            refreshes: AtomicUsize::new(0),
            exchanges: AtomicUsize::new(0),
            last_refresh_token: Mutex::new(None),
            last_code: Mutex::new(None),
        }
    }

    pub fn refresh_calls(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn exchange_calls(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }

    pub fn last_refresh_token(&self) -> Option<String> {
        self.last_refresh_token.lock().unwrap().clone()
    }

    pub fn last_code(&self) -> Option<String> {
        self.last_code.lock().unwrap().clone()
    }

    fn outcome(&self) -> AuthResult<TokenRecord> {
        match (&self.record, &self.error) {
            (_, Some(error)) => Err(error()),
            (Some(record), None) => Ok(record.clone()),
            (None, None) => Err(AuthError::internal("no scripted outcome")),
        }
    }
}

impl OAuthClient for ScriptedOAuth {
    fn authorize_url(&self) -> String {
        "https://accounts.example.test/authorize?client_id=test".to_string()
    }

    fn exchange_code<'a>(&'a self, code: &'a str) -> BoxFuture<'a, AuthResult<TokenRecord>> {
        Box::pin(async move {
            self.exchanges.fetch_add(1, Ordering::SeqCst);
            *self.last_code.lock().unwrap() = Some(code.to_string());
            self.outcome()
        })
    }

    fn refresh<'a>(&'a self, refresh_token: &'a str) -> BoxFuture<'a, AuthResult<TokenRecord>> {
        Box::pin(async move {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            *self.last_refresh_token.lock().unwrap() = Some(refresh_token.to_string());
            self.outcome()
        })
    }
}

/// Answers a single HTTP request on a local port.
///
/// Returns the base URL and a handle resolving to the raw request, body
/// included.
pub async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            if let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&request[..end]).to_ascii_lowercase();
                let length = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if request.len() >= end + 4 + length {
                    break;
                }
            }
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        String::from_utf8_lossy(&request).into_owned()
    });

    (format!("http://{addr}"), handle)
}
