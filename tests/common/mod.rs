//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hookroute::{Dispatcher, HttpServer, Response, ServeConfig, Shutdown};
use tokio::net::TcpListener;

/// Response body as (lossy) UTF-8.
#[allow(dead_code)]
pub fn body_text(response: &Response) -> String {
    String::from_utf8_lossy(response.body()).into_owned()
}

/// Append-only log shared between effects, handlers and cleanups.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct Trace(Arc<Mutex<String>>);

#[allow(dead_code)]
impl Trace {
    pub fn push(&self, step: &str) {
        self.0.lock().unwrap().push_str(step);
    }

    pub fn get(&self) -> String {
        self.0.lock().unwrap().clone()
    }
}

/// Build `setup` and serve it on a free loopback port.
///
/// Returns the bound address and the shutdown handle stopping the server.
#[allow(dead_code)]
pub async fn start_server<F: FnOnce()>(setup: F, config: ServeConfig) -> (SocketAddr, Shutdown) {
    let dispatcher = Dispatcher::build(setup).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(Arc::new(dispatcher), config);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown)
}
