//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use autostart::config::{AutostartConfig, IdentityConfig};
use autostart::http::{HttpServer, OdcTemplate};
use autostart::lifecycle::{self, Shutdown};

/// Start a programmable mock backend. `f` gets the method and path (without
/// query) of each request and returns the status and JSON body to send.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let (read_half, mut write_half) = socket.into_split();
                        let mut reader = BufReader::new(read_half);

                        let mut request_line = String::new();
                        if reader.read_line(&mut request_line).await.unwrap_or(0) == 0 {
                            return;
                        }
                        // Drain headers; bodies sent to the mock are always empty.
                        loop {
                            let mut line = String::new();
                            let n = reader.read_line(&mut line).await.unwrap_or(0);
                            if n == 0 || line == "\r\n" {
                                break;
                            }
                        }

                        let mut parts = request_line.split_whitespace();
                        let method = parts.next().unwrap_or_default().to_string();
                        let target = parts.next().unwrap_or_default();
                        let path = target.split('?').next().unwrap_or_default().to_string();

                        let (status, body) = f(method, path).await;
                        let status_text = match status {
                            200 => "200 OK",
                            202 => "202 Accepted",
                            403 => "403 Forbidden",
                            404 => "404 Not Found",
                            409 => "409 Conflict",
                            500 => "500 Internal Server Error",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = write_half.write_all(response_str.as_bytes()).await;
                        let _ = write_half.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Management API mock that plays back server states.
///
/// GETs answer with the next state in `script` (the last one repeats);
/// POSTs to `/resume` answer 202. Every request is logged as `"GET"` or
/// `"RESUME"`.
pub struct ScriptedManagement {
    pub addr: SocketAddr,
    pub log: Arc<Mutex<Vec<&'static str>>>,
}

impl ScriptedManagement {
    pub async fn start(script: Vec<(&'static str, Option<&'static str>)>) -> Self {
        let log = Arc::new(Mutex::new(Vec::new()));
        let cursor = Arc::new(Mutex::new(0usize));

        let requests = log.clone();
        let addr = start_programmable_backend(move |method, path| {
            let requests = requests.clone();
            let cursor = cursor.clone();
            let script = script.clone();
            async move {
                if method == "POST" && path.ends_with("/resume") {
                    requests.lock().unwrap().push("RESUME");
                    return (202, String::new());
                }

                requests.lock().unwrap().push("GET");
                let (state, endpoint) = {
                    let mut cursor = cursor.lock().unwrap();
                    let index = (*cursor).min(script.len() - 1);
                    *cursor += 1;
                    script[index]
                };
                let mut properties = serde_json::json!({ "state": state });
                if let Some(endpoint) = endpoint {
                    properties["serverFullName"] = serde_json::json!(endpoint);
                }
                (200, serde_json::json!({ "properties": properties }).to_string())
            }
        })
        .await;

        Self { addr, log }
    }

    pub fn requests(&self) -> Vec<&'static str> {
        self.log.lock().unwrap().clone()
    }
}

/// Config pointing at a mock management API with fast polling.
pub fn test_config(management: SocketAddr, deadline_secs: u64) -> AutostartConfig {
    let mut config = AutostartConfig::default();
    config.resource.subscription_id = "sub".into();
    config.resource.resource_group = "rg".into();
    config.resource.server_name = "cubes".into();
    config.management.base_url = format!("http://{}", management);
    config.management.request_timeout_secs = 5;
    config.identity = IdentityConfig::Static {
        token: "test-token".into(),
    };
    config.orchestration.deadline_secs = deadline_secs;
    config.polling.base_delay_ms = 10;
    config.polling.max_delay_ms = 50;
    config
}

/// Start the autostart HTTP server on an ephemeral port.
pub async fn start_autostart(config: AutostartConfig) -> (SocketAddr, Shutdown) {
    let shutdown = Shutdown::new();
    let orchestrator = Arc::new(lifecycle::build_orchestrator(&config).unwrap());
    let guard = lifecycle::build_guard(&config, shutdown.runs_token());
    let server = HttpServer::new(config, orchestrator, guard, OdcTemplate::builtin());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
