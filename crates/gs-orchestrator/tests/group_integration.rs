//! Group integration tests
//!
//! Exercises the fan-out/collect engine against an in-memory gateway.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::pin::Pin;
use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWrite;
use tokio::time::Instant;

use gs_core::alias::AliasRequest;
use gs_core::{Endpoint, EndpointDefaults, OperationError};
use gs_orchestrator::gateway::{ByteSink, ByteSource};
use gs_orchestrator::{CommandOutput, FileTransfer, Gateway, Group, RemoteSession};

/// Shared state behind the fake gateway
#[derive(Default)]
struct FakeState {
    /// Remote files keyed by (address, path)
    files: Mutex<HashMap<(String, String), Vec<u8>>>,
    /// Addresses whose dial never completes
    hang: HashSet<String>,
    /// Addresses that refuse connections
    refuse: HashSet<String>,
    /// Number of dial attempts
    dials: AtomicUsize,
    /// Sessions opened minus sessions closed
    open_sessions: AtomicIsize,
    /// When each command finished, by address
    finished: Mutex<Vec<(String, Instant)>>,
}

#[derive(Clone, Default)]
struct FakeGateway {
    state: Arc<FakeState>,
}

impl FakeGateway {
    fn with_state(state: FakeState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    fn put_remote(&self, address: &str, path: &str, content: &[u8]) {
        self.state
            .files
            .lock()
            .unwrap()
            .insert((address.to_string(), path.to_string()), content.to_vec());
    }

    fn remote(&self, address: &str, path: &str) -> Option<Vec<u8>> {
        self.state
            .files
            .lock()
            .unwrap()
            .get(&(address.to_string(), path.to_string()))
            .cloned()
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn dial(&self, endpoint: &Endpoint) -> Result<Box<dyn RemoteSession>, OperationError> {
        self.state.dials.fetch_add(1, Ordering::SeqCst);
        let address = endpoint.address();

        if self.state.hang.contains(&address) {
            std::future::pending::<()>().await;
        }
        if self.state.refuse.contains(&address) {
            return Err(OperationError::Connect {
                address,
                message: "Connection refused".to_string(),
            });
        }

        self.state.open_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            address,
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeSession {
    address: String,
    state: Arc<FakeState>,
}

#[async_trait]
impl RemoteSession for FakeSession {
    async fn run_command(&mut self, command: &str) -> Result<CommandOutput, OperationError> {
        let output = match command {
            "hostname" => CommandOutput {
                stdout: format!("{}\n", self.address).into_bytes(),
                stderr: vec![],
                exit_status: Some(0),
            },
            "fail" => CommandOutput {
                stdout: b"partial\n".to_vec(),
                stderr: b"boom\n".to_vec(),
                exit_status: Some(3),
            },
            "drop" => CommandOutput {
                stdout: b"cut".to_vec(),
                stderr: vec![],
                exit_status: None,
            },
            other => CommandOutput {
                stdout: other.as_bytes().to_vec(),
                stderr: vec![],
                exit_status: Some(0),
            },
        };

        self.state
            .finished
            .lock()
            .unwrap()
            .push((self.address.clone(), Instant::now()));
        Ok(output)
    }

    async fn open_transfer(&mut self) -> Result<Box<dyn FileTransfer>, OperationError> {
        Ok(Box::new(FakeTransfer {
            address: self.address.clone(),
            state: Arc::clone(&self.state),
        }))
    }

    async fn close(self: Box<Self>) -> Result<(), OperationError> {
        self.state.open_sessions.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FakeTransfer {
    address: String,
    state: Arc<FakeState>,
}

#[async_trait]
impl FileTransfer for FakeTransfer {
    async fn open_read(&mut self, path: &str) -> Result<ByteSource, OperationError> {
        let content = self
            .state
            .files
            .lock()
            .unwrap()
            .get(&(self.address.clone(), path.to_string()))
            .cloned()
            .ok_or_else(|| OperationError::Remote {
                path: path.to_string(),
                message: "No such file".to_string(),
            })?;
        Ok(Box::new(std::io::Cursor::new(content)))
    }

    async fn open_write(&mut self, path: &str) -> Result<ByteSink, OperationError> {
        Ok(Box::new(MemoryFile {
            key: (self.address.clone(), path.to_string()),
            buf: Vec::new(),
            state: Arc::clone(&self.state),
        }))
    }

    async fn close(self: Box<Self>) -> Result<(), OperationError> {
        Ok(())
    }
}

/// Remote file that is stored on shutdown
struct MemoryFile {
    key: (String, String),
    buf: Vec<u8>,
    state: Arc<FakeState>,
}

impl AsyncWrite for MemoryFile {
    fn poll_write(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, data: &[u8]) -> Poll<std::io::Result<usize>> {
        self.buf.extend_from_slice(data);
        Poll::Ready(Ok(data.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        this.state
            .files
            .lock()
            .unwrap()
            .insert(this.key.clone(), std::mem::take(&mut this.buf));
        Poll::Ready(Ok(()))
    }
}

fn local_endpoints(ports: &[u16]) -> Vec<Endpoint> {
    ports
        .iter()
        .map(|port| Endpoint::new("localhost").with_port(*port))
        .collect()
}

#[tokio::test]
async fn test_run_returns_one_result_per_endpoint() {
    let state = FakeState {
        refuse: ["localhost:233".to_string()].into_iter().collect(),
        ..Default::default()
    };
    let gateway = FakeGateway::with_state(state);
    let group = Group::with_gateway(local_endpoints(&[231, 232, 233, 234, 235]), gateway.clone());

    let results = group.run("hostname").await;

    assert_eq!(results.len(), 5);
    let ports: Vec<u16> = results.iter().map(|r| r.port).collect();
    assert_eq!(ports, vec![231, 232, 233, 234, 235]);

    let failed: Vec<_> = results.iter().filter(|r| !r.is_success()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].port, 233);
    assert!(matches!(failed[0].error, Some(OperationError::Connect { .. })));

    assert_eq!(results[0].stdout, "localhost:231\n");
    assert_eq!(results[0].exit_status, Some(0));
    assert_eq!(gateway.state.dials.load(Ordering::SeqCst), 5);
    assert_eq!(gateway.state.open_sessions.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_hanging_endpoint_does_not_delay_others() {
    let state = FakeState {
        hang: ["unreachable:22".to_string()].into_iter().collect(),
        ..Default::default()
    };
    let gateway = FakeGateway::with_state(state);

    let mut endpoints = local_endpoints(&[231, 232, 233]);
    endpoints.insert(1, Endpoint::new("unreachable").with_timeout(Duration::from_secs(30)));
    let group = Group::with_gateway(endpoints, gateway.clone());

    let started = Instant::now();
    let results = group.run("hostname").await;

    assert_eq!(results.len(), 4);
    let hung = &results[1];
    assert_eq!(hung.host, "unreachable");
    assert!(hung.error.as_ref().is_some_and(|e| e.is_timeout()));
    assert!(hung.error.as_ref().unwrap().to_string().contains("timed out"));

    for result in results.iter().filter(|r| r.host == "localhost") {
        assert!(result.is_success(), "{:?}", result.error);
    }

    // The batch waits for the deadline, the healthy endpoints did not
    assert!(started.elapsed() >= Duration::from_secs(30));
    let finished = gateway.state.finished.lock().unwrap().clone();
    assert_eq!(finished.len(), 3);
    for (address, at) in finished {
        assert!(
            at.duration_since(started) < Duration::from_secs(1),
            "{} finished late",
            address
        );
    }
}

#[tokio::test]
async fn test_get_renders_one_local_path_per_endpoint() {
    let gateway = FakeGateway::default();
    gateway.put_remote("localhost:231", "/etc/hostname", b"77dd91fdf86f\n");
    gateway.put_remote("localhost:232", "/etc/hostname", b"dad24c1d844c\n");
    gateway.put_remote("10.0.0.7:22", "/etc/hostname", b"427c640edd0d\n");

    let endpoints = vec![
        Endpoint::new("localhost").with_port(231).with_alias("host1"),
        Endpoint::new("localhost").with_port(232).with_alias("host2"),
        Endpoint::new("10.0.0.7"),
    ];
    let group = Group::with_gateway(endpoints, gateway);

    let dir = tempfile::tempdir().unwrap();
    let pattern = format!("{}/{{host}}-{{port}}-hostname", dir.path().display());
    let results = group.get("/etc/hostname", &pattern).await;

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.is_success()));

    let host2 = dir.path().join("host2-232-hostname");
    assert_eq!(std::fs::read(&host2).unwrap(), b"dad24c1d844c\n");
    assert_eq!(
        std::fs::read(dir.path().join("host1-231-hostname")).unwrap(),
        b"77dd91fdf86f\n"
    );
    assert_eq!(
        std::fs::read(dir.path().join("10.0.0.7-22-hostname")).unwrap(),
        b"427c640edd0d\n"
    );

    assert_eq!(
        results[1].stdout,
        format!("File /etc/hostname processed to {}\n", host2.display())
    );
}

#[tokio::test]
async fn test_put_then_get_round_trips_bytes() {
    let gateway = FakeGateway::default();
    let group = Group::with_gateway(local_endpoints(&[231, 232]), gateway.clone());

    let dir = tempfile::tempdir().unwrap();
    let payload: Vec<u8> = (0..=255u8).cycle().take(70_000).collect();
    let source = dir.path().join("payload.bin");
    std::fs::File::create(&source).unwrap().write_all(&payload).unwrap();

    let source_str = source.to_str().unwrap();
    let put = group.put(source_str, "/tmp/payload.bin").await;
    assert!(put.iter().all(|r| r.is_success()));
    assert_eq!(
        put[0].stdout,
        format!("File {} processed to /tmp/payload.bin\n", source_str)
    );
    assert_eq!(gateway.remote("localhost:232", "/tmp/payload.bin").unwrap(), payload);

    let pattern = format!("{}/back-{{port}}", dir.path().display());
    let got = group.get("/tmp/payload.bin", &pattern).await;
    assert!(got.iter().all(|r| r.is_success()));
    for port in [231, 232] {
        let fetched = std::fs::read(dir.path().join(format!("back-{}", port))).unwrap();
        assert_eq!(fetched, payload);
    }
}

#[tokio::test]
async fn test_missing_alias_source_contacts_no_endpoint() {
    let gateway = FakeGateway::default();
    let dir = tempfile::tempdir().unwrap();

    let requests = vec![AliasRequest::new("host1"), AliasRequest::new("host2")];
    let err = Group::from_aliases_with_gateway(
        &dir.path().join("config"),
        &requests,
        &EndpointDefaults::default(),
        gateway.clone(),
    )
    .unwrap_err();

    assert!(err.to_string().contains("not found"));
    assert_eq!(gateway.state.dials.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_alias_group_runs_against_resolved_endpoints() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config");
    std::fs::write(
        &config,
        "Host host1\n  HostName localhost\n  Port 231\n\
         Host host2\n  HostName localhost\n  Port 232\n",
    )
    .unwrap();

    let gateway = FakeGateway::default();
    let requests = vec![
        AliasRequest::new("host1"),
        AliasRequest::new("host2"),
        AliasRequest::new("127.0.0.1"),
    ];
    let group =
        Group::from_aliases_with_gateway(&config, &requests, &EndpointDefaults::default(), gateway).unwrap();
    assert_eq!(group.len(), 3);

    let results = group.run("hostname").await;
    let names: Vec<&str> = results.iter().map(|r| r.display_name()).collect();
    assert_eq!(names, vec!["host1", "host2", "127.0.0.1"]);
    assert_eq!(results[1].stdout, "localhost:232\n");
    assert_eq!(results[2].stdout, "127.0.0.1:22\n");
}

#[tokio::test]
async fn test_duplicate_endpoints_yield_duplicate_results() {
    let group = Group::with_gateway(local_endpoints(&[22, 22]), FakeGateway::default());
    let results = group.run("uptime").await;
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.is_success() && r.stdout == "uptime"));
}

#[tokio::test]
async fn test_command_failure_keeps_partial_output() {
    let group = Group::with_gateway(local_endpoints(&[22]), FakeGateway::default());

    let results = group.run("fail").await;
    let result = &results[0];
    assert!(matches!(
        result.error,
        Some(OperationError::CommandFailed { exit_status: 3 })
    ));
    assert_eq!(result.exit_status, Some(3));
    assert_eq!(result.stdout, "partial\n");
    assert_eq!(result.stderr, "boom\n");

    let results = group.run("drop").await;
    assert!(matches!(results[0].error, Some(OperationError::CommandIncomplete)));
    assert_eq!(results[0].stdout, "cut");
}

#[tokio::test]
async fn test_transfer_failures_are_contained() {
    let gateway = FakeGateway::default();
    gateway.put_remote("localhost:231", "/etc/motd", b"hello");
    let group = Group::with_gateway(local_endpoints(&[231, 232]), gateway.clone());
    let dir = tempfile::tempdir().unwrap();

    let pattern = format!("{}/motd-{{port}}", dir.path().display());
    let results = group.get("/etc/motd", &pattern).await;
    assert!(results[0].is_success());
    assert!(matches!(results[1].error, Some(OperationError::Remote { .. })));
    assert!(!dir.path().join("motd-232").exists());

    let missing = dir.path().join("does-not-exist");
    let results = group.put(missing.to_str().unwrap(), "/tmp/x").await;
    assert_eq!(results.len(), 2);
    for result in &results {
        assert!(matches!(result.error, Some(OperationError::LocalIo { .. })));
    }
    assert!(gateway.remote("localhost:231", "/tmp/x").is_none());
    assert_eq!(gateway.state.open_sessions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_group_returns_empty_batch() {
    let group = Group::with_gateway(vec![], FakeGateway::default());
    assert!(group.is_empty());
    assert!(group.run("hostname").await.is_empty());
}
