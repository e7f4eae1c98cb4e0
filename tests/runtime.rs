//! End-to-end tests for the block runtime: FIFO round trips, polling ticks,
//! and remote calls against a loaded registry.

#![cfg(unix)]

use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use unix_bridge::{
    Config, Decoded, Dispatcher, EventSink, EventSource, PipeSource, PollSource, Registry,
    RetryPolicy, RuntimePaths, Supervisor,
};

/// Sink that records every emitted event.
#[derive(Default)]
struct CollectSink {
    events: Mutex<Vec<(String, Decoded)>>,
}

impl CollectSink {
    fn snapshot(&self) -> Vec<(String, Decoded)> {
        self.events.lock().unwrap().clone()
    }

    fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait]
impl EventSink for CollectSink {
    async fn emit_event(&self, block_id: &str, value: Decoded) {
        self.events
            .lock()
            .unwrap()
            .push((block_id.to_owned(), value));
    }
}

/// Polls `predicate` every 10 ms until it holds or `timeout` elapses.
async fn wait_until(timeout: Duration, predicate: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    predicate()
}

/// Writes a shell script into `dir` and marks it executable.
fn write_script(dir: &Path, name: &str, body: &str) {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Opens the FIFO for writing (blocking rendezvous) and writes one payload.
async fn write_to_pipe(path: &Path, payload: &'static [u8]) {
    let path = path.to_owned();
    tokio::task::spawn_blocking(move || {
        let mut writer = fs::OpenOptions::new().write(true).open(path).unwrap();
        writer.write_all(payload).unwrap();
        // Dropping the writer closes the pipe and triggers a reader reopen.
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn pipe_source_dispatches_once_per_write_across_reopen_cycles() {
    let dir = TempDir::new().unwrap();
    let pipe_path = dir.path().join("pipes").join("mail");

    let (dispatcher, worker) = Dispatcher::channel(16);
    let sink = Arc::new(CollectSink::default());
    let worker_handle = tokio::spawn(worker.run(sink.clone()));

    let source = PipeSource::new("mail", &pipe_path, 4096, dispatcher);
    let token = CancellationToken::new();
    let source_handle = tokio::spawn({
        let ctx = token.clone();
        async move { source.run(ctx).await }
    });

    // The source creates the FIFO on startup.
    let fifo = pipe_path.clone();
    assert!(wait_until(Duration::from_secs(2), move || fifo.exists()).await);

    // Two writer sessions, each closing the pipe afterwards. The zero-length
    // read between them must reopen, not dispatch.
    write_to_pipe(&pipe_path, b"\"one\"").await;
    let sink_count = sink.clone();
    assert!(wait_until(Duration::from_secs(2), move || sink_count.len() == 1).await);

    write_to_pipe(&pipe_path, b"two: not json").await;
    let sink_count = sink.clone();
    assert!(wait_until(Duration::from_secs(2), move || sink_count.len() == 2).await);

    token.cancel();
    source_handle.await.unwrap().unwrap();
    worker_handle.await.unwrap();

    assert_eq!(
        sink.snapshot(),
        vec![
            ("mail".to_owned(), Decoded::Structured(json!("one"))),
            ("mail".to_owned(), Decoded::Raw("two: not json".to_owned())),
        ]
    );
}

#[tokio::test]
async fn poll_source_keeps_ticking_past_failures() {
    let dir = TempDir::new().unwrap();
    // Succeeds on odd runs (printing the run number), fails on even runs.
    write_script(
        dir.path(),
        "tick.sh",
        "#!/bin/sh\n\
         n=$(cat count 2>/dev/null || echo 0)\n\
         n=$((n + 1))\n\
         echo \"$n\" > count\n\
         if [ $((n % 2)) -eq 0 ]; then exit 1; fi\n\
         echo \"$n\"\n",
    );

    let (dispatcher, worker) = Dispatcher::channel(16);
    let sink = Arc::new(CollectSink::default());
    let worker_handle = tokio::spawn(worker.run(sink.clone()));

    let runner = unix_bridge::CommandRunner::new(dir.path(), Some(Duration::from_secs(5)));
    let command: unix_bridge::CommandSpec = serde_json::from_str(r#"["./tick.sh"]"#).unwrap();
    let source = PollSource::new(
        "counter",
        command,
        Duration::from_millis(50),
        Duration::ZERO,
        runner,
        dispatcher,
    );

    let token = CancellationToken::new();
    let source_handle = tokio::spawn({
        let ctx = token.clone();
        async move { source.run(ctx).await }
    });

    let sink_count = sink.clone();
    assert!(wait_until(Duration::from_secs(5), move || sink_count.len() >= 3).await);
    token.cancel();
    source_handle.await.unwrap().unwrap();
    worker_handle.await.unwrap();

    // Only odd runs dispatch; even runs failed but never stopped the loop.
    let values: Vec<_> = sink.snapshot().into_iter().map(|(_, v)| v).collect();
    for (i, value) in values.iter().enumerate() {
        assert_eq!(*value, Decoded::Structured(json!(2 * i + 1)));
    }
    let runs: u64 = fs::read_to_string(dir.path().join("count"))
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    assert!(runs as usize >= values.len() * 2 - 1);
}

#[tokio::test]
async fn handle_call_runs_operation_end_to_end() {
    let dir = TempDir::new().unwrap();
    write_script(dir.path(), "add_cmd.sh", "#!/bin/sh\necho $(($1 + $2))\n");
    fs::write(
        dir.path().join("blocks.json"),
        r#"{"operations": [{"id": "add", "message": "Add %1 and %2", "command": ["./add_cmd.sh", "$1", "$2"]}]}"#,
    )
    .unwrap();

    let paths = RuntimePaths::new(dir.path());
    let cfg = Config::default();
    let (dispatcher, _worker) = Dispatcher::channel(cfg.dispatch_capacity_clamped());
    let registry = Registry::load(&paths, &cfg, dispatcher).unwrap();

    let result = registry
        .handle_call("add", &[json!(2), json!(3)], None)
        .await
        .unwrap();
    assert_eq!(result, Decoded::Structured(json!(5)));
}

#[tokio::test]
async fn supervisor_runs_a_loaded_document_until_shutdown() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("blocks.json"),
        r#"{"events": [{"id": "ping", "message": "Ping received."}]}"#,
    )
    .unwrap();

    let paths = RuntimePaths::new(dir.path());
    let cfg = Config {
        grace: Duration::from_secs(5),
        retry: RetryPolicy {
            first: Duration::from_millis(10),
            max: Duration::from_millis(100),
            factor: 2.0,
            jitter: false,
        },
        ..Config::default()
    };

    let (dispatcher, worker) = Dispatcher::channel(cfg.dispatch_capacity_clamped());
    let mut registry = Registry::load(&paths, &cfg, dispatcher).unwrap();
    let sources = registry.take_sources();

    let sink = Arc::new(CollectSink::default());
    let supervisor = Supervisor::new(cfg);
    let shutdown = supervisor.shutdown_handle();

    let pipe_path = paths.pipe_path("ping");
    let run = tokio::spawn({
        let sink = sink.clone();
        async move { supervisor.run(sources, worker, sink).await }
    });

    let fifo = pipe_path.clone();
    assert!(wait_until(Duration::from_secs(2), move || fifo.exists()).await);
    write_to_pipe(&pipe_path, b"{\"n\": 1}").await;

    let sink_count = sink.clone();
    assert!(wait_until(Duration::from_secs(2), move || sink_count.len() == 1).await);
    shutdown.cancel();
    run.await.unwrap().unwrap();

    assert_eq!(
        sink.snapshot(),
        vec![("ping".to_owned(), Decoded::Structured(json!({"n": 1})))]
    );
}
