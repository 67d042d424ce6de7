use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio::time::Instant;

use photogrid_core::{
    registry,
    types::{Gallery, GalleryName},
};
use photogrid_sync::{
    pipeline::{self, RefreshScope},
    RefreshReport, WriteResult,
};

use crate::error::{io_err, DaemonError};
use crate::paths::{galleries_root, log_path, logs_dir, run_dir, socket_path};
use crate::protocol::{DaemonRequest, DaemonResponse};

pub type GalleryCache = HashMap<GalleryName, Gallery>;

/// Per-gallery last-successful-refresh timestamps (Unix seconds).
/// Key: gallery name string. Value: unix seconds at last completed refresh.
pub type RefreshTimestamps = HashMap<String, u64>;

#[derive(Debug, Clone)]
enum RefreshTarget {
    All,
    Gallery(String),
}

impl RefreshTarget {
    fn scope(&self) -> RefreshScope {
        match self {
            RefreshTarget::All => RefreshScope::All,
            RefreshTarget::Gallery(name) => RefreshScope::Gallery(name.clone()),
        }
    }

    fn label(&self) -> String {
        match self {
            RefreshTarget::All => "all".to_string(),
            RefreshTarget::Gallery(name) => name.clone(),
        }
    }
}

struct RefreshJob {
    target: RefreshTarget,
    source: &'static str,
    respond_to: oneshot::Sender<Result<RefreshSummary, String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshSummary {
    pub target: String,
    pub source: String,
    pub galleries: Vec<String>,
    pub written: usize,
    pub unchanged: usize,
    /// Cycles that ended in an Error status (fetch/parse failures).
    pub errors: usize,
    pub duration_ms: u128,
}

/// Start the daemon runtime and block the current thread until it exits.
pub fn start_blocking(home: &Path) -> Result<(), DaemonError> {
    init_tracing(home);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(home.to_path_buf()))
}

/// Run the daemon runtime.
pub async fn run(home: PathBuf) -> Result<(), DaemonError> {
    ensure_runtime_dirs(&home)?;

    let cache = std::sync::Arc::new(RwLock::new(load_gallery_cache(&home)?));
    let refresh_timestamps: std::sync::Arc<RwLock<RefreshTimestamps>> =
        std::sync::Arc::new(RwLock::new(HashMap::new()));
    let started_at_unix = unix_seconds_now();

    let (refresh_tx, refresh_rx) = mpsc::channel::<RefreshJob>(64);
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let scheduler_handle = {
        let shutdown = shutdown_tx.clone();
        let cache = cache.clone();
        let refresh_tx = refresh_tx.clone();
        tokio::spawn(async move {
            let result = refresh_scheduler_task(cache, refresh_tx, shutdown.clone()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let processor_handle = {
        let shutdown = shutdown_tx.clone();
        let home = home.clone();
        let cache = cache.clone();
        let timestamps = refresh_timestamps.clone();
        tokio::spawn(async move {
            let result =
                refresh_processor_task(home, cache, timestamps, refresh_rx, shutdown.subscribe())
                    .await;
            let _ = shutdown.send(());
            result
        })
    };

    let socket_handle = {
        let shutdown = shutdown_tx.clone();
        let home = home.clone();
        let cache = cache.clone();
        let refresh_tx = refresh_tx.clone();
        let timestamps = refresh_timestamps.clone();
        tokio::spawn(async move {
            let result = socket_server_task(
                home,
                cache,
                timestamps,
                refresh_tx,
                shutdown.clone(),
                shutdown.subscribe(),
                started_at_unix,
            )
            .await;
            let _ = shutdown.send(());
            result
        })
    };

    let rotation_handle = {
        let shutdown = shutdown_tx.clone();
        let home = home.clone();
        tokio::spawn(async move {
            let result = log_rotation_task(home, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, shutting down daemon");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(DaemonError::Protocol(format!("ctrl-c handler failed: {err}"))),
                    }
                }
            }
        })
    };

    let (scheduler_result, processor_result, socket_result, rotation_result, signal_result) =
        tokio::join!(
            scheduler_handle,
            processor_handle,
            socket_handle,
            rotation_handle,
            signal_handle
        );

    handle_join("refresh_scheduler", scheduler_result)?;
    handle_join("refresh_processor", processor_result)?;
    handle_join("socket_server", socket_result)?;
    handle_join("log_rotation", rotation_result)?;
    handle_join("signal_handler", signal_result)?;
    Ok(())
}

/// Spawn one interval loop per registered gallery, then wait for shutdown.
///
/// The gallery set is snapshotted at startup; registering a new gallery takes
/// effect on the next daemon start.
async fn refresh_scheduler_task(
    cache: std::sync::Arc<RwLock<GalleryCache>>,
    refresh_tx: mpsc::Sender<RefreshJob>,
    shutdown_tx: broadcast::Sender<()>,
) -> Result<(), DaemonError> {
    let schedules: Vec<(String, Duration)> = {
        let cache = cache.read().await;
        let mut entries: Vec<_> = cache
            .values()
            .map(|g| (g.name.0.clone(), Duration::from_secs(g.refresh_interval_secs.max(1))))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    };

    if schedules.is_empty() {
        tracing::warn!("no galleries registered; scheduler idle until restart");
    }

    let mut loops = Vec::new();
    for (name, every) in schedules {
        tracing::info!("scheduling '{}' every {}s", name, every.as_secs());
        loops.push(tokio::spawn(gallery_refresh_loop(
            name,
            every,
            refresh_tx.clone(),
            shutdown_tx.subscribe(),
        )));
    }

    let mut shutdown_rx = shutdown_tx.subscribe();
    let _ = shutdown_rx.recv().await;

    for handle in loops {
        match handle.await {
            Ok(result) => result?,
            Err(err) => {
                return Err(DaemonError::Protocol(format!(
                    "gallery loop join failure: {err}"
                )))
            }
        }
    }
    Ok(())
}

/// One gallery's refresh clock: an immediate first refresh, then one per
/// interval for as long as the daemon lives.
async fn gallery_refresh_loop(
    name: String,
    every: Duration,
    refresh_tx: mpsc::Sender<RefreshJob>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let mut interval = tokio::time::interval(every);
    // Ticks missed while a refresh is in flight collapse into one.
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = interval.tick() => {
                match enqueue_refresh(&refresh_tx, RefreshTarget::Gallery(name.clone()), "timer").await {
                    Ok(summary) => {
                        tracing::info!(
                            "timer refresh completed: {} ({} written, {} unchanged, {} errors, {}ms)",
                            summary.target,
                            summary.written,
                            summary.unchanged,
                            summary.errors,
                            summary.duration_ms,
                        );
                    }
                    Err(err) => {
                        tracing::error!("timer refresh failed for '{name}': {err}");
                    }
                }
            }
        }
    }

    Ok(())
}

async fn refresh_processor_task(
    home: PathBuf,
    cache: std::sync::Arc<RwLock<GalleryCache>>,
    timestamps: std::sync::Arc<RwLock<RefreshTimestamps>>,
    mut refresh_rx: mpsc::Receiver<RefreshJob>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            maybe_job = refresh_rx.recv() => {
                let Some(job) = maybe_job else { break };
                let started = Instant::now();

                let target = job.target.clone();
                let source = job.source;
                let home_for_refresh = home.clone();
                let refresh_result = tokio::task::spawn_blocking(move || {
                    pipeline::run(&home_for_refresh, target.scope(), false)
                })
                .await
                .map_err(|err| DaemonError::Protocol(format!("refresh task join error: {err}")))?;

                let outcome = match refresh_result {
                    Ok(reports) => {
                        let refreshed = refresh_cache(home.clone(), cache.clone()).await;
                        match refreshed {
                            Ok(()) => {
                                // Record completed-refresh timestamp for each affected gallery.
                                let now = unix_seconds_now();
                                let mut ts = timestamps.write().await;
                                for name in reports.iter().map(|r| r.gallery_name.as_str()) {
                                    ts.insert(name.to_string(), now);
                                }
                                // Drop write lock before building summary.
                                drop(ts);
                                Ok(build_refresh_summary(job.target, source, reports, started.elapsed()))
                            }
                            Err(err) => Err(err.to_string()),
                        }
                    }
                    Err(err) => Err(err.to_string()),
                };

                let _ = job.respond_to.send(outcome);
            }
        }
    }

    Ok(())
}

async fn socket_server_task(
    home: PathBuf,
    cache: std::sync::Arc<RwLock<GalleryCache>>,
    timestamps: std::sync::Arc<RwLock<RefreshTimestamps>>,
    refresh_tx: mpsc::Sender<RefreshJob>,
    shutdown_tx: broadcast::Sender<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
    started_at_unix: u64,
) -> Result<(), DaemonError> {
    let run = run_dir(&home);
    if !run.exists() {
        fs::create_dir_all(&run).map_err(|e| io_err(&run, e))?;
    }

    let socket = socket_path(&home);
    prepare_socket_for_bind(&socket)?;

    let listener = UnixListener::bind(&socket).map_err(|e| io_err(&socket, e))?;
    set_socket_permissions(&socket)?;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            accepted = listener.accept() => {
                let (stream, _) = accepted.map_err(|e| io_err(&socket, e))?;
                let home = home.clone();
                let cache = cache.clone();
                let timestamps = timestamps.clone();
                let refresh_tx = refresh_tx.clone();
                let shutdown_tx = shutdown_tx.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_socket_client(
                        stream,
                        home,
                        cache,
                        timestamps,
                        refresh_tx,
                        shutdown_tx,
                        started_at_unix,
                    ).await {
                        tracing::error!("socket client error: {err}");
                    }
                });
            }
        }
    }

    if socket.exists() {
        let _ = fs::remove_file(&socket);
    }
    Ok(())
}

async fn handle_socket_client(
    stream: UnixStream,
    home: PathBuf,
    cache: std::sync::Arc<RwLock<GalleryCache>>,
    timestamps: std::sync::Arc<RwLock<RefreshTimestamps>>,
    refresh_tx: mpsc::Sender<RefreshJob>,
    shutdown_tx: broadcast::Sender<()>,
    started_at_unix: u64,
) -> Result<(), DaemonError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| io_err("daemon socket read", e))?
    {
        if line.trim().is_empty() {
            continue;
        }

        let request: Result<DaemonRequest, _> = serde_json::from_str(&line);
        let request = match request {
            Ok(request) => request,
            Err(err) => {
                write_response(
                    &mut writer,
                    &DaemonResponse::error(format!("invalid request JSON: {err}")),
                )
                .await?;
                continue;
            }
        };

        let cmd = request.cmd.clone();
        let gallery = request.gallery.clone();

        let response = match cmd.as_str() {
            "status" => {
                let payload =
                    build_status_payload(&home, cache.clone(), timestamps.clone(), started_at_unix)
                        .await;
                DaemonResponse::ok(payload)
            }
            "refresh" => {
                let target = match gallery {
                    Some(gallery) => RefreshTarget::Gallery(gallery),
                    None => RefreshTarget::All,
                };
                match enqueue_refresh(&refresh_tx, target, "socket").await {
                    Ok(summary) => DaemonResponse::ok(json!(summary)),
                    Err(err) => DaemonResponse::error(err.to_string()),
                }
            }
            "stop" => {
                let _ = shutdown_tx.send(());
                DaemonResponse::ok(json!({ "stopping": true }))
            }
            other => DaemonResponse::error(format!("unknown command '{other}'")),
        };

        write_response(&mut writer, &response).await?;
        if cmd == "stop" {
            break;
        }
    }

    Ok(())
}

async fn build_status_payload(
    home: &Path,
    cache: std::sync::Arc<RwLock<GalleryCache>>,
    timestamps: std::sync::Arc<RwLock<RefreshTimestamps>>,
    started_at_unix: u64,
) -> Value {
    // Collect gallery names from the cache (read lock, dropped immediately).
    let names: Vec<String> = {
        let cache = cache.read().await;
        let mut v: Vec<String> = cache.keys().map(|name| name.0.clone()).collect();
        v.sort();
        v
    };

    // Snapshot timestamps (read lock, dropped before JSON assembly).
    let ts_snapshot: HashMap<String, u64> = {
        let ts = timestamps.read().await;
        ts.clone()
    };

    // Build per-gallery objects with last refresh time.
    let galleries: Vec<Value> = names
        .iter()
        .map(|name| {
            let last_refresh = ts_snapshot.get(name).copied().unwrap_or(0);
            json!({
                "name": name,
                "last_refresh_at_unix": last_refresh,
            })
        })
        .collect();

    // Daemon-wide last refresh = max of per-gallery timestamps (0 if none yet).
    let last_refresh_at_unix = ts_snapshot.values().copied().max().unwrap_or(0);

    json!({
        "running": true,
        "label": crate::paths::DAEMON_LABEL,
        "started_at_unix": started_at_unix,
        "last_refresh_at_unix": last_refresh_at_unix,
        "galleries": galleries,
        "socket": socket_path(home).display().to_string(),
        "galleries_root": galleries_root(home).display().to_string(),
    })
}

async fn enqueue_refresh(
    refresh_tx: &mpsc::Sender<RefreshJob>,
    target: RefreshTarget,
    source: &'static str,
) -> Result<RefreshSummary, DaemonError> {
    let (tx, rx) = oneshot::channel();
    refresh_tx
        .send(RefreshJob {
            target,
            source,
            respond_to: tx,
        })
        .await
        .map_err(|_| DaemonError::ChannelClosed("refresh queue"))?;

    let outcome = rx
        .await
        .map_err(|_| DaemonError::ChannelClosed("refresh response"))?;
    outcome.map_err(DaemonError::Protocol)
}

async fn refresh_cache(
    home: PathBuf,
    cache: std::sync::Arc<RwLock<GalleryCache>>,
) -> Result<(), DaemonError> {
    let refreshed = tokio::task::spawn_blocking(move || load_gallery_cache(&home))
        .await
        .map_err(|err| DaemonError::Protocol(format!("cache refresh join error: {err}")))??;
    let mut guard = cache.write().await;
    *guard = refreshed;
    Ok(())
}

async fn log_rotation_task(
    home: PathBuf,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    // Skip the first (immediate) tick to avoid rotating on startup.
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    interval.tick().await; // consume the first immediate tick

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = interval.tick() => {
                let home = home.clone();
                tokio::task::spawn_blocking(move || {
                    crate::log_rotation::rotate_logs(&home);
                })
                .await
                .ok(); // rotation errors are logged inside rotate_logs; never crash the daemon
            }
        }
    }
    Ok(())
}

fn build_refresh_summary(
    target: RefreshTarget,
    source: &'static str,
    reports: Vec<RefreshReport>,
    duration: Duration,
) -> RefreshSummary {
    let mut galleries = Vec::new();
    let mut written = 0usize;
    let mut unchanged = 0usize;
    let mut errors = 0usize;

    for report in reports {
        galleries.push(report.gallery_name);
        if report.status.is_error() {
            errors += 1;
        }
        for write in report.writes {
            match write {
                WriteResult::Written { .. } | WriteResult::WouldWrite { .. } => written += 1,
                WriteResult::Unchanged { .. } => unchanged += 1,
            }
        }
    }

    RefreshSummary {
        target: target.label(),
        source: source.to_string(),
        galleries,
        written,
        unchanged,
        errors,
        duration_ms: duration.as_millis(),
    }
}

fn load_gallery_cache(home: &Path) -> Result<GalleryCache, DaemonError> {
    let mut cache = HashMap::new();
    for gallery in registry::list_galleries_at(home)? {
        cache.insert(gallery.name.clone(), gallery);
    }
    Ok(cache)
}

fn prepare_socket_for_bind(socket: &Path) -> Result<(), DaemonError> {
    if !socket.exists() {
        return Ok(());
    }

    match StdUnixStream::connect(socket) {
        Ok(_) => {
            return Err(DaemonError::Protocol(format!(
                "daemon socket already in use: {}",
                socket.display()
            )));
        }
        Err(err) => {
            tracing::warn!(
                "removing stale daemon socket {} before bind: {err}",
                socket.display(),
            );
        }
    }

    match fs::remove_file(socket) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(socket, err)),
    }
}

fn ensure_runtime_dirs(home: &Path) -> Result<(), DaemonError> {
    let galleries = galleries_root(home);
    if !galleries.exists() {
        fs::create_dir_all(&galleries).map_err(|e| io_err(&galleries, e))?;
    }
    let run = run_dir(home);
    if !run.exists() {
        fs::create_dir_all(&run).map_err(|e| io_err(&run, e))?;
    }
    let logs = logs_dir(home);
    if !logs.exists() {
        fs::create_dir_all(&logs).map_err(|e| io_err(&logs, e))?;
    }
    Ok(())
}

async fn write_response(
    writer: &mut OwnedWriteHalf,
    response: &DaemonResponse,
) -> Result<(), DaemonError> {
    let payload = serde_json::to_string(response)?;
    writer
        .write_all(payload.as_bytes())
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .flush()
        .await
        .map_err(|e| io_err("daemon socket flush", e))?;
    Ok(())
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Protocol(format!(
            "{task} task join failure: {err}"
        ))),
    }
}

fn unix_seconds_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn init_tracing(home: &Path) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let logs = logs_dir(home);
    let _ = fs::create_dir_all(&logs);

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path(home));
    match file {
        Ok(file) => {
            let _ = fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .try_init();
        }
        Err(_) => {
            // Fall back to stderr when the log file cannot be opened.
            let _ = fmt().with_env_filter(filter).with_target(false).try_init();
        }
    }
}

#[cfg(unix)]
fn set_socket_permissions(path: &Path) -> Result<(), DaemonError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_socket_permissions(_path: &Path) -> Result<(), DaemonError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use photogrid_core::SyncStatus;
    use serde_json::json;
    use tempfile::TempDir;
    use tokio::sync::{broadcast, mpsc, RwLock};

    fn init_gallery(home: &Path, name: &str) {
        registry::init_at(
            home,
            GalleryName::from(name),
            format!("https://example.net/{name}.json"),
            PathBuf::from("/srv").join(name),
            None,
            None,
        )
        .expect("init gallery");
    }

    fn empty_summary(target: &str) -> RefreshSummary {
        RefreshSummary {
            target: target.to_string(),
            source: "timer".to_string(),
            galleries: vec![],
            written: 0,
            unchanged: 0,
            errors: 0,
            duration_ms: 0,
        }
    }

    // ─── Scheduler tests ───────────────────────────────────────────────────────

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn gallery_loop_fires_immediately_then_on_interval() {
        let (tx, mut rx) = mpsc::channel::<RefreshJob>(8);
        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let every = Duration::from_secs(600);
        let handle = tokio::spawn(gallery_refresh_loop(
            "wall".to_string(),
            every,
            tx,
            shutdown_tx.subscribe(),
        ));

        let started = Instant::now();
        let first = rx.recv().await.expect("first job");
        assert_eq!(first.target.label(), "wall");
        assert_eq!(first.source, "timer");
        let first_at = Instant::now();
        let _ = first.respond_to.send(Ok(empty_summary("wall")));

        let second = rx.recv().await.expect("second job");
        let second_at = Instant::now();
        let _ = second.respond_to.send(Ok(empty_summary("wall")));

        assert!(
            first_at.duration_since(started) < Duration::from_secs(1),
            "start() must refresh immediately"
        );
        let gap = second_at.duration_since(first_at);
        assert!(
            gap >= Duration::from_secs(600) && gap < Duration::from_secs(601),
            "second refresh must come one interval later, got {gap:?}"
        );

        let _ = shutdown_tx.send(());
        handle.await.expect("join").expect("loop result");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn gallery_loop_exits_on_shutdown() {
        let (tx, mut rx) = mpsc::channel::<RefreshJob>(8);
        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let handle = tokio::spawn(gallery_refresh_loop(
            "wall".to_string(),
            Duration::from_secs(600),
            tx,
            shutdown_tx.subscribe(),
        ));

        // Answer the immediate first job, then request shutdown.
        let first = rx.recv().await.expect("first job");
        let _ = first.respond_to.send(Ok(empty_summary("wall")));
        let _ = shutdown_tx.send(());
        handle.await.expect("join").expect("loop result");
    }

    // ─── Cache tests ───────────────────────────────────────────────────────────

    #[test]
    fn gallery_cache_loads_registered_galleries() {
        let home = TempDir::new().expect("home");
        for name in ["wall", "lobby", "studio"] {
            init_gallery(home.path(), name);
        }

        let cache = load_gallery_cache(home.path()).expect("load cache");
        assert_eq!(cache.len(), 3, "cache should contain all registered galleries");
        assert!(cache.contains_key(&GalleryName::from("lobby")));
    }

    // ─── Protocol tests ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn socket_protocol_status_and_stop_over_in_memory_channels() {
        let (request_tx, mut request_rx) = mpsc::channel::<Vec<u8>>(8);
        let (response_tx, mut response_rx) = mpsc::channel::<Vec<u8>>(8);
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);

        tokio::spawn(async move {
            while let Some(bytes) = request_rx.recv().await {
                let line = String::from_utf8(bytes).expect("utf8");
                let request: DaemonRequest = serde_json::from_str(line.trim()).expect("request");
                let response = match request.cmd.as_str() {
                    "status" => DaemonResponse::ok(json!({"running": true})),
                    "stop" => {
                        let _ = shutdown_tx.send(());
                        DaemonResponse::ok(json!({"stopping": true}))
                    }
                    other => DaemonResponse::error(format!("unknown command '{other}'")),
                };
                let encoded = serde_json::to_vec(&response).expect("encode response");
                if response_tx.send(encoded).await.is_err() {
                    break;
                }
            }
        });

        request_tx
            .send(br#"{"cmd":"status"}"#.to_vec())
            .await
            .expect("send status request");
        let status_response = response_rx.recv().await.expect("status response");
        let status_json: serde_json::Value =
            serde_json::from_slice(&status_response).expect("decode status");
        assert_eq!(status_json["ok"], serde_json::Value::Bool(true));

        request_tx
            .send(br#"{"cmd":"stop"}"#.to_vec())
            .await
            .expect("send stop request");
        let stop_response = response_rx.recv().await.expect("stop response");
        let stop_json: serde_json::Value =
            serde_json::from_slice(&stop_response).expect("decode stop");
        assert_eq!(stop_json["ok"], serde_json::Value::Bool(true));

        shutdown_rx.recv().await.expect("shutdown signal");
    }

    // ─── Status payload tests ──────────────────────────────────────────────────

    #[tokio::test]
    async fn status_payload_has_last_refresh_at_unix_when_never_refreshed() {
        let home = TempDir::new().expect("home");
        let cache = std::sync::Arc::new(RwLock::new(GalleryCache::new()));
        let timestamps = std::sync::Arc::new(RwLock::new(RefreshTimestamps::new()));

        let payload = build_status_payload(home.path(), cache, timestamps, 1_000_000).await;

        assert_eq!(payload["running"], json!(true));
        assert_eq!(payload["started_at_unix"], json!(1_000_000u64));
        assert_eq!(
            payload["last_refresh_at_unix"],
            json!(0u64),
            "should be 0 before any refresh"
        );
        let galleries = payload["galleries"].as_array().expect("galleries array");
        assert!(galleries.is_empty(), "empty galleries when cache is empty");
    }

    #[tokio::test]
    async fn status_payload_includes_per_gallery_last_refresh_timestamps() {
        let home = TempDir::new().expect("home");
        for name in ["wall", "lobby"] {
            init_gallery(home.path(), name);
        }

        let cache = std::sync::Arc::new(RwLock::new(
            load_gallery_cache(home.path()).expect("load cache"),
        ));

        let ts_map: RefreshTimestamps = [
            ("wall".to_string(), 1_000_100u64),
            ("lobby".to_string(), 1_000_200u64),
        ]
        .into_iter()
        .collect();
        let timestamps = std::sync::Arc::new(RwLock::new(ts_map));

        let payload = build_status_payload(home.path(), cache, timestamps, 1_000_000).await;

        // Daemon-wide last refresh = max of the two.
        assert_eq!(
            payload["last_refresh_at_unix"],
            json!(1_000_200u64),
            "daemon-wide last_refresh should be the max gallery timestamp"
        );

        // Per-gallery objects must have name + last_refresh_at_unix.
        let galleries = payload["galleries"].as_array().expect("galleries array");
        assert_eq!(galleries.len(), 2, "two galleries expected");

        for entry in galleries {
            let name = entry["name"].as_str().expect("name field");
            let ts = entry["last_refresh_at_unix"].as_u64().expect("timestamp field");
            match name {
                "wall" => assert_eq!(ts, 1_000_100, "wall timestamp mismatch"),
                "lobby" => assert_eq!(ts, 1_000_200, "lobby timestamp mismatch"),
                other => panic!("unexpected gallery name: {other}"),
            }
        }
    }

    // ─── Summary tests ─────────────────────────────────────────────────────────

    #[test]
    fn refresh_summary_counts_writes_and_errors() {
        let reports = vec![
            RefreshReport {
                gallery_name: "wall".to_string(),
                status: SyncStatus::Loaded { count: 2, updated_at: None },
                writes: vec![
                    WriteResult::Written { path: PathBuf::from("/srv/wall/index.html") },
                    WriteResult::Unchanged { path: PathBuf::from("/srv/wall/styles.css") },
                ],
            },
            RefreshReport {
                gallery_name: "lobby".to_string(),
                status: SyncStatus::Error { message: "failed to fetch manifest (HTTP 500)".into() },
                writes: vec![],
            },
        ];

        let summary = build_refresh_summary(
            RefreshTarget::All,
            "socket",
            reports,
            Duration::from_millis(42),
        );
        assert_eq!(summary.target, "all");
        assert_eq!(summary.galleries, vec!["wall".to_string(), "lobby".to_string()]);
        assert_eq!(summary.written, 1);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.duration_ms, 42);
    }

    #[test]
    fn ensure_runtime_dirs_creates_layout() {
        let home = TempDir::new().expect("home");
        ensure_runtime_dirs(home.path()).expect("dirs");
        assert!(galleries_root(home.path()).exists());
        assert!(run_dir(home.path()).exists());
        assert!(logs_dir(home.path()).exists());
    }
}
