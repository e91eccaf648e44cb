use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use boundwait_core::impls::{ReachabilityFlag, SpawnedClient, TokioTimer};
use boundwait_core::ports::{AsyncRemoteClient, ChannelObserver, RemoteClient};
use boundwait_core::{BoundedTask, QueueConfig, RemoteError, Status, TaskConfig, WorkQueue};

#[derive(Parser)]
#[command(name = "boundwait")]
#[command(about = "Push records through bounded-wait tasks against a simulated remote API")]
struct Cli {
    /// Number of records to send
    #[arg(long, default_value_t = 5)]
    tasks: u32,

    /// Tasks allowed in flight at once (1 = sequential)
    #[arg(long)]
    width: Option<usize>,

    /// Per-task deadline in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Mean simulated call latency in milliseconds
    #[arg(long, default_value_t = 300)]
    latency_ms: u64,

    /// Probability in [0, 1] that a simulated call fails
    #[arg(long, default_value_t = 0.2)]
    failure_rate: f64,

    /// Report the remote as unreachable
    #[arg(long)]
    offline: bool,

    /// Cancel everything after this many milliseconds
    #[arg(long)]
    cancel_after_ms: Option<u64>,

    /// JSON file with `task` and `queue` sections
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    task: TaskConfig,
    queue: QueueConfig,
}

#[derive(Debug, Clone, Serialize)]
struct Record {
    id: u32,
}

/// Sleeps around `latency` and fails with `failure_rate` probability.
struct SimulatedApi {
    latency: Duration,
    failure_rate: f64,
}

#[async_trait]
impl AsyncRemoteClient<Record> for SimulatedApi {
    async fn call(&self, record: Record) -> Result<(), RemoteError> {
        let (delay, fail) = {
            let mut rng = rand::thread_rng();
            let jitter = rng.gen_range(0.5..1.5);
            (self.latency.mul_f64(jitter), rng.gen_bool(self.failure_rate))
        };
        tokio::time::sleep(delay).await;
        if fail {
            return Err(RemoteError::new(format!("record {} rejected", record.id)));
        }
        Ok(())
    }
}

/// `RUST_LOG` when set and valid, `info` otherwise.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_tracing() {
    let env_filter = env_filter();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn load_config(cli: &Cli) -> Result<(TaskConfig, QueueConfig)> {
    let mut file = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<FileConfig>(&raw)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => FileConfig::default(),
    };

    if let Some(ms) = cli.timeout_ms {
        file.task.timeout = Duration::from_millis(ms);
    }
    if let Some(width) = cli.width {
        file.queue.width = width;
    }
    file.task.validate()?;
    Ok((file.task, file.queue))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    anyhow::ensure!(
        (0.0..=1.0).contains(&cli.failure_rate),
        "--failure-rate must be within [0, 1]"
    );
    let (task_config, queue_config) = load_config(&cli)?;

    let handle = tokio::runtime::Handle::current();
    let client: Arc<dyn RemoteClient<Record>> = Arc::new(SpawnedClient::new(
        Arc::new(SimulatedApi {
            latency: Duration::from_millis(cli.latency_ms),
            failure_rate: cli.failure_rate,
        }),
        handle.clone(),
    ));
    let reachability = Arc::new(ReachabilityFlag::new(!cli.offline));
    let timer = Arc::new(TokioTimer::new(handle.clone()));
    let queue = WorkQueue::new(queue_config, &handle)?;
    let (observer, mut results) = ChannelObserver::channel();

    let timeout_ms = task_config.timeout.as_millis() as u64;
    tracing::info!(
        tasks = cli.tasks,
        width = queue.width(),
        timeout_ms,
        "submitting records"
    );
    for id in 0..cli.tasks {
        let task = BoundedTask::builder()
            .payload(Record { id })
            .observer(observer.clone())
            .client(Arc::clone(&client))
            .connectivity(reachability.clone())
            .timer(timer.clone())
            .config(task_config.clone())
            .build()?;
        queue.submit_task(task)?;
    }
    drop(observer);

    if let Some(ms) = cli.cancel_after_ms {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        queue.cancel_all();
    }

    let mut succeeded = 0;
    let mut failed = 0;
    while let Some(completion) = results.recv().await {
        match completion.status {
            Status::Success => succeeded += 1,
            _ => failed += 1,
        }
        println!("{}", serde_json::to_string(&completion)?);
    }

    queue.shutdown_and_join().await;
    println!("succeeded={succeeded} failed={failed}");
    Ok(())
}
