use std::io::Read;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use kube::CustomResourceExt;
use tracing::{error, info};
use zkop_apply::{ReconcileReport, StageOutcome};
use zkop_core::ZookeeperCluster;

#[derive(Parser, Debug)]
#[command(name = "zkopctl", version, about = "ZooKeeper ensemble operator CLI")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    /// Kubernetes namespace (overrides the document's namespace)
    #[arg(long = "ns", global = true, env = "ZKOP_NAMESPACE")]
    namespace: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json, Yaml }

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the objects a ZookeeperCluster expands to, without touching the cluster
    Render {
        /// ZookeeperCluster YAML file ("-" for stdin)
        #[arg(short = 'f', long = "file")]
        file: String,
    },
    /// Create any missing objects for a ZookeeperCluster
    Reconcile {
        /// ZookeeperCluster YAML file ("-" for stdin)
        #[arg(short = 'f', long = "file", conflicts_with = "name")]
        file: Option<String>,
        /// Name of a ZookeeperCluster already stored in the API server
        #[arg(long = "name")]
        name: Option<String>,
        /// Server-side dry run; nothing is persisted
        #[arg(long = "dry-run", action = ArgAction::SetTrue)]
        dry_run: bool,
    },
    /// Print the ZookeeperCluster CustomResourceDefinition
    Crd,
}

fn init_tracing() {
    let env = std::env::var("ZKOP_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("ZKOP_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid ZKOP_METRICS_ADDR; expected host:port");
        }
    }
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).context("reading stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path))
}

fn load_cluster(path: &str, ns: Option<&str>) -> Result<ZookeeperCluster> {
    zkop_apply::parse_cluster_yaml(&read_input(path)?, ns)
}

fn print_report(report: &ReconcileReport, output: Output) -> Result<()> {
    match output {
        Output::Human => {
            println!("STAGE                   OBJECT                          RESULT");
            for s in &report.stages {
                let result = match s.outcome {
                    StageOutcome::Created => "created",
                    StageOutcome::AlreadyExists => "unchanged (exists)",
                };
                println!("{:<23} {:<31} {}", s.stage.as_str(), format!("{}/{}", s.kind, s.name), result);
            }
        }
        Output::Json => println!("{}", serde_json::to_string_pretty(report)?),
        Output::Yaml => print!("{}", serde_yaml::to_string(report)?),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();
    let ns = cli.namespace.as_deref();

    match cli.command {
        Commands::Render { file } => {
            let zk = load_cluster(&file, ns)?;
            info!(cluster = ?zk.metadata.name, ns = ?zk.metadata.namespace, "render invoked");
            let set = zkop_synth::synthesize(&zk);
            match cli.output {
                Output::Human | Output::Yaml => {
                    for res in set.into_ordered() {
                        println!("---");
                        print!("{}", serde_yaml::to_string(&res)?);
                    }
                }
                Output::Json => println!("{}", serde_json::to_string_pretty(&set)?),
            }
        }
        Commands::Reconcile { file, name, dry_run } => {
            let zk = match (file, name) {
                (Some(file), _) => load_cluster(&file, ns)?,
                (None, Some(name)) => {
                    let client = zkop_kubehub::get_kube_client().await?;
                    zkop_kubehub::fetch_cluster(client, ns.unwrap_or("default"), &name).await?
                }
                (None, None) => return Err(anyhow!("either --file or --name is required")),
            };
            info!(cluster = ?zk.metadata.name, ns = ?zk.metadata.namespace, dry_run, "reconcile invoked");
            match zkop_apply::reconcile_live(&zk, dry_run).await {
                Ok(report) => print_report(&report, cli.output)?,
                Err(e) => {
                    error!(error = ?e, "reconcile failed");
                    return Err(e);
                }
            }
        }
        Commands::Crd => {
            let crd = ZookeeperCluster::crd();
            match cli.output {
                Output::Json => println!("{}", serde_json::to_string_pretty(&crd)?),
                Output::Human | Output::Yaml => print!("{}", serde_yaml::to_string(&crd)?),
            }
        }
    }
    Ok(())
}
