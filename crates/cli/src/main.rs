//! Hostkeeper CLI - on-demand host maintenance jobs
//! (backups, archive retention, log rotation, health sampling)

mod logging;
mod output;
mod settings;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};

use hostkeeper_core::application::{ArchiveJob, JobContext, MetricSampler, RetentionJob, RotationJob};
use hostkeeper_core::domain::MaintenanceReport;
use hostkeeper_core::VERSION;
use hostkeeper_infra_fs::{LocalFileStore, TarGzCompressor, WalkDirEnumerator};
use hostkeeper_infra_system::{NvidiaSmiProbe, SystemProbeImpl};

use output::FailOn;
use settings::Settings;

#[derive(Parser)]
#[command(name = "hostkeeper")]
#[command(about = "Host maintenance jobs: backups, retention, log rotation, health", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (TOML/YAML/JSON), layered over the default config file
    #[arg(long, global = true, env = "HOSTKEEPER_CONFIG")]
    config: Option<PathBuf>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Append every report to this file as JSON lines
    #[arg(long, global = true)]
    report_file: Option<PathBuf>,

    /// Exit with code 2 when any report reaches this status
    #[arg(long, global = true, value_enum)]
    fail_on: Option<FailOn>,
}

#[derive(Args)]
struct ArchiveArgs {
    /// Directory to archive
    #[arg(long)]
    source: Option<String>,

    /// Directory receiving `<prefix>-<timestamp>.tar.gz`
    #[arg(long)]
    backup_dir: Option<String>,

    /// Explicit archive path (overrides --backup-dir naming)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip paths containing this substring (repeatable, adds to config)
    #[arg(short, long)]
    exclude: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a compressed archive of the source directory
    Archive(ArchiveArgs),

    /// Delete archives older than the retention period
    Prune {
        #[arg(long)]
        backup_dir: Option<String>,

        /// Keep archives modified within this many days
        #[arg(long)]
        keep_days: Option<u32>,
    },

    /// Archive, then prune the backup directory (two reports)
    Backup {
        #[command(flatten)]
        archive: ArchiveArgs,

        #[arg(long)]
        keep_days: Option<u32>,
    },

    /// Compress large logs and delete old compressed logs
    Rotate {
        #[arg(long)]
        log_dir: Option<String>,

        /// Delete `.log.gz` files older than this many days
        #[arg(long)]
        max_age_days: Option<u32>,

        /// Compress `.log` files larger than this many MB
        #[arg(long)]
        max_size_mb: Option<u64>,
    },

    /// Sample CPU/RAM/disk usage against alert thresholds
    Health {
        #[arg(long)]
        cpu: Option<f32>,

        #[arg(long)]
        ram: Option<f32>,

        #[arg(long)]
        disk: Option<f32>,

        /// Skip the GPU query
        #[arg(long)]
        no_gpu: bool,
    },
}

/// Adapters shared by all jobs
struct Jobs {
    context: JobContext,
    enumerator: Arc<WalkDirEnumerator>,
    store: Arc<LocalFileStore>,
    compressor: Arc<TarGzCompressor>,
}

impl Jobs {
    fn new() -> Self {
        Self {
            context: JobContext::system(),
            enumerator: Arc::new(WalkDirEnumerator::new()),
            store: Arc::new(LocalFileStore::new()),
            compressor: Arc::new(TarGzCompressor::new()),
        }
    }

    async fn archive(&self, settings: &Settings, output: Option<PathBuf>) -> MaintenanceReport {
        let config = settings.archive_config(self.context.now_utc(), output);
        debug!(source = %config.source_dir.display(), destination = %config.destination.display(), "Archive config");

        ArchiveJob::new(
            self.enumerator.clone(),
            self.compressor.clone(),
            self.context.clone(),
        )
        .run(&config)
        .await
    }

    async fn prune(&self, settings: &Settings) -> MaintenanceReport {
        RetentionJob::new(
            self.enumerator.clone(),
            self.store.clone(),
            self.context.clone(),
        )
        .run(&settings.retention_config())
        .await
    }

    async fn rotate(&self, settings: &Settings) -> MaintenanceReport {
        RotationJob::new(
            self.enumerator.clone(),
            self.store.clone(),
            self.compressor.clone(),
            self.context.clone(),
        )
        .run(&settings.rotation_config())
        .await
    }

    async fn health(&self, settings: &Settings) -> MaintenanceReport {
        let mut sampler = MetricSampler::new(Arc::new(SystemProbeImpl::new()), self.context.clone());
        if settings.metrics.gpu {
            sampler = sampler.with_gpu(Arc::new(NvidiaSmiProbe::new()));
        }
        sampler.run(&settings.thresholds()).await
    }
}

fn apply_archive_args(settings: &mut Settings, args: &ArchiveArgs) {
    if let Some(source) = &args.source {
        settings.backup.source_dir = source.clone();
    }
    if let Some(dir) = &args.backup_dir {
        settings.backup.backup_dir = dir.clone();
    }
    settings
        .backup
        .exclude_patterns
        .extend(args.exclude.iter().cloned());
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let _log_guard = logging::init()?;
    debug!("Hostkeeper v{}", VERSION);

    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let jobs = Jobs::new();
    let mut reports = Vec::new();

    match cli.command {
        Commands::Archive(args) => {
            apply_archive_args(&mut settings, &args);
            reports.push(jobs.archive(&settings, args.output).await);
        }

        Commands::Prune {
            backup_dir,
            keep_days,
        } => {
            if let Some(dir) = backup_dir {
                settings.backup.backup_dir = dir;
            }
            if let Some(days) = keep_days {
                settings.backup.keep_days = days;
            }
            reports.push(jobs.prune(&settings).await);
        }

        Commands::Backup { archive, keep_days } => {
            apply_archive_args(&mut settings, &archive);
            if let Some(days) = keep_days {
                settings.backup.keep_days = days;
            }
            reports.push(jobs.archive(&settings, archive.output).await);
            reports.push(jobs.prune(&settings).await);
        }

        Commands::Rotate {
            log_dir,
            max_age_days,
            max_size_mb,
        } => {
            if let Some(dir) = log_dir {
                settings.rotation.log_dir = dir;
            }
            if let Some(days) = max_age_days {
                settings.rotation.max_age_days = days;
            }
            if let Some(mb) = max_size_mb {
                settings.rotation.max_size_mb = mb;
            }
            reports.push(jobs.rotate(&settings).await);
        }

        Commands::Health {
            cpu,
            ram,
            disk,
            no_gpu,
        } => {
            if let Some(cpu) = cpu {
                settings.metrics.alert_cpu_threshold = cpu;
            }
            if let Some(ram) = ram {
                settings.metrics.alert_ram_threshold = ram;
            }
            if let Some(disk) = disk {
                settings.metrics.alert_disk_threshold = disk;
            }
            if no_gpu {
                settings.metrics.gpu = false;
            }
            reports.push(jobs.health(&settings).await);
        }
    }

    for report in &reports {
        output::render(report, cli.json)?;
    }

    if let Some(path) = &cli.report_file {
        output::append_report_file(path, &reports)?;
        info!(path = %path.display(), count = reports.len(), "Reports appended");
    }

    Ok(ExitCode::from(output::exit_code(&reports, cli.fail_on)))
}
