//! autoscale-dns binary entry point.
//!
//! Reads one raw event document (from a file or stdin), normalizes it, and
//! runs one reconciliation per notification. The invoking environment owns
//! delivery and redelivery; the exit code reports whether every
//! notification in the event reconciled successfully.

use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use tracing::{error, info};

use autoscale_dns::metrics::{self, NotificationResult};
use autoscale_dns::reconcile::effective_region;
use autoscale_dns::{
    event, telemetry, AwsFleetDirectory, Config, Reconciler, Route53Store,
};

/// Reconciles role-based DNS records against autoscaling group membership.
#[derive(Parser, Debug)]
#[command(name = "autoscale-dns")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML).
    #[arg(short, long, default_value = "autoscale-dns.toml")]
    config: PathBuf,

    /// Path to the raw event JSON document; "-" reads stdin.
    #[arg(short, long, default_value = "-")]
    event: PathBuf,
}

fn read_event(path: &PathBuf) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        Ok(raw)
    } else {
        std::fs::read_to_string(path)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration
    let config: Config = config::Config::builder()
        .add_source(config::File::from(args.config.clone()))
        .add_source(
            config::Environment::with_prefix("AUTOSCALE_DNS")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    // Initialize telemetry
    telemetry::init(&config.telemetry).map_err(|e| e as Box<dyn std::error::Error>)?;

    info!(
        config_file = %args.config.display(),
        default_region = %config.reconciler.default_region,
        ttl = config.reconciler.ttl,
        "Starting autoscale-dns"
    );

    let raw = read_event(&args.event)?;
    let notifications = event::normalize(&raw, &config.reconciler.default_region)?;
    if notifications.is_empty() {
        info!("event contained no actionable notifications");
        return Ok(());
    }

    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let dns = Route53Store::new(&sdk_config);

    // Each notification gets its own pipeline run; one failure never stops
    // the siblings.
    let mut failed = 0usize;
    for notification in &notifications {
        let region = effective_region(&config.reconciler.policy, notification);
        let directory = AwsFleetDirectory::new(&sdk_config, region);
        let reconciler = Reconciler::new(directory, dns.clone(), config.reconciler.clone());

        match reconciler.handle(notification).await {
            Ok(outcome) => {
                metrics::record_notification(
                    notification.kind.as_str(),
                    NotificationResult::Reconciled,
                );
                info!(
                    group = %notification.group_name,
                    upserts = outcome.upserts,
                    deletes = outcome.deletes,
                    "DNS has been updated for an autoscaling event"
                );
            }
            Err(e) => {
                metrics::record_notification(
                    notification.kind.as_str(),
                    NotificationResult::Failed,
                );
                error!(group = %notification.group_name, "Unable to update DNS for an autoscaling event: {e}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(format!(
            "{failed} of {} notifications failed to reconcile",
            notifications.len()
        )
        .into());
    }

    info!("autoscale-dns finished");
    Ok(())
}
