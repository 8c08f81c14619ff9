use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use reaper_aws::{resolve_region, AwsCredentials, Ec2Client, Route53Client};
use reaper_core::{
    ConsoleLogger, LogSettings, ReaperConfig, ReaperError, RecordReaper, TargetIdentity,
    DEFAULT_HOSTED_ZONE, DEFAULT_RECORD_TTL,
};
use tracing::{debug, info};

#[derive(Args, Debug)]
pub struct ReapCommand {
    /// Short or fully-qualified name of the host whose A record to remove
    pub hostname: String,

    /// DNS suffix of the hosted zone holding the record
    #[arg(
        long = "hosted-zone",
        visible_alias = "hostedZone",
        env = "REAPER_HOSTED_ZONE",
        default_value = DEFAULT_HOSTED_ZONE
    )]
    pub hosted_zone: String,

    /// Use this hosted zone id instead of resolving it from the suffix
    #[arg(long, env = "REAPER_ZONE_ID")]
    pub zone_id: Option<String>,

    /// Run every check but do not delete anything
    #[arg(long = "dryrun", visible_alias = "dry-run")]
    pub dry_run: bool,

    /// Print intermediate state
    #[arg(long)]
    pub verbose: bool,

    /// Dump every service response as JSON
    #[arg(long)]
    pub debug: bool,

    /// Colorize output by severity
    #[arg(long)]
    pub color: bool,

    /// TTL of the record being deleted
    #[arg(long, default_value_t = DEFAULT_RECORD_TTL)]
    pub ttl: u32,

    /// AWS region for EC2 (falls back to AWS_REGION, then AWS_DEFAULT_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Route 53 endpoint override
    #[arg(long, env = "REAPER_ROUTE53_ENDPOINT")]
    pub route53_endpoint: Option<String>,

    /// EC2 endpoint override
    #[arg(long, env = "REAPER_EC2_ENDPOINT")]
    pub ec2_endpoint: Option<String>,
}

impl ReapCommand {
    pub fn reaper_config(&self) -> Result<ReaperConfig, ReaperError> {
        ReaperConfig {
            hosted_zone: self.hosted_zone.clone(),
            zone_id: self.zone_id.clone(),
            dry_run: self.dry_run,
            record_ttl: self.ttl,
            log: LogSettings {
                verbose: self.verbose,
                debug: self.debug,
                color: self.color,
            },
        }
        .validated()
    }

    /// Run the reaper and return the process exit code
    pub fn execute(self) -> anyhow::Result<i32> {
        if self.color {
            colored::control::set_override(true);
        }

        let settings = LogSettings {
            verbose: self.verbose,
            debug: self.debug,
            color: self.color,
        };
        let logger = Arc::new(ConsoleLogger::stdout(settings));

        let prepared = self
            .reaper_config()
            .and_then(|config| {
                let target = TargetIdentity::new(&self.hostname, &config.hosted_zone)?;
                Ok((config, target))
            })
            .and_then(|(config, target)| {
                let credentials = AwsCredentials::from_env()?;
                Ok((config, target, credentials))
            });

        let (config, target, credentials) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                logger.error(err.to_string());
                return Ok(err.exit_code());
            }
        };

        let region = resolve_region(self.region.as_deref(), |name| std::env::var(name).ok());
        debug!(
            "Using access key {} in region {}",
            credentials.masked_access_key(),
            region
        );

        let directory = match &self.route53_endpoint {
            Some(endpoint) => Route53Client::with_endpoint(credentials.clone(), endpoint),
            None => Route53Client::new(credentials.clone()),
        }
        .context("Failed to create Route 53 client")?;

        let inventory = match &self.ec2_endpoint {
            Some(endpoint) => Ec2Client::with_endpoint(credentials, &region, endpoint),
            None => Ec2Client::new(credentials, &region),
        }
        .context("Failed to create EC2 client")?;

        let reaper = RecordReaper::new(
            Arc::new(directory),
            Arc::new(inventory),
            config,
            logger.clone(),
        );

        let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;

        match runtime.block_on(reaper.run(&target)) {
            Ok(outcome) => {
                info!(
                    "Finished {} in phase {}",
                    target.fqdn(),
                    outcome.final_phase()
                );
                Ok(outcome.exit_code())
            }
            Err(err) => {
                // the reaper already reported this one
                if !matches!(err, ReaperError::VerificationFailed { .. }) {
                    logger.error(err.to_string());
                }
                Ok(err.exit_code())
            }
        }
    }
}
