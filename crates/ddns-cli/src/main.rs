// # ddns-update - one-shot DDNS updater
//
// This binary is a THIN integration layer: all decisions live in ddns-core.
//
// It is responsible for:
// 1. Reading configuration from flags and environment variables
// 2. Initializing logging and the runtime
// 3. Wiring the address sources and the Cloudflare provider
// 4. Running one reconciliation and reporting its outcome
//
// ## Output
//
// stdout carries exactly one token (`good`, `nochg` or `badauth`), followed
// on failure by `Error: <cause>`. Logs go to stderr.
//
// ## Example
//
// ```bash
// export CLOUDFLARE_ZONE_ID=your_zone_id
// export CLOUDFLARE_API_TOKEN=your_token
// export CLOUDFLARE_HOSTNAME=home.example.com
//
// ddns-update            # detect and publish
// ddns-update --ip 203.0.113.7 --ipv6 false
// ```

mod args;

use anyhow::Context;
use args::Args;
use clap::Parser;
use ddns_core::{AddressFamily, Deadline, Detector, Error, IpSource, Outcome, Reconciler, Status};
use ddns_ip_local::InterfaceIpSource;
use ddns_provider_cloudflare::CloudflareProvider;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for the possible endings of a run
///
/// - 0: Records are current (`good` or `nochg`)
/// - 1: Configuration error (bad flags, missing credentials)
/// - 2: Runtime failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    Ok = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl DdnsExitCode {
    fn of(result: &ddns_core::Result<Outcome>) -> Self {
        match result {
            Err(Error::MissingCredentials(_) | Error::Config(_)) => DdnsExitCode::ConfigError,
            _ if Status::of(result).is_fatal() => DdnsExitCode::RuntimeError,
            _ => DdnsExitCode::Ok,
        }
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                DdnsExitCode::ConfigError.into()
            } else {
                DdnsExitCode::Ok.into()
            };
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let rt = match build_runtime() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("{:#}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(run(&args));
    report(&result);
    DdnsExitCode::of(&result).into()
}

fn build_runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")
}

/// Wire the components and run one reconciliation
async fn run(args: &Args) -> ddns_core::Result<Outcome> {
    let config = args.run_config();
    config.validate()?;

    let timeouts = args.timeouts();
    let provider = CloudflareProvider::new(&config.api_token, &config.zone_id, args.dry_run)?;
    let reconciler =
        Reconciler::new(build_detector(args), Box::new(provider)).with_timeouts(timeouts.clone())?;

    let token = CancellationToken::new();
    let deadline = Deadline::with_token(timeouts.run_timeout(), token.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling the run");
            token.cancel();
        }
    });

    info!(
        "Updating {} via {}{}",
        config.hostname,
        reconciler.provider_name(),
        if args.dry_run { " [DRY-RUN]" } else { "" }
    );
    reconciler.reconcile_until(&config, &deadline).await
}

/// Echo services per family, with local interfaces as the last IPv6 resort
fn build_detector(args: &Args) -> Detector {
    Detector::new(sources_for(AddressFamily::V4, &args.ipv4_sources), ipv6_sources(args))
}

fn ipv6_sources(args: &Args) -> Vec<Box<dyn IpSource>> {
    let mut sources = sources_for(AddressFamily::V6, &args.ipv6_sources);
    sources.push(Box::new(InterfaceIpSource::new()));
    sources
}

fn sources_for(family: AddressFamily, urls: &[String]) -> Vec<Box<dyn IpSource>> {
    if urls.is_empty() {
        ddns_ip_http::default_sources(family)
    } else {
        ddns_ip_http::sources_from_urls(urls)
    }
}

fn report(result: &ddns_core::Result<Outcome>) {
    let status = Status::of(result);
    println!("{}", status.token());

    if let Err(e) = result {
        error!("Run failed ({:?}): {}", status, e);
        println!("Error: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_the_outcome() {
        assert_eq!(DdnsExitCode::of(&Ok(Outcome::NoChange)), DdnsExitCode::Ok);
        assert_eq!(DdnsExitCode::of(&Ok(Outcome::Success)), DdnsExitCode::Ok);
        assert_eq!(
            DdnsExitCode::of(&Err(Error::missing_credentials("zone id"))),
            DdnsExitCode::ConfigError
        );
        assert_eq!(
            DdnsExitCode::of(&Err(Error::detection_failed(AddressFamily::V4, "offline"))),
            DdnsExitCode::RuntimeError
        );
        assert_eq!(
            DdnsExitCode::of(&Err(Error::invalid_address("192.168.001.1"))),
            DdnsExitCode::RuntimeError
        );
        assert_eq!(
            DdnsExitCode::of(&Err(Error::cancelled("record lookup"))),
            DdnsExitCode::RuntimeError
        );
    }

    #[test]
    fn local_interfaces_are_the_last_ipv6_source() {
        let args = Args::try_parse_from(["ddns-update", "--ipv6-source", "https://v6.example"])
            .unwrap();
        let names: Vec<String> = ipv6_sources(&args)
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(names, vec!["https://v6.example", "local-interfaces"]);

        let args = Args::try_parse_from(["ddns-update"]).unwrap();
        assert_eq!(ipv6_sources(&args).len(), 4);
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_any_network_call() {
        let args = Args::try_parse_from(["ddns-update", "--hostname", "home.example.com"]).unwrap();
        let result = run(&args).await;
        assert!(matches!(result, Err(Error::MissingCredentials(_))));
        assert_eq!(DdnsExitCode::of(&result), DdnsExitCode::ConfigError);
    }
}
