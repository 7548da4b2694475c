use clap::{ArgAction, Parser};
use ddns_core::{RunConfig, TimeoutConfig};
use tracing::Level;

/// Point a Cloudflare hostname's A/AAAA records at this host
#[derive(Parser, Debug)]
#[command(name = "ddns-update", version, about)]
pub struct Args {
    #[arg(long, env = "CLOUDFLARE_ZONE_ID", default_value = "", help = "zone holding the records")]
    pub zone_id: String,

    #[arg(
        long,
        env = "CLOUDFLARE_API_TOKEN",
        default_value = "",
        hide_env_values = true,
        help = "API token with DNS edit permission on the zone"
    )]
    pub api_token: String,

    #[arg(long, env = "CLOUDFLARE_HOSTNAME", default_value = "", help = "record name to update")]
    pub hostname: String,

    #[arg(
        long,
        env = "IP_ADDRESS",
        help = "publish this address instead of detecting one (an IPv6 address disables AAAA handling)"
    )]
    pub ip: Option<String>,

    #[arg(
        long,
        env = "DDNS_IPV6",
        default_value_t = true,
        action = ArgAction::Set,
        help = "also manage the AAAA record"
    )]
    pub ipv6: bool,

    #[arg(long, env = "DDNS_DRY_RUN", help = "read records but do not change them")]
    pub dry_run: bool,

    #[arg(
        long = "timeout",
        env = "DDNS_RUN_TIMEOUT",
        default_value_t = 30,
        help = "bound for the whole run, in seconds"
    )]
    pub timeout_secs: u64,

    #[arg(
        long = "ipv4-source",
        env = "DDNS_IPV4_SOURCES",
        value_delimiter = ',',
        help = "IPv4 echo service URLs, asked in order (replaces the defaults)"
    )]
    pub ipv4_sources: Vec<String>,

    #[arg(
        long = "ipv6-source",
        env = "DDNS_IPV6_SOURCES",
        value_delimiter = ',',
        help = "IPv6 echo service URLs, asked in order before local interfaces (replaces the defaults)"
    )]
    pub ipv6_sources: Vec<String>,

    #[arg(
        long,
        env = "DDNS_LOG_LEVEL",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"],
        ignore_case = true
    )]
    pub log_level: String,
}

impl Args {
    pub fn run_config(&self) -> RunConfig {
        let config = RunConfig::new(&self.zone_id, &self.api_token, &self.hostname)
            .with_ipv6(self.ipv6);
        match &self.ip {
            Some(ip) => config.with_explicit_ip(ip),
            None => config,
        }
    }

    pub fn timeouts(&self) -> TimeoutConfig {
        TimeoutConfig {
            run_timeout_secs: self.timeout_secs,
            ..TimeoutConfig::default()
        }
    }

    pub fn log_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}
