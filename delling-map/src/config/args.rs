use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use crate::config::Config;
use crate::config::env::{Env, MEDIA_ROOT_ENV, UPSTREAM_URL_ENV, USER_ENV};
use crate::srv::{KEEP_ALIVE_DEFAULT, LISTEN_ADDRESSES_DEFAULT, SrvConfig};

/// Parse a human-readable duration string (e.g., "1s", "500ms")
fn parse_duration(s: &str) -> Result<Duration, String> {
    humantime_serde::re::humantime::parse_duration(s).map_err(|e| e.to_string())
}

#[derive(Parser, Debug, PartialEq, Default)]
#[command(
    about = "Offline map tile server for MBTiles on removable media",
    version,
    after_help = "Use RUST_LOG environment variable to control logging level, e.g. RUST_LOG=debug or RUST_LOG=delling_map=debug.\nUse DELLING_LOG_FORMAT to choose the log format: json, compact, bare or pretty.\nAIS_URL, USB_MOUNT and USER are used when neither a flag nor the config file sets the corresponding value."
)]
pub struct Args {
    #[command(flatten)]
    pub meta: MetaArgs,
    #[command(flatten)]
    pub srv: SrvArgs,
    #[command(flatten)]
    pub sources: SourceArgs,
}

#[derive(clap::Args, Debug, PartialEq, Default)]
pub struct MetaArgs {
    /// Path to a YAML config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(clap::Args, Debug, PartialEq, Default)]
pub struct SrvArgs {
    #[arg(help = format!("Connection keep alive timeout. [DEFAULT: {KEEP_ALIVE_DEFAULT}]"), short, long)]
    pub keep_alive: Option<u64>,
    #[arg(help = format!("The socket address to bind. [DEFAULT: {LISTEN_ADDRESSES_DEFAULT}]"), short, long)]
    pub listen_addresses: Option<String>,
    /// Number of web server workers
    #[arg(short = 'W', long)]
    pub workers: Option<usize>,
    /// Directory with the map viewer's `index.html`
    #[arg(long)]
    pub web_root: Option<PathBuf>,
}

#[derive(clap::Args, Debug, PartialEq, Default)]
pub struct SourceArgs {
    /// Mount point of the removable media holding the `maps` directory. [DEFAULT: /media/usb]
    #[arg(long)]
    pub removable_media_root: Option<PathBuf>,
    /// User name for the per-user mount point. [DEFAULT: $USER]
    #[arg(long)]
    pub media_user: Option<String>,
    /// Base URL of the live-position service. [DEFAULT: http://127.0.0.1:8100]
    #[arg(long)]
    pub upstream_live_position_url: Option<String>,
    /// Live-position request timeout, at most 2s. [DEFAULT: 2s]
    #[arg(long, value_parser = parse_duration)]
    pub upstream_timeout: Option<Duration>,
}

impl SrvArgs {
    fn merge_into_config(self, srv_config: &mut SrvConfig) {
        if self.keep_alive.is_some() {
            srv_config.keep_alive = self.keep_alive;
        }
        if self.listen_addresses.is_some() {
            srv_config.listen_addresses = self.listen_addresses;
        }
        if self.workers.is_some() {
            srv_config.worker_processes = self.workers;
        }
        if self.web_root.is_some() {
            srv_config.web_root = self.web_root;
        }
    }
}

impl Args {
    /// Apply command line values over the config, then fill remaining gaps from the environment.
    pub fn merge_into_config<'a>(self, config: &mut Config, env: &impl Env<'a>) {
        self.srv.merge_into_config(&mut config.srv);

        let src = self.sources;
        if src.removable_media_root.is_some() {
            config.removable_media_root = src.removable_media_root;
        }
        if src.media_user.is_some() {
            config.media_user = src.media_user;
        }
        if src.upstream_live_position_url.is_some() {
            config.upstream_live_position_url = src.upstream_live_position_url;
        }
        if src.upstream_timeout.is_some() {
            config.upstream_timeout = src.upstream_timeout;
        }

        if config.removable_media_root.is_none() {
            config.removable_media_root = env.get_env_str(MEDIA_ROOT_ENV).map(PathBuf::from);
        } else if env.has_unused_var(MEDIA_ROOT_ENV) {
            info!("Environment variable {MEDIA_ROOT_ENV} is ignored because the media root is already configured");
        }
        if config.upstream_live_position_url.is_none() {
            config.upstream_live_position_url = env.get_env_str(UPSTREAM_URL_ENV);
        } else if env.has_unused_var(UPSTREAM_URL_ENV) {
            info!("Environment variable {UPSTREAM_URL_ENV} is ignored because the live-position URL is already configured");
        }
        if config.media_user.is_none() {
            config.media_user = env.get_env_str(USER_ENV).filter(|u| !u.is_empty());
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::env::FauxEnv;

    fn parse(args: &[&str]) -> Args {
        Args::parse_from(std::iter::once("delling-map").chain(args.iter().copied()))
    }

    #[test]
    fn cli_no_args() {
        assert_eq!(parse(&[]), Args::default());
    }

    #[test]
    fn cli_all_args() {
        let args = parse(&[
            "--config",
            "/etc/delling/map.yaml",
            "-l",
            "127.0.0.1:9000",
            "--keep-alive",
            "5",
            "-W",
            "2",
            "--web-root",
            "/opt/delling/ais-map",
            "--removable-media-root",
            "/mnt/usb",
            "--media-user",
            "pi",
            "--upstream-live-position-url",
            "http://127.0.0.1:8200",
            "--upstream-timeout",
            "750ms",
        ]);
        assert_eq!(args.meta.config, Some(PathBuf::from("/etc/delling/map.yaml")));
        assert_eq!(
            args.srv,
            SrvArgs {
                keep_alive: Some(5),
                listen_addresses: Some("127.0.0.1:9000".to_string()),
                workers: Some(2),
                web_root: Some(PathBuf::from("/opt/delling/ais-map")),
            }
        );
        assert_eq!(args.sources.upstream_timeout, Some(Duration::from_millis(750)));
    }

    #[test]
    fn env_fills_gaps() {
        let env = FauxEnv::with(&[
            (MEDIA_ROOT_ENV, "/media/stick"),
            (UPSTREAM_URL_ENV, "http://127.0.0.1:8101"),
            (USER_ENV, "pi"),
        ]);
        let mut config = Config::default();
        parse(&[]).merge_into_config(&mut config, &env);
        assert_eq!(config.removable_media_root, Some(PathBuf::from("/media/stick")));
        assert_eq!(
            config.upstream_live_position_url.as_deref(),
            Some("http://127.0.0.1:8101")
        );
        assert_eq!(config.media_user.as_deref(), Some("pi"));
    }

    #[test]
    fn cli_beats_config_beats_env() {
        let env = FauxEnv::with(&[
            (MEDIA_ROOT_ENV, "/media/env"),
            (UPSTREAM_URL_ENV, "http://127.0.0.1:1"),
            (USER_ENV, ""),
        ]);
        let mut config = Config {
            removable_media_root: Some(PathBuf::from("/media/file")),
            upstream_live_position_url: Some("http://127.0.0.1:2".to_string()),
            ..Config::default()
        };
        parse(&["--removable-media-root", "/media/cli"]).merge_into_config(&mut config, &env);
        assert_eq!(config.removable_media_root, Some(PathBuf::from("/media/cli")));
        assert_eq!(
            config.upstream_live_position_url.as_deref(),
            Some("http://127.0.0.1:2")
        );
        assert_eq!(config.media_user, None);
    }
}
