//! Service settings, from command-line flags or the environment.

use clap::Parser;
use std::net::SocketAddr;

pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "slot_matcher",
    about = "Region clustering and preference-based slot assignment service",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct ServiceConfig {
    /// Address the HTTP server listens on.
    #[arg(
        short = 'a',
        long = "addr",
        env = "SLOT_MATCHER_ADDR",
        default_value = DEFAULT_ADDR
    )]
    pub bind_addr: SocketAddr,

    /// `env_logger` filter directives, e.g. `slot_matcher=debug`.
    #[arg(short, long, env = "SLOT_MATCHER_LOG", default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = ServiceConfig::try_parse_from([
            "slot_matcher",
            "--addr",
            "0.0.0.0:9000",
            "--log-filter",
            "warn",
        ])
        .unwrap();
        assert_eq!(config.bind_addr, SocketAddr::from(([0, 0, 0, 0], 9000)));
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn short_flags_are_accepted() {
        let config =
            ServiceConfig::try_parse_from(["slot_matcher", "-a", "127.0.0.1:7000", "-l", "debug"])
                .unwrap();
        assert_eq!(config.bind_addr.port(), 7000);
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn bad_address_is_rejected() {
        let err = ServiceConfig::try_parse_from(["slot_matcher", "--addr", "not-an-addr"]);
        assert!(err.is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        ServiceConfig::command().debug_assert();
    }
}
