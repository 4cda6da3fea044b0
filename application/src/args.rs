//! [`Args`] definitions.

use clap::{Parser, ValueEnum};
use derive_more::Display;

/// Backend of the task tracking system.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// [`Component`] to run.
    #[arg(value_enum)]
    pub component: Component,
}

impl Args {
    /// Parses command line arguments.
    ///
    /// # Errors
    ///
    /// Errors if failed to parse command line arguments.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}

/// Independently deployed component of the system.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, ValueEnum)]
pub enum Component {
    /// REST gateway composing calls to the other [`Component`]s.
    #[display("gateway")]
    Gateway,

    /// Identity service owning registered users.
    #[display("identity")]
    Identity,

    /// Authentication service issuing tokens.
    #[display("auth")]
    Auth,

    /// Task service owning tasks.
    #[display("task")]
    Task,
}

impl Component {
    /// Returns the port this [`Component`] listens on unless configured
    /// otherwise.
    #[must_use]
    pub fn default_port(self) -> u16 {
        match self {
            Self::Gateway => 8000,
            Self::Identity => 50051,
            Self::Auth => 50052,
            Self::Task => 50053,
        }
    }
}

#[cfg(test)]
mod spec {
    use clap::Parser as _;

    use super::{Args, Component};

    #[test]
    fn parses_component_and_config() {
        let args =
            Args::try_parse_from(["application", "-c", "prod.toml", "task"])
                .unwrap();

        assert_eq!(args.config, "prod.toml");
        assert_eq!(args.component, Component::Task);
    }

    #[test]
    fn defaults_config_path() {
        let args = Args::try_parse_from(["application", "gateway"]).unwrap();

        assert_eq!(args.config, "config.toml");
        assert_eq!(args.component.default_port(), 8000);
    }

    #[test]
    fn requires_component() {
        assert!(Args::try_parse_from(["application"]).is_err());
        assert!(Args::try_parse_from(["application", "billing"]).is_err());
    }
}
