use snafu::{Location, Snafu};

use crate::config::ConfigError;
use crate::repl::ReplError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ApplicationError {
    /// could not load the configuration
    ConfigLoad {
        source: ConfigError,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not initialize the logger
    InitializeLogger {
        source: tracing_subscriber::util::TryInitError,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not build the HTTP client used to report watches
    HttpClient {
        source: reqwest::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// The interactive prompt failed
    Repl {
        source: ReplError,
        #[snafu(implicit)]
        location: Location,
    },
}
