use std::sync::Arc;

use dotenvy::dotenv;
use snafu::ResultExt;

use payup_watch::config::Config;
use payup_watch::error::{ApplicationError, ConfigLoadSnafu, HttpClientSnafu, ReplSnafu};
use payup_watch::logger;
use payup_watch::repl::{self, Repl};
use payup_watch::service::HttpReporter;

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    dotenv().ok();

    let config = Config::from_env().context(ConfigLoadSnafu)?;

    let _guard = logger::init(&config)?;

    let client = reqwest::Client::builder()
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .context(HttpClientSnafu)?;
    let reporter = Arc::new(HttpReporter::new(client, config.endpoint.clone()));

    let mut repl = Repl::new().context(ReplSnafu)?;
    repl::start(&mut repl, &config, reporter)
        .await
        .context(ReplSnafu)
}
