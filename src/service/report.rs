use std::future::Future;
use std::time::Duration;

use derive_new::new;
use snafu::{Location, ResultExt, Snafu};
use tracing::instrument;
use url::Url;

use crate::model::{ReportRequest, ReportResponse};

pub type Result<T, E = ReportError> = ::std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ReportError {
    #[snafu(display("could not reach the crediting endpoint `{endpoint}`: {source}"))]
    Transport {
        endpoint: Url,
        source: reqwest::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("crediting endpoint answered with a malformed body: {source}"))]
    Malformed {
        source: serde_json::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "crediting endpoint did not answer within {}",
        humantime::format_duration(*timeout)
    ))]
    TimedOut {
        timeout: Duration,
        #[snafu(implicit)]
        location: Location,
    },
}

/// Something that can deliver a watch report to the crediting endpoint.
pub trait Reporter: Send + Sync + 'static {
    fn report(
        &self, request: &ReportRequest,
    ) -> impl Future<Output = Result<ReportResponse>> + Send;
}

/// Posts watch reports as JSON.
///
/// The HTTP status code is not inspected. A `400` carrying a `{status, message}` body is a
/// rejection, not a transport error.
#[derive(Debug, Clone, new)]
pub struct HttpReporter {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpReporter {
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Reporter for HttpReporter {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn report(&self, request: &ReportRequest) -> Result<ReportResponse> {
        tracing::debug!("post watch report for video `{}`", request.video_id);

        let body = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .context(TransportSnafu {
                endpoint: self.endpoint.clone(),
            })?
            .bytes()
            .await
            .context(TransportSnafu {
                endpoint: self.endpoint.clone(),
            })?;

        serde_json::from_slice(&body).context(MalformedSnafu)
    }
}
