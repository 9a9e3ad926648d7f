//! HTTP GET issuers backed by one pooled `reqwest` client.
use crate::error::IssuerError;
use barrage::prelude::*;
use clap::ValueEnum;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use reqwest::{Client, StatusCode, Url};
use std::convert::Infallible;
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, trace, warn};

/// How a response status maps onto an [`Outcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusPolicy {
    /// `200` succeeds, `429`/`503` are overload signals, anything else fails.
    Strict,
    /// Any `2xx` or `3xx` succeeds.
    Lenient,
    /// Anything below `500` succeeds, so a `404` for data that has not been
    /// ingested yet still counts.
    ReadThrough,
}

impl StatusPolicy {
    pub fn classify(self, status: StatusCode) -> Outcome {
        let code = status.as_u16();
        match self {
            StatusPolicy::Strict => match code {
                200 => Outcome::Success,
                429 | 503 => Outcome::Throttled,
                _ => Outcome::Error,
            },
            StatusPolicy::Lenient => {
                if (200..400).contains(&code) {
                    Outcome::Success
                } else {
                    Outcome::Error
                }
            }
            StatusPolicy::ReadThrough => {
                if code < 500 {
                    Outcome::Success
                } else {
                    Outcome::Error
                }
            }
        }
    }
}

/// Which URL each request goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlSource {
    Fixed(String),
    /// `{prefix}{n}` with `n` drawn uniformly from `0..count` per request.
    Numbered { prefix: String, count: u32 },
}

impl UrlSource {
    fn pick(&self, rng: &mut impl Rng) -> String {
        match self {
            UrlSource::Fixed(url) => url.clone(),
            UrlSource::Numbered { prefix, count } => {
                format!("{prefix}{}", rng.gen_range(0..*count))
            }
        }
    }

    fn validate(&self) -> Result<(), IssuerError> {
        let sample = match self {
            UrlSource::Fixed(url) => url.clone(),
            UrlSource::Numbered { prefix, .. } => format!("{prefix}0"),
        };
        match Url::parse(&sample) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
            Ok(url) => Err(IssuerError::InvalidUrl {
                url: sample,
                reason: format!("unsupported scheme {:?}", url.scheme()),
            }),
            Err(err) => Err(IssuerError::InvalidUrl {
                url: sample,
                reason: err.to_string(),
            }),
        }
    }
}

/// Hands every worker a handle to the same connection pool.
#[derive(Debug)]
pub struct HttpFactory {
    client: Client,
    urls: UrlSource,
    policy: StatusPolicy,
}

impl HttpFactory {
    pub fn new(
        urls: UrlSource,
        policy: StatusPolicy,
        timeout: Option<Duration>,
        pool_size: usize,
    ) -> Result<Self, IssuerError> {
        if let UrlSource::Numbered { count: 0, prefix } = &urls {
            return Err(IssuerError::InvalidUrl {
                url: prefix.clone(),
                reason: "no ids to choose from".to_string(),
            });
        }
        urls.validate()?;

        let mut builder = Client::builder().pool_max_idle_per_host(pool_size);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            urls,
            policy,
        })
    }
}

impl IssuerFactory for HttpFactory {
    type Issuer = HttpIssuer;
    type Error = Infallible;

    async fn connect(&self, _worker: usize) -> Result<HttpIssuer, Infallible> {
        Ok(HttpIssuer {
            client: self.client.clone(),
            urls: self.urls.clone(),
            policy: self.policy,
            rng: SmallRng::from_entropy(),
        })
    }
}

pub struct HttpIssuer {
    client: Client,
    urls: UrlSource,
    policy: StatusPolicy,
    rng: SmallRng,
}

impl Issuer for HttpIssuer {
    async fn execute(&mut self, _ctx: &RequestContext) -> Outcome {
        let url = self.urls.pick(&mut self.rng);
        match self.client.get(&url).send().await {
            Ok(response) => {
                let status = response.status();
                // Drain the body so the connection returns to the pool.
                if let Err(err) = response.bytes().await {
                    trace!("Failed reading body from {url}: {err}");
                }
                self.policy.classify(status)
            }
            Err(err) => {
                trace!("Request to {url} failed: {err}");
                Outcome::Error
            }
        }
    }
}
