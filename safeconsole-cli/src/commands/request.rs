//! Request command - send metered calls through the shared client.

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request};
use safeconsole_store::UsageMeter;
use tracing::{debug, warn};

use crate::context::AppContext;
use crate::output::{JsonFormatter, RequestOutput, RequestReport, TextFormatter, UsageOutput};
use crate::{Cli, OutputFormat};

/// Arguments for the request command.
#[derive(Args)]
pub struct RequestArgs {
    /// URLs to call, absolute or relative to the configured base URL.
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// HTTP method.
    #[arg(long, short = 'X', default_value = "get")]
    pub method: HttpMethod,

    /// JSON body sent with every request.
    #[arg(long, short = 'd')]
    pub data: Option<String>,

    /// Skip the rate-limit sync before sending.
    #[arg(long)]
    pub no_sync: bool,
}

/// Methods the request command can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

/// Runs the request command.
pub async fn run(args: &RequestArgs, cli: &Cli) -> Result<()> {
    let body = args
        .data
        .as_deref()
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()
        .context("--data is not valid JSON")?
        .map(|value| serde_json::to_vec(&value))
        .transpose()?;

    let ctx = AppContext::build(cli).await?;
    if !args.no_sync {
        ctx.sync_usage().await;
    }

    let bearer = ctx.session.session().bearer();
    if bearer.is_none() {
        warn!("No active session, sending requests without credentials");
    }

    let guard = ctx.meter.mount(ctx.client.slot());
    let mut outputs = Vec::with_capacity(args.urls.len());
    for url in &args.urls {
        let method = Method::from(args.method);
        let output = send_one(&ctx, method, url, bearer.as_deref(), body.as_deref()).await;
        outputs.push(output);
    }
    UsageMeter::unmount(guard);

    let failed = outputs.iter().filter(|o| o.error.is_some()).count();
    let counters = ctx.meter.snapshot();
    let report = RequestReport {
        requests: outputs,
        usage: UsageOutput::from(&counters),
    };

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_requests(&report.requests));
            println!();
            println!("{}", formatter.format_usage(&counters));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&report)?);
        }
    }

    if failed > 0 {
        bail!("{failed} of {} requests failed", report.requests.len());
    }
    Ok(())
}

/// Sends one request and records what happened to it.
async fn send_one(
    ctx: &AppContext,
    method: Method,
    url: &str,
    bearer: Option<&str>,
    body: Option<&[u8]>,
) -> RequestOutput {
    let mut output = RequestOutput {
        method: method.to_string(),
        url: url.to_string(),
        status: None,
        counted_as: None,
        error: None,
    };

    let request = match build_request(ctx, method, url, bearer, body) {
        Ok(request) => request,
        Err(e) => {
            output.error = Some(format!("{e:#}"));
            return output;
        }
    };

    // Same decision the mounted meter makes for this request
    output.counted_as = ctx
        .meter
        .classifier()
        .classify(request.method().as_str(), request.url().as_str())
        .ok()
        .and_then(|class| class.module())
        .map(|module| module.display_name().to_string());

    match ctx.client.send(request).await {
        Ok(response) => {
            debug!(url = %url, status = %response.status(), "Request finished");
            output.status = Some(response.status().as_u16());
        }
        Err(e) => {
            warn!(url = %url, error = %e, "Request failed");
            output.error = Some(e.to_string());
        }
    }
    output
}

fn build_request(
    ctx: &AppContext,
    method: Method,
    url: &str,
    bearer: Option<&str>,
    body: Option<&[u8]>,
) -> Result<Request> {
    let mut request = ctx.client.request(method, url)?;
    if let Some(bearer) = bearer {
        let value = HeaderValue::from_str(bearer).context("stored token is not a valid header")?;
        request.headers_mut().insert(AUTHORIZATION, value);
    }
    if let Some(body) = body {
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        *request.body_mut() = Some(body.to_vec().into());
    }
    Ok(request)
}
