use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use elastickit_core::builders::{CardinalityAggregation, StatsAggregation, TermQuery};
use elastickit_core::{Canonicalizer, ClientConfig, Outcome, SearchSource, Source};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

mod telemetry;

#[derive(Parser, Debug)]
#[command(name = "elastickit")]
#[command(about = "elastickit CLI - endpoint and request body tools for search clusters")]
#[command(version)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write JSON logs to this directory
    #[arg(long, global = true, env = "ELASTICKIT_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug)]
struct EndpointArgs {
    /// Raw endpoints (URLs or host:port); replace the config file's urls
    urls: Vec<String>,

    /// JSON config file
    #[arg(short, long, env = "ELASTICKIT_CONFIG")]
    config: Option<PathBuf>,

    /// Scheme for endpoints resolved from host:port
    #[arg(long)]
    fallback_scheme: Option<String>,

    /// Timeout for each DNS lookup, in milliseconds
    #[arg(long)]
    dns_timeout_ms: Option<u64>,
}

impl EndpointArgs {
    fn into_config(self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ClientConfig::default(),
        };

        if !self.urls.is_empty() {
            config.urls = self.urls;
        }
        if let Some(scheme) = self.fallback_scheme {
            config.fallback_scheme = scheme;
        }
        if self.dns_timeout_ms.is_some() {
            config.dns_timeout_ms = self.dns_timeout_ms;
        }
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the canonical form of each usable endpoint
    Canonicalize {
        #[command(flatten)]
        endpoints: EndpointArgs,

        /// Print one JSON line per input, including dropped ones
        #[arg(long)]
        report: bool,
    },

    /// Print a search body for a term query
    SearchBody {
        /// Term to match, as FIELD=VALUE
        #[arg(long)]
        term: String,

        /// Add stats and cardinality aggregations over this field
        #[arg(long)]
        stats_field: Option<String>,

        /// Number of hits to return
        #[arg(long)]
        size: Option<usize>,
    },

    /// Query the root endpoint of the cluster
    Ping {
        #[command(flatten)]
        endpoints: EndpointArgs,
    },
}

/// One line of `canonicalize --report`
#[derive(Serialize)]
struct OutcomeRecord<'a> {
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dropped: Option<String>,
}

impl<'a> From<&'a Outcome> for OutcomeRecord<'a> {
    fn from(outcome: &'a Outcome) -> Self {
        match &outcome.result {
            Ok(endpoint) => Self {
                input: &outcome.input,
                endpoint: Some(endpoint.to_string()),
                dropped: None,
            },
            Err(reason) => Self {
                input: &outcome.input,
                endpoint: None,
                dropped: Some(reason.to_string()),
            },
        }
    }
}

/// Cancellation token that fires on Ctrl+C
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, dropping remaining endpoints");
            token.cancel();
        }
    });
    cancel
}

async fn canonicalize(endpoints: EndpointArgs, report: bool) -> Result<ExitCode> {
    let config = endpoints.into_config()?;
    let canonicalizer = Canonicalizer::new(config.canonicalize_options()?);

    let result = canonicalizer
        .report_async(&config.urls, &cancel_on_ctrl_c())
        .await;

    if report {
        for outcome in result.outcomes() {
            println!("{}", serde_json::to_string(&OutcomeRecord::from(outcome))?);
        }
    } else {
        for endpoint in result.canonical() {
            println!("{}", endpoint);
        }
    }

    if result.is_empty() {
        tracing::error!("No usable endpoints");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn search_body(term: &str, stats_field: Option<String>, size: Option<usize>) -> Result<serde_json::Value> {
    let (field, value) = term
        .split_once('=')
        .context("--term must look like FIELD=VALUE")?;

    let mut search = SearchSource::new().query(TermQuery::new(field, value));
    if let Some(size) = size {
        search = search.size(size);
    }
    if let Some(stats_field) = stats_field {
        search = search
            .aggregation(
                format!("{}_stats", stats_field),
                StatsAggregation::new().field(stats_field.as_str()),
            )
            .aggregation(
                format!("{}_cardinality", stats_field),
                CardinalityAggregation::new().field(stats_field.as_str()),
            );
    }
    Ok(search.source())
}

async fn ping(endpoints: EndpointArgs) -> Result<ExitCode> {
    let config = endpoints.into_config()?;
    let client = elastickit_rs::Client::connect(&config, &cancel_on_ctrl_c()).await?;

    let info = client.ping().await?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Keep the guard alive so file logs are flushed on exit
    let _guard = telemetry::init_telemetry(cli.log_dir.as_deref(), cli.verbose)?;

    match cli.command {
        Commands::Canonicalize { endpoints, report } => canonicalize(endpoints, report).await,
        Commands::SearchBody {
            term,
            stats_field,
            size,
        } => {
            let body = search_body(&term, stats_field, size)?;
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Ping { endpoints } => ping(endpoints).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elastickit_core::DropReason;
    use serde_json::json;

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "elastickit",
            "canonicalize",
            "es1:9200",
            "https://es2:9243/x",
            "--fallback-scheme",
            "https",
            "--dns-timeout-ms",
            "500",
        ]);
        let Commands::Canonicalize { endpoints, report } = cli.command else {
            panic!("expected canonicalize");
        };
        assert!(!report);

        let config = endpoints.into_config().unwrap();
        assert_eq!(config.urls, vec!["es1:9200", "https://es2:9243/x"]);
        assert_eq!(config.fallback_scheme, "https");
        assert_eq!(config.dns_timeout_ms, Some(500));
    }

    #[test]
    fn test_outcome_record() {
        let dropped = Outcome {
            input: "ftp://x".to_string(),
            result: Err(DropReason::UnsupportedScheme("ftp".to_string())),
        };
        assert_eq!(
            serde_json::to_value(OutcomeRecord::from(&dropped)).unwrap(),
            json!({"input": "ftp://x", "dropped": "unsupported scheme: ftp"})
        );
    }

    #[test]
    fn test_search_body() {
        let body = search_body("user=kimchy", Some("grade".to_string()), Some(5)).unwrap();
        assert_eq!(
            body,
            json!({
                "query": {"term": {"user": "kimchy"}},
                "size": 5,
                "aggregations": {
                    "grade_stats": {"stats": {"field": "grade"}},
                    "grade_cardinality": {"cardinality": {"field": "grade"}}
                }
            })
        );
        assert!(search_body("no-equals-sign", None, None).is_err());
    }
}
