use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::anyhow;
use dotenvy::dotenv;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use eventscope::config::Config;
use eventscope::error::PipelineError;
use eventscope::es_http::EsHttp;
use eventscope::es_search::EventSearch;
use eventscope::filter::SearchCriteria;
use eventscope::pipeline::Pipeline;

enum RunError {
    Setup(anyhow::Error),
    Pipeline(PipelineError),
}

impl From<anyhow::Error> for RunError {
    fn from(err: anyhow::Error) -> Self {
        Self::Setup(err)
    }
}

impl From<PipelineError> for RunError {
    fn from(err: PipelineError) -> Self {
        Self::Pipeline(err)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(RunError::Pipeline(err)) => {
            let failure = err.to_failure();
            let rendered = serde_json::to_string(&failure).unwrap_or_else(|_| err.to_string());
            eprintln!("{rendered}");
            ExitCode::FAILURE
        }
        Err(RunError::Setup(err)) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Vec<String>) -> Result<(), RunError> {
    let (cfg_path, rest) = split_config_arg(args)?;
    let cfg = Config::load(cfg_path)?;
    info!(es_url = %cfg.es_url, index = %cfg.es_index, "starting eventscope query");

    let http = EsHttp::new(
        cfg.es_url.clone(),
        cfg.es_user.clone(),
        cfg.es_pass.clone(),
        cfg.http_timeout(),
    )?;
    let search = EventSearch::new(
        http,
        cfg.es_index.clone(),
        cfg.search_size,
        cfg.api_search_size,
    );
    let pipeline = Pipeline::new(search, cfg.missing_key_policy);

    let mut rest = rest.into_iter();
    let command = rest.next().unwrap_or_else(|| "search".to_string());
    match command.as_str() {
        "search" => {
            let criteria = criteria_from_pairs(rest)?;
            print_json(&pipeline.search(&criteria).await?)
        }
        "list" => {
            let (start, end) = bounds_from_pairs(rest)?;
            print_json(&pipeline.list_window(start, end).await?)
        }
        "details" => {
            let id = rest
                .next()
                .ok_or_else(|| anyhow!("usage: eventscope details <correlationid>"))?;
            print_json(&pipeline.correlation_details(&id).await?)
        }
        "apis" => print_json(&pipeline.api_names().await?),
        "states" => print_json(&pipeline.states().await?),
        "chart" => {
            let api = rest
                .next()
                .ok_or_else(|| anyhow!("usage: eventscope chart <api_name>"))?;
            print_json(&pipeline.hourly_state_counts(&api).await?)
        }
        other => Err(RunError::Setup(anyhow!(
            "unknown command {other:?}; expected search, list, details, apis, states or chart"
        ))),
    }
}

fn split_config_arg(mut args: Vec<String>) -> Result<(Option<PathBuf>, Vec<String>), RunError> {
    if args.first().map(String::as_str) == Some("--config") {
        if args.len() < 2 {
            return Err(RunError::Setup(anyhow!("--config requires a path")));
        }
        let path = PathBuf::from(args.remove(1));
        args.remove(0);
        return Ok((Some(path), args));
    }
    Ok((None, args))
}

fn criteria_from_pairs(args: impl Iterator<Item = String>) -> Result<SearchCriteria, RunError> {
    let mut criteria = SearchCriteria::default();
    for pair in args {
        let (key, value) = split_pair(&pair)?;
        match key {
            "correlationid" => criteria.correlation_id = Some(value),
            "api_name" => criteria.api_name = Some(value),
            "state" => criteria.state = Some(value),
            "search_type" => criteria.search_type = Some(value),
            "search_value" => criteria.search_value = Some(value),
            "timestamp_filter" => criteria.timestamp_filter = Some(value),
            "custom_start_time" => criteria.custom_start_time = Some(value),
            "custom_end_time" => criteria.custom_end_time = Some(value),
            other => return Err(RunError::Setup(anyhow!("unknown search key {other:?}"))),
        }
    }
    Ok(criteria)
}

fn bounds_from_pairs(
    args: impl Iterator<Item = String>,
) -> Result<(Option<String>, Option<String>), RunError> {
    let mut start = None;
    let mut end = None;
    for pair in args {
        let (key, value) = split_pair(&pair)?;
        match key {
            "start" => start = Some(value),
            "end" => end = Some(value),
            other => return Err(RunError::Setup(anyhow!("unknown list key {other:?}"))),
        }
    }
    Ok((start, end))
}

fn split_pair(pair: &str) -> Result<(&str, String), RunError> {
    match pair.split_once('=') {
        Some((key, value)) => Ok((key, value.to_string())),
        None => Err(RunError::Setup(anyhow!(
            "expected key=value argument, got {pair:?}"
        ))),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), RunError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| RunError::Pipeline(PipelineError::Internal(err.to_string())))?;
    println!("{rendered}");
    Ok(())
}
