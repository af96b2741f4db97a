use dotenvy::dotenv;
use metrics_exporter_prometheus::PrometheusBuilder;
use quizhub_loadgen::api::HttpQuizApi;
use quizhub_loadgen::config::{Command, Config};
use quizhub_loadgen::fixtures::load_templates;
use quizhub_loadgen::harness::Harness;
use quizhub_loadgen::runner::{self, Summary};
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};


#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
dotenv().ok();
let cfg = <Config as clap::Parser>::parse();


// logs
let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
fmt().with_env_filter(filter).init();


if let Err(e) = cfg.validate() {
tracing::error!("{e:#}");
return ExitCode::FAILURE;
}


if let Some(addr) = cfg.prometheus_addr {
match PrometheusBuilder::new().with_http_listener(addr).install() {
Ok(()) => tracing::info!(%addr, "prometheus exporter listening"),
Err(e) => tracing::warn!(%addr, error = %e, "prometheus exporter not started"),
}
}


// templates are only needed for seeding, but a broken file should fail before any traffic
let templates = match &cfg.command {
Command::Seed(_) => match load_templates(cfg.templates.as_deref()) {
Ok(t) => t,
Err(e) => { tracing::error!("{e:#}"); return ExitCode::FAILURE; }
},
_ => Vec::new(),
};


let api = match HttpQuizApi::new(&cfg.gateway_url, cfg.request_timeout()) {
Ok(api) => api,
Err(e) => { tracing::error!("{e:#}"); return ExitCode::FAILURE; }
};
let harness = Harness::new(api, cfg.settings());
tracing::info!(gateway = %cfg.gateway_url, workers = cfg.concurrency, "starting");


let outcome = tokio::select! {
res = runner::run(&harness, &cfg.command, &templates) => Some(res),
_ = runner::wait_for_interrupt(tokio::signal::ctrl_c()) => None,
};


let report = harness.metrics().report();
println!("\n{report}");


match outcome {
Some(Ok(summary)) => {
if cfg.json_report { print_json(&report, Some(&summary)); }
ExitCode::SUCCESS
}
Some(Err(e)) => {
tracing::error!("{e:#}");
if cfg.json_report { print_json(&report, None); }
ExitCode::FAILURE
}
None => {
tracing::warn!("interrupted, report above is partial");
if cfg.json_report { print_json(&report, None); }
ExitCode::from(130)
}
}
}


fn print_json(report: &quizhub_loadgen::metrics::Report, summary: Option<&Summary>) {
let doc = serde_json::json!({ "summary": summary, "report": report });
match serde_json::to_string_pretty(&doc) {
Ok(s) => println!("{s}"),
Err(e) => tracing::error!(error = %e, "could not encode json report"),
}
}
