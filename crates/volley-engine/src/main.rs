use hyper::{
    service::{make_service_fn, service_fn},
    Body, Request, Response, Server, StatusCode,
};
use std::convert::Infallible;
use std::fs;
use std::io::{BufRead, Write};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use volley_common::Config;
use volley_engine::metrics::{self, RunLabels};
use volley_engine::report::{self, FinalReport};
use volley_engine::{resolve_target, run_burst, BurstOptions, ConnectionRegistry};

fn init_production_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_target(true))
        .init();

    info!("Production structured logging initialized (JSON)");
}

async fn metrics_handler(req: Request<Body>) -> Result<Response<Body>, Infallible> {
    match req.uri().path() {
        "/health" => Ok(Response::new(Body::from("OK"))),
        "/metrics" => Ok(Response::new(Body::from(metrics::render_metrics()))),
        _ => {
            let mut not_found = Response::new(Body::from("Not Found"));
            *not_found.status_mut() = StatusCode::NOT_FOUND;
            Ok(not_found)
        }
    }
}

async fn run_metrics_server(port: u16) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    metrics::register_metrics();

    let make_svc =
        make_service_fn(|_conn| async { Ok::<_, Infallible>(service_fn(metrics_handler)) });

    let server = Server::bind(&addr).serve(make_svc);

    info!(port = port, "Observability server online");

    if let Err(e) = server.await {
        error!(error = %e, "Observability server failed");
    }
}

/// Interactive warning before hammering a target. Accepts y/yes and
/// n/no (empty defaults to no); anything else reprompts.
fn ask_for_user_confirmation(host: &str, port: u16, connections: u32) -> std::io::Result<bool> {
    println!("****************************** WARNING ******************************");
    println!("* You are going to run a TCP stress check with these arguments:");
    println!("*   - Host: {}", host);
    println!("*   - TCP Port: {}", port);
    println!("*   - # of concurrent connections: {}", connections);
    println!("*********************************************************************");

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("Do you want to continue? (y/N): ");
        std::io::stdout().flush()?;
        let response = match lines.next() {
            Some(line) => line?.trim().to_lowercase(),
            None => return Ok(false),
        };
        match response.as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" | "" => return Ok(false),
            _ => println!("\nSorry, response not recognized. Try again, please"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_production_logging();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/volley_config.yaml".to_string());
    let config_data = fs::read_to_string(&config_path)?;
    let config: Config = serde_yaml::from_str(&config_data)?;
    config.validate()?;

    let target = resolve_target(&config.target.host, config.target.port).await?;
    info!(host = %config.target.host, resolved = %target, "Target resolved");

    if !config.run.assume_yes
        && !ask_for_user_confirmation(
            &config.target.host,
            config.target.port,
            config.run.connections,
        )?
    {
        info!("Execution cancelled by the user");
        return Ok(());
    }

    if config.metrics.enabled {
        let port = config.metrics.port;
        tokio::spawn(async move {
            run_metrics_server(port).await;
        });
    }

    let (snapshots, progress) = tokio::sync::watch::channel(ConnectionRegistry::new());
    let progress_task = tokio::spawn(report::report_progress(
        progress,
        Duration::from_secs(config.report.progress_interval_secs),
    ));

    let opts = BurstOptions::from(&config.run);
    let registry = run_burst(target, &opts, snapshots).await;
    let _ = progress_task.await;

    let final_report = FinalReport::from_registry(&registry);
    println!(
        "--- {}:{} tcp test statistics ---",
        config.target.host, config.target.port
    );
    println!("{}", registry.summary());
    print!("{}", final_report);

    if config.metrics.enabled {
        metrics::publish_report(
            &final_report,
            &RunLabels {
                target_ip: target.ip().to_string(),
                target_port: config.target.port,
                delay_ms: config.run.launch_delay_ms,
                timeout_ms: config.run.dial_timeout_ms,
            },
        );
        info!("Final report published to the metrics endpoint, Ctrl-C to exit");
        tokio::signal::ctrl_c().await?;
    }

    Ok(())
}
