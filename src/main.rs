use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use warden::config::Config;
use warden::http::request::Request;
use warden::http::reply::Reply;
use warden::http::static_files::reply_static_file;
use warden::server::Server;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = match std::env::args().nth(1) {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };

    let mut runtime = tokio::runtime::Builder::new_multi_thread();
    if let Some(workers) = cfg.workers {
        runtime.worker_threads(workers);
    }
    let runtime = runtime
        .enable_all()
        .build()
        .context("failed to start the runtime")?;

    let static_dir = cfg
        .static_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("./static"));

    runtime.block_on(
        Server::new(cfg)
            .request_handler(move |req: &Request<'_>, rep: &mut Reply| demo(&static_dir, req, rep))
            .run(),
    )
}

fn demo(static_dir: &std::path::Path, req: &Request<'_>, rep: &mut Reply) {
    match req.path() {
        "/" => {
            rep.add_header("Content-Type", "text/plain");
            rep.response_text("Hello World");
        }
        "/chunked" => {
            rep.add_header("Content-Type", "text/plain");
            let mut sent = 0;
            rep.response_by_generator(move || {
                if sent == 10 {
                    return String::new();
                }
                sent += 1;
                format!("Hello {sent}\r\n")
            });
        }
        "/stream" => {
            // no length is known up front, the close ends the body
            rep.add_header("Content-Type", "text/plain");
            rep.add_header("Connection", "close");
            let mut handle = rep.handoff();
            tokio::spawn(async move {
                for i in 1..=3 {
                    if let Err(e) = handle.write(format!("tick {i}\n")).await {
                        tracing::debug!(error = %e, "stream client went away");
                        return;
                    }
                    tokio::time::sleep(Duration::from_millis(200)).await;
                }
            });
        }
        _ => *rep = reply_static_file(static_dir, req),
    }
}
