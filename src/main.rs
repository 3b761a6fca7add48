mod accounts;
mod catalog;
mod database;
mod error;
mod routes;
mod schema;
mod storage;
mod structs;
mod validation;

use database::{MemoryStore, PostgresStore, Store};
use routes::AppState;
use storage::Uploads;
use structs::{Args, PostgresConfig};

use actix_web::{web, App, HttpServer};
use actix_web_prom::PrometheusMetricsBuilder;
use clap::Parser;
use env_logger::Env;
use log::{info, warn};

use std::io;
use std::sync::Arc;

fn open_store(args: &Args) -> io::Result<Arc<dyn Store>> {
    if args.offline {
        warn!("[main] offline mode: accounts and products are kept in memory only");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let config = PostgresConfig::from_env();
    PostgresStore::connect(&config)
        .map(|store| Arc::new(store) as Arc<dyn Store>)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    info!("[main] starting delivery backend ...");

    let store = open_store(&args)?;
    let uploads = Uploads::new(args.uploads.clone());
    uploads.prepare()?;

    let state = web::Data::new(AppState::new(store, uploads));

    let prometheus = PrometheusMetricsBuilder::new("delivery")
        .endpoint("/metrics")
        .build()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    info!("[main] listening on: {}:{}", &args.host, &args.port);
    HttpServer::new(move || {
        App::new()
            .wrap(prometheus.clone())
            .app_data(state.clone())
            .configure(routes::configure)
    })
    .bind((args.host.as_str(), args.port))?
    .run()
    .await
}
