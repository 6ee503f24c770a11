use std::sync::Arc;

use clap::Parser;

use snagmail::drive::DriveClient;
use snagmail::smtp::Mailer;

mod config;
mod controllers;
mod errors;
mod routes;

#[derive(Debug, Parser)]
#[command(name = "snagmail-server", about = "Protocol backend for the maintenance portal")]
struct Opt {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Port to listen on
    #[arg(short, long, default_value_t = config::DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() {
    env_logger::builder().format_timestamp_micros().init();

    let opt = Opt::parse();

    let cfg = match snagmail::config::load(opt.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            log::error!("failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let mailer = cfg.mail.map(Mailer::new);
    if mailer.is_some() {
        log::info!("mail sending enabled");
    } else {
        log::warn!("no [mail] section; email endpoints will report an error");
    }

    // A bad service account key disables Drive uploads but keeps the
    // mail endpoints serving.
    let drive = match cfg.drive {
        Some(ref drive_cfg) => match DriveClient::new(drive_cfg) {
            Ok(client) => {
                log::info!("Drive uploads enabled");
                Some(Arc::new(client))
            }
            Err(e) => {
                log::error!("Drive credentials rejected: {}", e);
                None
            }
        },
        None => {
            log::warn!("no [drive] section; upload endpoint will report an error");
            None
        }
    };

    let state = controllers::AppState { mailer, drive };

    log::info!("Starting server on port {}...", opt.port);

    warp::serve(routes::service(state))
        .run(([0, 0, 0, 0], opt.port))
        .await;
}
