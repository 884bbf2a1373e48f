//! Connect to a running gpsd instance and print what it reports.
//!
//! By default prints a once-per-second summary built from the client's
//! latest-report cache; with `--stream`, prints every report as it
//! arrives instead.

use std::time::Duration;

use clap::Parser;

use gpsd_watch::client::{Endpoint, WatchClient};
use gpsd_watch::protocol::v3::{Report, ReportClass};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// The host running GPSD
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// GPSD port
    #[arg(short, long, default_value = "2947")]
    port: u16,
    /// Print every report as it arrives instead of a 1 Hz summary
    #[arg(long)]
    stream: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let stream = args.stream;
    let mut client = WatchClient::new(Endpoint::new(args.host, args.port));
    client
        .start(move |report| {
            if stream {
                println!("{report:?}");
            }
            Ok(())
        })
        .unwrap();

    loop {
        tokio::time::sleep(Duration::from_secs(1)).await;
        if stream {
            continue;
        }

        match client.latest(ReportClass::Tpv) {
            Some(Report::Tpv(tpv)) => {
                if let (Some(lat), Some(lon)) = (tpv.lat, tpv.lon) {
                    println!(
                        "{:?} fix: lat {lat:9.5}, lon {lon:9.5}, alt {:?}",
                        tpv.mode, tpv.alt
                    );
                } else {
                    println!("{:?}, no position yet", tpv.mode);
                }
            }
            _ => println!("no TPV report yet ({:?})", client.state()),
        }

        if let Some(Report::Sky(sky)) = client.latest(ReportClass::Sky) {
            let used = sky.satellites.iter().filter(|sat| sat.used).count();
            println!(
                "satellites in view: {}, used: {}",
                sky.satellites.len(),
                used
            );
        }
    }
}
