//! # Network sky map
//!
//! Evaluates the H1-L1-V1 network antenna pattern on a 360x360 sky grid
//! at the GPS time of GW170817 and prints a summary of the map.
//!
//! `RUST_LOG=info cargo run --release --bin skymap`

use gw_skymap::{DetectorCatalog, Network, SiderealClock, SkyGrid};

const GPS_TIME: f64 = 1_187_008_882.4;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let catalog = DetectorCatalog::ligo_virgo_kagra();
    let network = Network::builder()
        .detectors(&catalog, ["H1", "L1", "V1"])?
        .clock(SiderealClock::default())
        .build()?;
    print!("{network}");
    for (id, placement) in network.placements() {
        println!("{id}: {placement}");
    }

    let map = network.grid(GPS_TIME, &SkyGrid::default(), 0.)?;
    println!("{map}");

    // network values are non-negative
    let (i, j) = map.data().iamax_full();
    println!(
        "Best network response at (ra: {:.1}deg, dec: {:.1}deg)",
        map.grid().right_ascensions()[j],
        map.grid().declinations()[i]
    );
    Ok(())
}
