use nuheat::{Brand, NuHeat};
use std::env;

#[tokio::main]
async fn main() -> nuheat::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("usage: thermostat <email> <password> <serial> [brand]");
        std::process::exit(2);
    }
    let brand = args.get(4).map(|b| Brand::from_name(b)).unwrap_or_default();

    let api = NuHeat::builder(&args[1], &args[2]).brand(brand).build()?;
    api.authenticate().await?;

    let thermostat = api.thermostat(&args[3]).await?;
    println!("{thermostat}");
    println!(
        "room: {} | online: {} | heating: {} | mode: {}",
        thermostat.room().unwrap_or("-"),
        thermostat.online(),
        thermostat.heating(),
        thermostat
            .schedule_mode()
            .map_or_else(|| "unknown".to_string(), |m| m.to_string()),
    );
    if let Some(hold) = thermostat.hold_time() {
        println!("holding until {hold}");
    }
    if let Some(event) = thermostat.next_schedule_event() {
        println!(
            "next event at {} ({}\u{00b0}F)",
            event.time,
            nuheat::units::device_to_fahrenheit(event.temperature),
        );
    }
    Ok(())
}
