//! classicwheeld - force-feedback host daemon for Logitech classic-protocol
//! wheels.
//!
//! Opens a candidate wheel over hidapi, derives the output-report length from
//! its report descriptor, and drives the force control loop from a loopback
//! UDP text channel (`STOP` / `CONST <n>`).

mod channel;

use std::convert::Infallible;

use anyhow::{Context, Result, bail};
use clap::Parser;
use hidapi::HidApi;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use classicwheel_controller::config::{
    DEFAULT_MAX_FORCE, DEFAULT_PORT, DEFAULT_RATE_HZ, DEFAULT_REPORT_ID, DEFAULT_WATCHDOG_MS,
};
use classicwheel_controller::{ForceCommand, ForceController, HostConfig, host};
use classicwheel_hid_common::{
    HidOutputTransport, WheelInfo, descriptor, device,
};

/// Report length used when the descriptor yields nothing usable. Large
/// enough for every classic-protocol wheel seen in the wild.
const FALLBACK_OUTPUT_LEN: usize = 16;

#[derive(Parser)]
#[command(name = "classicwheeld")]
#[command(version)]
#[command(about = "Force-feedback host daemon for Logitech classic-protocol wheels")]
struct Cli {
    /// Loopback UDP port for the text command channel
    #[arg(long, default_value_t = DEFAULT_PORT, value_parser = port_value)]
    port: u16,

    /// Control loop rate in Hz (floored at 50)
    #[arg(long, default_value_t = DEFAULT_RATE_HZ, value_parser = rate_value)]
    rate: u32,

    /// Watchdog staleness budget in milliseconds (floored at 50)
    #[arg(long = "watchdog-ms", default_value_t = DEFAULT_WATCHDOG_MS, value_parser = watchdog_value)]
    watchdog_ms: u64,

    /// Force clamp magnitude, 1-127
    #[arg(long = "max-force", default_value_t = DEFAULT_MAX_FORCE, value_parser = max_force_value)]
    max_force: i16,

    /// Index into the candidate wheel list (see --list)
    #[arg(long = "device-index", default_value_t = 0, value_parser = index_value)]
    device_index: usize,

    /// Output report ID: decimal, 0x-prefixed hex, or bare hex
    #[arg(long = "report-id", default_value_t = DEFAULT_REPORT_ID, value_parser = report_id_value)]
    report_id: u8,

    /// List candidate wheels and exit
    #[arg(long)]
    list: bool,

    /// Print the wheel list as JSON (with --list)
    #[arg(long)]
    json: bool,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

// Malformed flag values fall back to the documented defaults instead of
// refusing to start; the daemon may be launched by supervisors that cannot
// react to argument errors.

fn port_value(s: &str) -> Result<u16, Infallible> {
    Ok(s.parse().unwrap_or(DEFAULT_PORT))
}

fn rate_value(s: &str) -> Result<u32, Infallible> {
    Ok(s.parse().unwrap_or(DEFAULT_RATE_HZ))
}

fn watchdog_value(s: &str) -> Result<u64, Infallible> {
    Ok(s.parse().unwrap_or(DEFAULT_WATCHDOG_MS))
}

fn max_force_value(s: &str) -> Result<i16, Infallible> {
    Ok(s.parse().unwrap_or(DEFAULT_MAX_FORCE))
}

fn index_value(s: &str) -> Result<usize, Infallible> {
    Ok(s.parse().unwrap_or(0))
}

/// `0x`-prefixed tokens are hex; bare tokens try decimal first, then hex, so
/// `ff` works while plain numbers keep their decimal reading.
fn report_id_value(s: &str) -> Result<u8, Infallible> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => s.parse().ok().or_else(|| u8::from_str_radix(s, 16).ok()),
    };
    Ok(parsed.unwrap_or(DEFAULT_REPORT_ID))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "classicwheeld={level},classicwheel_controller={level},classicwheel_hid_common={level}"
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn print_wheels(wheels: &[WheelInfo], json: bool) -> Result<()> {
    if json {
        let rendered =
            serde_json::to_string_pretty(wheels).context("failed to serialize wheel list")?;
        println!("{rendered}");
        return Ok(());
    }
    if wheels.is_empty() {
        println!("No candidate wheels found.");
        return Ok(());
    }
    println!("{:<6} {:<8} {:<8} Product", "Index", "VID", "PID");
    println!("{}", "-".repeat(60));
    for (index, wheel) in wheels.iter().enumerate() {
        println!(
            "{:<6} {:<8} {:<8} {}",
            index,
            format!("0x{:04X}", wheel.vendor_id),
            format!("0x{:04X}", wheel.product_id),
            wheel.product,
        );
    }
    Ok(())
}

/// Resolve the wire length for output reports: the descriptor's entry for the
/// session report ID, the largest declared output report failing that, and a
/// fixed fallback when the descriptor is unusable.
fn resolve_output_len(hid: &hidapi::HidDevice, report_id: u8) -> usize {
    let desc = match device::read_report_descriptor(hid) {
        Ok(desc) => desc,
        Err(error) => {
            warn!(error = %error, "report descriptor unavailable, using fallback length");
            return FALLBACK_OUTPUT_LEN;
        }
    };

    let sizes = descriptor::parse_output_report_sizes(&desc);
    for (id, len) in &sizes {
        debug!(report_id = id, bytes = len, "declared output report");
    }

    if let Some(&len) = sizes.get(&report_id) {
        return len;
    }
    match descriptor::max_output_report_size(&sizes) {
        0 => {
            warn!(report_id, "descriptor declares no output reports, using fallback length");
            FALLBACK_OUTPUT_LEN
        }
        max => max,
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};
    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.context("failed to listen for SIGINT"),
        _ = sigterm.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let api = HidApi::new().context("failed to initialize hidapi")?;
    let wheels = device::list_candidate_wheels(&api);

    if cli.list {
        return print_wheels(&wheels, cli.json);
    }

    let config = HostConfig {
        port: cli.port,
        rate_hz: cli.rate,
        watchdog_ms: cli.watchdog_ms,
        max_force: cli.max_force,
        device_index: cli.device_index,
        report_id: cli.report_id,
    }
    .normalized();

    if wheels.is_empty() {
        bail!("no candidate wheel found (looking for G29 / Driving Force, vendor 0x046D)");
    }
    let Some(info) = wheels.get(config.device_index) else {
        bail!(
            "device index {} out of range, {} candidate wheel(s) found (try --list)",
            config.device_index,
            wheels.len()
        );
    };
    info!(
        product = %info.product,
        vendor_id = format_args!("0x{:04X}", info.vendor_id),
        product_id = format_args!("0x{:04X}", info.product_id),
        "using wheel"
    );

    let hid =
        device::open_wheel(&api, info).with_context(|| format!("failed to open {}", info.path))?;
    let max_output_len = resolve_output_len(&hid, config.report_id);
    info!(max_output_len, report_id = config.report_id, "output report length resolved");

    let transport = HidOutputTransport::new(hid, max_output_len);
    let controller = ForceController::new(transport, &config);

    let socket = UdpSocket::bind(("127.0.0.1", config.port))
        .await
        .with_context(|| format!("failed to bind udp 127.0.0.1:{}", config.port))?;

    let (tx, rx) = mpsc::channel::<ForceCommand>(64);
    let listener = tokio::spawn(channel::listen(socket, tx));
    let mut control = tokio::spawn(host::run(controller, rx, config.tick_interval()));

    tokio::select! {
        result = shutdown_signal() => {
            result?;
            info!("shutdown signal received");
        }
        result = &mut control => {
            listener.abort();
            result.context("control loop task failed")?;
            bail!("control loop exited unexpectedly");
        }
    }

    // Aborting the listener drops the command sender; the control loop drains,
    // sends its final stop, and exits.
    listener.abort();
    control.await.context("control loop task failed")?;
    info!("daemon stopped");
    Ok(())
}
