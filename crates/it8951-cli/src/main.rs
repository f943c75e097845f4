// Binary crate: errors are reported through anyhow, not public API docs.
#![allow(missing_docs)]

#[cfg(not(any(target_os = "linux", windows)))]
compile_error!("it8951ctl needs Linux SG_IO or Windows SCSI pass-through");

mod config;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use it8951_scsi::{It8951, TransportConfig, STATUS_REGISTER};
use it8951_screen::{FileImageSource, Rotation, ScreenManager};
use tracing_subscriber::EnvFilter;

use crate::config::{FileConfig, Overrides, Settings};

#[derive(Parser)]
#[command(name = "it8951ctl")]
#[command(about = "Drive IT8951 e-paper panels over SCSI pass-through", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// JSON config file (device, vcom, rotation, timeouts, max_transfer_len)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Device node: /dev/sgN on Linux, \\.\X: on Windows
    #[arg(short, long, global = true)]
    device: Option<PathBuf>,

    /// Panel bias voltage applied once before `display` / `clear`
    #[arg(long, global = true, allow_negative_numbers = true)]
    vcom: Option<f64>,

    /// Clockwise image rotation in degrees: 0, 90, 180 or 270
    #[arg(long, global = true)]
    rotation: Option<Rotation>,

    /// Log filter (e.g. `debug`, `it8951_scsi=trace`); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Skip the IT8951 identification check
    #[arg(long, global = true)]
    force: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print inquiry data and the controller's system info
    Info,
    /// Show an image file on the panel
    Display {
        /// PNG, JPEG, BMP, GIF or TIFF file
        image: PathBuf,
    },
    /// Flash the whole panel to white
    Clear,
    /// Program the panel bias voltage (e.g. -1.53)
    Vcom {
        #[arg(allow_negative_numbers = true)]
        volts: f64,
    },
    /// Read a 32-bit register
    ReadReg {
        /// Register address, decimal or 0x-prefixed hex
        #[arg(value_parser = parse_u32)]
        address: u32,
    },
    /// Write a 32-bit register
    WriteReg {
        /// Register address, decimal or 0x-prefixed hex
        #[arg(value_parser = parse_u32)]
        address: u32,
        /// Value, decimal or 0x-prefixed hex
        #[arg(value_parser = parse_u32)]
        value: u32,
    },
    /// Block until the display engine is idle
    WaitReady {
        /// Give up after this many status polls (default: wait forever)
        #[arg(long)]
        polls: Option<u32>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.log_level.as_deref());

    let file = match &cli.global.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(
        file,
        Overrides {
            device: cli.global.device.clone(),
            vcom: cli.global.vcom,
            rotation: cli.global.rotation,
        },
    )?;
    tracing::debug!(?settings, "resolved settings");

    let device = open(&settings.device, settings.transport)?;
    let chip = It8951::with_timeouts(device, settings.timeouts);
    if !cli.global.force {
        chip.identify().with_context(|| {
            format!(
                "{} is not an IT8951 (use --force to skip this check)",
                settings.device.display()
            )
        })?;
    }

    run(cli.command, chip, &settings)
}

fn run<T: it8951_scsi::Transport>(command: Commands, chip: It8951<T>, settings: &Settings) -> Result<()> {
    match command {
        Commands::Info => {
            let inquiry = chip.inquiry().context("inquiry failed")?;
            let info = chip.system_info().context("reading system info failed")?;
            println!("vendor:          {}", inquiry.vendor);
            println!("product:         {}", inquiry.product);
            println!("revision:        {}", inquiry.revision);
            println!("panel:           {}x{}", info.width, info.height);
            println!("image buffer:    {:#010x}", info.image_buf_base);
            println!("update buffer:   {:#010x}", info.update_buf_base);
            println!("command table:   v{}", info.version);
            println!("wave modes:      {}", info.mode_no);
            println!("image buffers:   {}", info.num_img_buf);
        }
        Commands::Display { image } => {
            let mut screen = screen(chip, settings);
            screen
                .display(&FileImageSource::new(&image))
                .with_context(|| format!("displaying {}", image.display()))?;
        }
        Commands::Clear => {
            let mut screen = screen(chip, settings);
            screen.clear_screen().context("clearing panel")?;
        }
        Commands::Vcom { volts } => {
            chip.set_vcom(volts).context("setting VCOM")?;
        }
        Commands::ReadReg { address } => {
            let value = chip
                .read_register(address)
                .with_context(|| format!("reading register {address:#010x}"))?;
            println!("{address:#010x}: {value:#010x}");
        }
        Commands::WriteReg { address, value } => {
            chip.write_register(address, value)
                .with_context(|| format!("writing register {address:#010x}"))?;
        }
        Commands::WaitReady { polls } => match polls {
            Some(polls) => chip
                .wait_until_ready_within(polls)
                .with_context(|| format!("waiting on status register {STATUS_REGISTER:#010x}"))?,
            None => chip.wait_until_ready(),
        },
    }
    Ok(())
}

fn screen<T: it8951_scsi::Transport>(chip: It8951<T>, settings: &Settings) -> ScreenManager<T> {
    let mut screen = match settings.vcom {
        Some(volts) => ScreenManager::with_vcom(chip, volts),
        None => ScreenManager::new(chip),
    };
    screen.set_rotation(settings.rotation);
    screen
}

fn open(path: &Path, config: TransportConfig) -> Result<it8951_scsi::PlatformDevice> {
    Ok(it8951_scsi::open_device(path, config)?)
}

/// `--log-level` wins, then `RUST_LOG`, then `warn`.
fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

/// Decimal or `0x`-prefixed hexadecimal.
fn parse_u32(s: &str) -> Result<u32, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(&hex.replace('_', ""), 16),
        None => s.replace('_', "").parse(),
    };
    parsed.map_err(|e| format!("invalid number {s:?}: {e}"))
}
