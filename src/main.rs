use std::path::PathBuf;

use clap::Parser;
use linux_embedded_hal::I2cdev;
use tracing_subscriber::EnvFilter;

use spiderbot_runtime::config;
use spiderbot_runtime::runtime::Runtime;
use spiderbot_runtime::spider::RobotRig;
use spiderbot_runtime::transport::{NullTransport, Pca9685, ServoTransport, Ssc32Board};

/// Quadruped control runtime: solves leg kinematics every tick and streams
/// servo pulses to the controller hardware.
#[derive(Parser)]
struct Args {
    /// Serial device of the SSC-32U servo controller board
    #[arg(long, default_value = config::SERIAL_PORT)]
    port: String,

    /// Serial baud rate
    #[arg(long, default_value_t = config::SERIAL_BAUD)]
    baud: u32,

    /// Drive a PCA9685 on this I2C device instead of the serial board
    #[arg(long, value_name = "DEV")]
    i2c: Option<String>,

    /// JSON servo calibration file (12 entries in channel order)
    #[arg(long, value_name = "FILE")]
    calibration: Option<PathBuf>,

    /// Log commands instead of touching hardware
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    if let Err(e) = run(Args::parse()).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let rig = match &args.calibration {
        Some(path) => RobotRig::with_calibration(config::load_servo_table(path)?),
        None => RobotRig::new(),
    };

    let transport: Box<dyn ServoTransport> = if args.dry_run {
        Box::new(NullTransport)
    } else if let Some(dev) = &args.i2c {
        let mut pwm = Pca9685::with_address(I2cdev::new(dev)?, config::PCA9685_ADDR);
        pwm.configure()?;
        Box::new(pwm)
    } else {
        Box::new(Ssc32Board::open_with_baudrate(
            &args.port,
            args.baud,
            &rig.channels(),
        )?)
    };

    Runtime::new(rig, transport).run().await?;
    Ok(())
}
