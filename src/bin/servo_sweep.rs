// Servo sweep: calibrate one servo channel at a time over the SSC-32U board
//
// Usage: cargo run --bin servo_sweep -- <channel> [port]
//
// Safety features:
// - Explicit confirmation before anything moves
// - Centers the servo first, then sweeps a narrow pulse range slowly
// - Powers the channel down before exiting

use std::io::{self, Write};
use std::thread::sleep;
use std::time::Duration;

use spiderbot_runtime::config;
use spiderbot_runtime::transport::{PendingBatch, ServoTransport, Ssc32Board};

// Conservative sweep range; real travel limits are found by widening this
// gradually while watching the horn.
const SWEEP_MIN: u16 = 1200;
const SWEEP_MAX: u16 = 1800;
const SWEEP_STEP: u16 = 25;
const CENTER: u16 = 1500;
const STEP_DELAY_MS: u64 = 100;

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N]: ", prompt);
    io::stdout().flush().unwrap();
    let mut input = String::new();
    io::stdin().read_line(&mut input).unwrap();
    input.trim().eq_ignore_ascii_case("y")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("debug".parse().unwrap()),
        )
        .init();

    let channel: u8 = match std::env::args().nth(1).and_then(|arg| arg.parse().ok()) {
        Some(channel) => channel,
        None => {
            eprintln!("Usage: cargo run --bin servo_sweep -- <channel> [port]");
            std::process::exit(2);
        }
    };
    let port = std::env::args()
        .nth(2)
        .unwrap_or_else(|| config::SERIAL_PORT.to_string());

    println!("Servo sweep (WITH MOVEMENT)");
    println!("  port:    {}", port);
    println!("  channel: {}", channel);
    println!("  range:   {}..{}us in {}us steps", SWEEP_MIN, SWEEP_MAX, SWEEP_STEP);
    println!();
    println!("The horn will move. Detach linkages or support the leg first.");

    if !confirm("Proceed with the sweep?") {
        println!("Aborted, nothing sent.");
        return Ok(());
    }

    let mut board = Ssc32Board::open_with_baudrate(&port, config::SERIAL_BAUD, &[channel])?;
    let mut batch = PendingBatch::new();

    // Center slowly before sweeping so the first step is small.
    println!("Centering at {}us...", CENTER);
    batch.set(channel, CENTER);
    board.commit(&batch, Some(1000))?;
    batch.clear();
    sleep(Duration::from_millis(1200));

    println!("Sweeping...");
    let up = (SWEEP_MIN..=SWEEP_MAX).step_by(SWEEP_STEP as usize);
    let down = up.clone().rev();
    for micros in up.chain(down) {
        batch.set(channel, micros);
        board.commit(&batch, None)?;
        batch.clear();
        print!("\r  {}us   ", micros);
        io::stdout().flush().unwrap();
        sleep(Duration::from_millis(STEP_DELAY_MS));
    }
    println!();

    println!("Done, powering channel down.");
    board.stop_all()?;
    Ok(())
}
