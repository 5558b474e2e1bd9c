// Servo hardware transports
//
// Provides:
// - The pending-batch / commit seam shared by all links
// - SSC-32U servo controller board (ASCII serial line protocol)
// - PCA9685 I2C PWM driver chip (50Hz servo refresh)

mod batch;
pub mod pca9685;
pub mod ssc32;

pub use batch::{NullTransport, PendingBatch, ServoTransport, TransportError};
pub use pca9685::Pca9685;
pub use ssc32::Ssc32Board;
