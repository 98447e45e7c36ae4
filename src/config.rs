//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and protocol
//! constants live here so they can be tuned in one place.

// Sampling & logging

/// IMU logging period (ms). 100 ms = 10 Hz.
pub const SAMPLE_PERIOD_MS: u64 = 100;

/// Force a durability flush of the CSV stream every N samples.
/// Bounds worst-case data loss on power failure to ~5 s at 10 Hz.
pub const FLUSH_INTERVAL_SAMPLES: u32 = 50;

/// Default CSV output file on the SD card.
pub const LOG_FILENAME: &str = "mpu_data.csv";

/// CSV header row. Byte-exact: external tooling keys on these column
/// names, and tests compare the emitted header against this constant.
pub const CSV_HEADER: &str = "Sample,AccelX,AccelY,AccelZ,GyroX,GyroY,GyroZ,Roll,Pitch\n";

// UI timing

/// Status panel refresh period (ms). Independent of the sampling
/// deadline so render time cannot skew the logging rate.
pub const DISPLAY_PERIOD_MS: u64 = 500;

/// How long the Init mode is held after power-on before decaying to
/// Normal (ms).
pub const INIT_HOLD_MS: u64 = 5000;

/// Button debounce refractory window (us).
pub const BUTTON_DEBOUNCE_US: u64 = 300_000;

/// Pause between buzzer pulses (ms).
pub const BEEP_GAP_MS: u64 = 100;

/// Main loop pacing when the console is idle (ms). Keeps the sampling
/// deadline jitter well under one period.
pub const LOOP_TICK_MS: u64 = 10;

// Console

/// Command line buffer size (bytes).
pub const COMMAND_BUF_SIZE: usize = 256;

/// Console UART baud rate.
pub const CONSOLE_BAUDRATE: u32 = 115_200;

// Storage

/// Logical name of the single SD card volume.
pub const SD_DRIVE: &str = "sd0";

/// SD SPI frequency during card initialization.
pub const SD_SPI_INIT_FREQ: u32 = 400_000;

/// SD SPI frequency after init.
pub const SD_SPI_WORK_FREQ: u32 = 16_000_000;

// Sensor

/// MPU6050 I2C address (AD0 low).
pub const MPU6050_ADDR: u8 = 0x68;

/// SSD1306 I2C address.
pub const DISPLAY_ADDR: u8 = 0x3C;

// GPIO pin assignments (Raspberry Pi Pico)
//
// These are logical names; actual `embassy_rp::peripherals::*` types are
// selected in `main.rs`.  Adjust for your carrier board.
//
//   MPU6050 SDA     → GP0  (I2C0)
//   MPU6050 SCL     → GP1  (I2C0)
//   Button A        → GP5  (mount/unmount)
//   Button B        → GP6  (capture start/stop)
//   Console UART TX → GP8  (UART1)
//   Console UART RX → GP9  (UART1)
//   LED green       → GP11
//   LED blue        → GP12
//   LED red         → GP13
//   OLED SDA        → GP14 (I2C1)
//   OLED SCL        → GP15 (I2C1)
//   SD MISO         → GP16 (SPI0)
//   SD CS           → GP17
//   SD SCK          → GP18 (SPI0)
//   SD MOSI         → GP19 (SPI0)
//   Buzzer          → GP21
