//! Motion logger firmware for the Raspberry Pi Pico.
//!
//! Samples an MPU6050 at 10 Hz, logs CSV rows to an SD card, and shows
//! system status on an SSD1306 panel plus three LEDs and a buzzer. Two
//! buttons toggle the capture session and the card mount; a UART
//! console offers the full command set.
//!
//! All decisions live in the host-testable `motionlog` library; this
//! binary only wires peripherals to the supervisor's poll loop.

#![no_std]
#![no_main]

use defmt::{error, info, warn};
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c;
use embassy_rp::peripherals::UART1;
use embassy_rp::spi;
use embassy_rp::uart::{BufferedUart, BufferedUartTx, Config as UartConfig};
use embassy_time::{Delay, Instant, Timer};
use embedded_hal_bus::spi::ExclusiveDevice;
use embedded_io::Write as _;
use embedded_io_async::Read as _;
use embedded_sdmmc::{SdCard, VolumeManager};
use static_cell::StaticCell;

use motionlog::app::{App, PollInputs};
use motionlog::config::{
    CONSOLE_BAUDRATE, LOOP_TICK_MS, MPU6050_ADDR, SD_SPI_INIT_FREQ, SD_SPI_WORK_FREQ,
};
use motionlog::console::ConsoleOut;
use motionlog::debounce::EdgeFlags;
use motionlog::sample::MotionSample;
use motionlog::sdfs::{SdDelay, SdStorage, SdVolumeManager, UptimeClock};
use motionlog::sensor::Mpu6050;
use motionlog::ui::alert::Alert;
use motionlog::ui::buttons::{button_task, ButtonRole};
use motionlog::ui::display;

use {defmt_rtt as _, panic_probe as _};

bind_interrupts!(struct Irqs {
    UART1_IRQ => embassy_rp::uart::BufferedInterruptHandler<UART1>;
});

/// Desired-state flags shared between the button tasks and the main loop.
static BUTTON_FLAGS: EdgeFlags = EdgeFlags::new();

static VOLUME_MGR: StaticCell<SdVolumeManager> = StaticCell::new();

/// Blocking console sink for the supervisor's synchronous prints.
struct UartConsole {
    tx: BufferedUartTx,
}

impl ConsoleOut for UartConsole {
    fn print(&mut self, s: &str) {
        let _ = self.tx.write_all(s.as_bytes());
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("motionlog starting");

    // IMU on I2C0 (GP0/GP1)

    let i2c0 = i2c::I2c::new_blocking(p.I2C0, p.PIN_1, p.PIN_0, i2c::Config::default());
    let mut imu = Mpu6050::new(i2c0, MPU6050_ADDR);
    if imu.reset(&mut Delay).is_err() {
        error!("MPU6050 reset failed");
    }

    // OLED on I2C1 (GP14/GP15)

    let i2c1 = i2c::I2c::new_blocking(p.I2C1, p.PIN_15, p.PIN_14, i2c::Config::default());
    let mut panel = display::init(i2c1);

    // LEDs + buzzer

    let mut alert = Alert::new(
        Output::new(p.PIN_11, Level::Low),
        Output::new(p.PIN_12, Level::Low),
        Output::new(p.PIN_13, Level::Low),
        Output::new(p.PIN_21, Level::Low),
    );

    // Buttons (active-low, internal pull-up)

    spawner.must_spawn(button_task(
        Input::new(p.PIN_5, Pull::Up),
        ButtonRole::Mount,
        &BUTTON_FLAGS,
    ));
    spawner.must_spawn(button_task(
        Input::new(p.PIN_6, Pull::Up),
        ButtonRole::Capture,
        &BUTTON_FLAGS,
    ));

    // SD card on SPI0 (GP16-GP19)

    let mut spi_config = spi::Config::default();
    spi_config.frequency = SD_SPI_INIT_FREQ;
    let spi0 = spi::Spi::new_blocking(p.SPI0, p.PIN_18, p.PIN_19, p.PIN_16, spi_config);
    let cs = Output::new(p.PIN_17, Level::High);

    let spi_device = match ExclusiveDevice::new(spi0, cs, SdDelay) {
        Ok(dev) => dev,
        Err(_) => defmt::panic!("SPI device setup failed"),
    };
    let sd_card = SdCard::new(spi_device, SdDelay);

    // Probe once so the bus can be bumped to the working frequency. A
    // missing card is fine; mount attempts retry the init later.
    match sd_card.num_bytes() {
        Ok(bytes) => {
            info!("SD card: {} MB", bytes / (1024 * 1024));
            sd_card.spi(|dev| dev.bus_mut().set_frequency(SD_SPI_WORK_FREQ));
        }
        Err(_) => warn!("no SD card detected at boot"),
    }

    let volume_mgr = VOLUME_MGR.init(VolumeManager::new(sd_card, UptimeClock));
    let mut storage = SdStorage::new(volume_mgr);

    // Console on UART1 (GP8/GP9)

    static TX_BUF: StaticCell<[u8; 1024]> = StaticCell::new();
    static RX_BUF: StaticCell<[u8; 64]> = StaticCell::new();
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = CONSOLE_BAUDRATE;
    let uart = BufferedUart::new(
        p.UART1,
        p.PIN_8,
        p.PIN_9,
        Irqs,
        &mut TX_BUF.init([0; 1024])[..],
        &mut RX_BUF.init([0; 64])[..],
        uart_config,
    );
    let (uart_tx, mut uart_rx) = uart.split();
    let mut console = UartConsole { tx: uart_tx };
    console.print("\r\nmotionlog console ('g' or 'help' for commands)\r\n> ");

    // Supervisor loop

    let mut app: App<SdStorage> = App::new();
    let mut rx_byte = [0u8; 1];
    let mut sample = MotionSample::default();

    info!("entering main loop");
    loop {
        // One console byte per iteration; the timer only paces the loop
        // when the console is idle.
        let console_byte = match select(
            uart_rx.read(&mut rx_byte),
            Timer::after_millis(LOOP_TICK_MS),
        )
        .await
        {
            Either::First(Ok(n)) if n > 0 => Some(rx_byte[0]),
            Either::First(_) => None,
            Either::Second(()) => None,
        };

        match imu.read_raw() {
            Ok(raw) => sample = MotionSample::from_raw(&raw),
            Err(_) => warn!("IMU read failed"),
        }

        let inputs = PollInputs {
            now_ms: Instant::now().as_millis(),
            capture_flag: BUTTON_FLAGS.capture(),
            mount_flag: BUTTON_FLAGS.mount(),
            console_byte,
            sample,
        };
        let out = app.poll(&mut storage, &mut console, &inputs);

        // Console-initiated actions overwrite the shared flags so the
        // next button press toggles from the true state.
        if let Some(v) = out.sync_capture {
            BUTTON_FLAGS.set_capture(v);
        }
        if let Some(v) = out.sync_mount {
            BUTTON_FLAGS.set_mount(v);
        }

        if let Some(setting) = out.set_clock {
            UptimeClock::set(&setting);
            info!(
                "clock set: {}-{}-{} {}:{}:{}",
                setting.year, setting.month, setting.day, setting.hour, setting.minute,
                setting.second
            );
        }

        if let Some(announcement) = out.announcement {
            info!("mode: {}", announcement.mode);
            if let Some(leds) = announcement.leds {
                alert.apply_leds(leds);
            }
            alert.play(announcement.beeps).await;
        }

        if let Some(screen) = out.screen {
            display::render(&mut panel, &screen);
        }
    }
}
