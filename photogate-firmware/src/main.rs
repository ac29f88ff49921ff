//! Photogate - Light-Gate Timer Firmware
//!
//! Main firmware binary for RP2040-based light-gate timers used in
//! dog-agility training. A beam-break sensor starts and stops a timing
//! run; manual buttons can override the sensor for hand-timed runs.
//! Results are persisted to flash and served over a line-based UART
//! control link.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use photogate_core::config::{GateConfig, PinAssignments};
use photogate_core::timing::TriggerSource;

mod channels;
mod config;
mod flash;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Photogate firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Flash storage and configuration
    let mut storage = flash::FlashStore::new(p.FLASH, p.DMA_CH0);
    let config = match config::load_config(&mut storage).await {
        Ok(config) => {
            info!("Loaded configuration from flash");
            config
        }
        Err(_) => {
            info!("No valid configuration in flash, using defaults");
            let defaults = GateConfig::default();
            // Seed flash so the next boot reads the same values
            if let Err(e) = config::save_config(&mut storage, &defaults).await {
                warn!("Failed to seed default config: {:?}", e);
            }
            defaults
        }
    };

    // Setup UART for the control link
    let uart_config = UartConfig::default(); // 115200 baud default

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    info!("UART initialized for control link");

    // Trigger inputs. Pin muxing is resolved at compile time on the
    // RP2040, so the wiring below is the board truth; the stored pin
    // assignments are checked against it at startup.
    if config.pins != PinAssignments::default() {
        warn!("Configured pins differ from board wiring, using wired pins");
    }

    // All inputs idle high; a broken beam or pressed button pulls low
    let sensor = Input::new(p.PIN_16, Pull::Up);
    let start_button = Input::new(p.PIN_14, Pull::Up);
    let stop_button = Input::new(p.PIN_15, Pull::Up);

    // Spawn tasks
    spawner.spawn(tasks::tick_task()).unwrap();
    spawner
        .spawn(tasks::trigger_task(sensor, TriggerSource::Sensor))
        .unwrap();
    if config.pins.manual_start.is_some() {
        spawner
            .spawn(tasks::trigger_task(start_button, TriggerSource::ManualStart))
            .unwrap();
    }
    if config.pins.manual_stop.is_some() {
        spawner
            .spawn(tasks::trigger_task(stop_button, TriggerSource::ManualStop))
            .unwrap();
    }
    spawner.spawn(tasks::link_rx_task(rx)).unwrap();
    spawner.spawn(tasks::link_tx_task(tx)).unwrap();
    spawner.spawn(tasks::store_task(storage)).unwrap();
    spawner.spawn(tasks::controller_task(config)).unwrap();

    info!("All tasks spawned, firmware running");

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
