#![no_std]
#![no_main]

// static_cell::make_static! in main causes a compiler error
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        #[deny(unused_attributes)]
        let x = STATIC_CELL.uninit().write(($val));
        x
    }};
}
pub(crate) use mk_static;

#[macro_use]
mod config;
mod controllers;
mod infrastructure;

use embassy_executor::Spawner;
use embassy_time::{Duration, Instant, Timer};

use esp_alloc as _;
use esp_backtrace as _;
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Input, InputConfig, Pull};
use esp_hal::timer::timg::TimerGroup;
use esp_storage::FlashStorage;
use log::{info, warn};

use the1602::app::{DisplayService, DisplayWriter, OtaSlot, WallClock};
use the1602::controllers::{ButtonController, Controller};
use the1602::core::debounce::{ActiveLevel, InputDebouncer};
use the1602::domain::entity::BootPhase;

use crate::controllers::{BusModule, BusPublisher};
use crate::infrastructure::drivers::{init_lcd, init_network_stack, output, wait_for_connection};
use crate::infrastructure::services::mark_boot_valid;
use crate::infrastructure::tasks::{
    button_task, display_task, mqtt_runtime_task, network_runner_task, ota_task, publisher,
    sync_time, wifi_connection_task,
};

esp_bootloader_esp_idf::esp_app_desc!();

static DISPLAY: DisplayService = DisplayService::new();
static OTA_SLOT: OtaSlot = OtaSlot::new();
static CLOCK: WallClock = WallClock::new();

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    esp_println::logger::init_logger_from_env();
    info!("boot: the1602 {}", config::FIRMWARE.version);

    // Initialize hardware
    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(hal_config);

    // Allocate heap memory (64 + 32 KB)
    esp_alloc::heap_allocator!(
        #[unsafe(link_section = ".dram2_uninit")] size: 64 * 1024
    );
    esp_alloc::heap_allocator!(size: 32 * 1024);

    // Start rtos
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // Keep the running image before anything else can fail
    let mut flash = FlashStorage::new(peripherals.FLASH);
    mark_boot_valid(&mut flash);

    // Display and controllers
    let (rs, en, d4, d5, d6, d7) = lcd_gpio!(peripherals);
    let lcd = init_lcd(
        output(rs),
        output(en),
        [output(d4), output(d5), output(d6), output(d7)],
    );
    let mut writer = DisplayWriter::new(lcd);
    let controller: &'static Controller<'static> =
        mk_static!(Controller<'static>, Controller::new(&DISPLAY, &OTA_SLOT));
    controller.enter_phase(BootPhase::Connecting);
    writer.flush(&DISPLAY);
    spawner.spawn(display_task(writer, &DISPLAY)).ok();

    // Initialize network stack and spawn network tasks
    let (stack, runner, wifi) = init_network_stack(peripherals.WIFI);
    spawner.spawn(wifi_connection_task(wifi)).ok();
    spawner.spawn(network_runner_task(runner)).ok();

    let ip = wait_for_connection(stack).await;
    info!("network: got address {}", ip.address);
    controller.enter_phase(BootPhase::Connected);

    controller.enter_phase(BootPhase::TimeSync);
    if let Err(e) = sync_time(stack, &CLOCK).await {
        warn!("sntp: sync failed: {:?}", e);
    }

    controller.enter_phase(BootPhase::BusSession);
    let module = mk_static!(BusModule, BusModule::new(controller));
    spawner
        .spawn(mqtt_runtime_task(stack, module, config::MQTT))
        .ok();

    // Local input and the update worker
    let button = Input::new(
        button_gpio!(peripherals),
        InputConfig::default().with_pull(Pull::Up),
    );
    let button = ButtonController::new(
        InputDebouncer::new(button, ActiveLevel::Low),
        &DISPLAY,
        BusPublisher::new(publisher()),
    );
    spawner.spawn(button_task(button)).ok();
    spawner.spawn(ota_task(stack, &OTA_SLOT, flash)).ok();

    info!(
        "boot: done in {} ms, unix time {:?}, free heap {} bytes",
        Instant::now().as_millis(),
        CLOCK.unix_time(),
        esp_alloc::HEAP.free()
    );

    loop {
        Timer::after(Duration::from_secs(5)).await;
    }
}
