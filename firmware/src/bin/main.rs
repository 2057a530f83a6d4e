#![no_std]
#![no_main]

use defmt::info;
use defmt_rtt as _;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::bind_interrupts;
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::{InterruptHandler, Pio};
use embassy_time::Timer;
use gc_to_nes::{
    nes_responder, Coordinator, GcPad, JoybusProgram, NesResponder, ResponderLink, SourceAdapter,
    SETTLE_TIME,
};

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

/// Published byte and session bookkeeping shared with the responder.
static LINK: ResponderLink = ResponderLink::new();

/// Runs the responder above everything in thread mode.
static EXECUTOR_NES: InterruptExecutor = InterruptExecutor::new();

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => InterruptHandler<PIO0>;
});

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_NES.on_interrupt()
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("GameCube-to-NES starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- GameCube controller ---
    let Pio { mut common, sm0, .. } = Pio::new(p.PIO0, Irqs);
    let program = JoybusProgram::new(&mut common);
    let mut pad = GcPad::new(&mut common, sm0, p.PIN_2, &program);
    pad.init();
    Timer::after(SETTLE_TIME).await;

    // Reads the pad once and fixes the mapping mode
    let mut coordinator = Coordinator::boot(pad, &LINK);

    // --- NES port ---
    let responder = nes_responder(p.PIN_3, p.PIN_4, p.PIN_5);

    interrupt::SWI_IRQ_1.set_priority(Priority::P1);
    let nes_spawner = EXECUTOR_NES.start(interrupt::SWI_IRQ_1);
    nes_spawner.spawn(responder_task(responder)).unwrap();

    info!("GameCube-to-NES ready, mode {:?}", coordinator.mode());

    coordinator.run().await
}

/// Responder task - answers every latch from the console.
#[embassy_executor::task]
async fn responder_task(mut responder: NesResponder) {
    responder.serve(&LINK).await
}
