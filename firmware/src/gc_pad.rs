//! GameCube controller source on a PIO state machine.
//!
//! The joybus line is pulled up and only ever driven low. The state machine
//! keeps the pin's output level at 0 and toggles its direction through
//! side-set: output pulls the line down, input releases it.
//!
//! The state machine clocks at 4 MHz, so one cycle is a quarter of a
//! microsecond and every bit cell is exactly 16 cycles. The CPU hands it
//! three words (command length, command, reply length) and collects the
//! reply from the RX FIFO; the responder can preempt the CPU at any point
//! without disturbing the bits on the wire.
//!
//! # Pins
//!
//! - GPIO 2: joybus data (3.3 V, external 1 kΩ pull-up recommended)

use defmt::{debug, info};
use embassy_rp::gpio::{Level, Pull};
use embassy_rp::pio::program::pio_asm;
use embassy_rp::pio::{
    Common, Config, Direction, Instance, LoadedProgram, Pin, PioPin, ShiftConfig, ShiftDirection,
    StateMachine,
};
use embassy_rp::Peri;
use embassy_time::{Duration, Instant};
use fixed::traits::ToFixed;
use fixed_macro::types::U56F8;
use gcn64_proto::{
    command_word, decode_status, GcReport, ReportLatch, ResponseAssembler, CMD_IDENTIFY, CMD_POLL,
    IDENTIFY_REPLY_LEN, STATUS_REPLY_LEN,
};
use nes_core::{SourceAdapter, SourceError};

/// Longest a command plus reply may take. A status poll needs about 370 µs.
const EXCHANGE_TIMEOUT: Duration = Duration::from_millis(1);

/// Joybus transceiver program, loaded once per PIO block.
pub struct JoybusProgram<'d, PIO: Instance> {
    prg: LoadedProgram<'d, PIO>,
}

impl<'d, PIO: Instance> JoybusProgram<'d, PIO> {
    /// Load the program into `common`'s instruction memory.
    pub fn new(common: &mut Common<'d, PIO>) -> Self {
        // 4 cycles = 1 µs. Side-set drives the pin direction.
        let prg = pio_asm!(
            ".side_set 1 opt pindirs",
            "    pull block",                   // command bits - 1
            "    mov x, osr",
            "    pull block",                   // command, first bit in bit 31
            "send_bit:",
            "    out y, 1             side 1 [2]",
            "    jmp !y send_zero     side 1",  // 1 µs low so far
            "    jmp bit_end          side 0 [7]",
            "send_zero:",
            "    nop                  side 1 [7]", // 3 µs low
            "bit_end:",
            "    jmp x-- send_bit     side 0 [3]",
            "    nop                  side 1 [3]", // stop bit
            "    pull block           side 0",     // reply bits - 1
            "    mov x, osr",
            "receive:",
            "    wait 0 pin 0",
            "    nop                         [5]", // sample 2 µs into the cell
            "    in pins, 1",
            "    wait 1 pin 0",
            "    jmp x-- receive",
            "    push noblock",                    // partial last word
        );

        Self {
            prg: common.load_program(&prg.program),
        }
    }
}

/// GameCube controller driven over joybus.
pub struct GcPad<'d, PIO: Instance, const SM: usize> {
    sm: StateMachine<'d, PIO, SM>,
    pin: Pin<'d, PIO>,
    origin: u8,
    latch: ReportLatch,
}

impl<'d, PIO: Instance, const SM: usize> GcPad<'d, PIO, SM> {
    /// Bind `sm` to the joybus pin and start it. The line is released (high)
    /// on return.
    pub fn new(
        common: &mut Common<'d, PIO>,
        mut sm: StateMachine<'d, PIO, SM>,
        pin: Peri<'d, impl PioPin + 'd>,
        program: &JoybusProgram<'d, PIO>,
    ) -> Self {
        let mut pin = common.make_pio_pin(pin);
        pin.set_pull(Pull::Up);

        let mut cfg = Config::default();
        cfg.use_program(&program.prg, &[&pin]);
        cfg.set_in_pins(&[&pin]);
        cfg.shift_out = ShiftConfig {
            threshold: 32,
            direction: ShiftDirection::Left,
            auto_fill: false,
        };
        cfg.shift_in = ShiftConfig {
            threshold: 32,
            direction: ShiftDirection::Left,
            auto_fill: true,
        };
        cfg.clock_divider = (U56F8!(125_000_000) / U56F8!(4_000_000)).to_fixed();

        sm.set_config(&cfg);
        sm.set_pins(Level::Low, &[&pin]);
        sm.set_pin_dirs(Direction::In, &[&pin]);
        sm.set_enable(true);

        Self {
            sm,
            pin,
            origin: program.prg.origin,
            latch: ReportLatch::new(),
        }
    }

    /// Latest successfully decoded report, seen or not.
    #[inline]
    #[must_use]
    pub fn current(&self) -> &GcReport {
        self.latch.current()
    }

    /// Put the state machine back at the top of the program, line released.
    fn reset(&mut self) {
        self.sm.set_enable(false);
        self.sm.clear_fifos();
        self.sm.restart();
        self.sm.set_pin_dirs(Direction::In, &[&self.pin]);
        // SAFETY: `origin` is the first instruction of the loaded joybus program.
        unsafe { self.sm.exec_jmp(self.origin) };
        self.sm.set_enable(true);
    }

    /// Send `command`, then read an `N` byte reply.
    fn exchange<const N: usize>(&mut self, command: &[u8]) -> Result<[u8; N], SourceError> {
        self.reset();

        let tx = self.sm.tx();
        tx.push(command.len() as u32 * 8 - 1);
        tx.push(command_word(command));
        tx.push(N as u32 * 8 - 1);

        let mut assembler = ResponseAssembler::<N>::new();
        let mut remaining = N as u32 * 8;
        let deadline = Instant::now() + EXCHANGE_TIMEOUT;
        loop {
            if let Some(word) = self.sm.rx().try_pull() {
                let bits = remaining.min(32);
                remaining -= bits;
                if let Some(bytes) = assembler.push_word(word, bits) {
                    return Ok(bytes);
                }
            } else if Instant::now() >= deadline {
                return Err(if assembler.bits_received() == 0 {
                    SourceError::NoResponse
                } else {
                    SourceError::Framing
                });
            }
        }
    }
}

impl<PIO: Instance, const SM: usize> SourceAdapter for GcPad<'_, PIO, SM> {
    fn init(&mut self) {
        match self.exchange::<IDENTIFY_REPLY_LEN>(&CMD_IDENTIFY) {
            Ok(id) => info!("GameCube controller found, id {:x}", id),
            Err(e) => debug!("No answer to identify: {:?}", e),
        }
    }

    fn update(&mut self) -> Result<(), SourceError> {
        let raw = self.exchange::<STATUS_REPLY_LEN>(&CMD_POLL)?;
        let report = decode_status(&raw)?;
        self.latch.store(report);
        Ok(())
    }

    fn changed(&self) -> bool {
        self.latch.changed()
    }

    fn build_report(&mut self, report: &mut GcReport) {
        *report = self.latch.fetch();
    }
}
