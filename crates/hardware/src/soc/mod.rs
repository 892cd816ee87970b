//! Processor wrapper and bus sequencer.
//!
//! [`ArmProcessor`] glues the core, the caches, the coprocessor slots and
//! the on-chip peripherals together, one real bus cycle at a time. It
//! provides:
//! 1. **Bus sequencing:** The {Normal, ReadLineSetup, ReadLine, WriteWord,
//!    InternalWrite} state machine: cache lookups, the multi-cycle line
//!    fill, write-through stores, peripheral-window writes.
//! 2. **Peripheral fabric:** Address-window routing and the fixed cycle
//!    order timer → LCD → UART → interrupt controller → core →
//!    coprocessors.
//! 3. **Interrupt plumbing:** Pin levels gated through the interrupt
//!    controller, with pin drops latched across line fills so the core
//!    never misses an edge while stalled.

/// Coprocessor interface and the system coprocessor.
pub mod copro;
/// On-chip peripheral models.
pub mod devices;

pub use copro::{CacheOp, CacheTarget, Coprocessor, CoproEvent, SysControl};

use tracing::trace;

use crate::common::bus::{CoproBus, CoreBus, Pinout, Width};
use crate::common::error::RegistrationError;
use crate::config::defaults::{LINE_WORDS, MAX_COPRO_ID};
use crate::config::Config;
use crate::core::Core;
use crate::core::units::cache::{Cache, build_cache};
use crate::stats::SimStats;
use devices::{IntCtrl, IntCtrlBus, LcdBus, LcdCtrl, OsTimer, TimerBus, Uart, UartBus};

/// OS timer window base (64 KiB window).
const TIMER_BASE: u32 = 0x9000_0000;
/// Interrupt controller window base (64 KiB window).
const INTCTRL_BASE: u32 = 0x9005_0000;
/// UART window base (4 KiB window).
const UART_BASE: u32 = 0x9008_1000;
/// LCD controller window base (1 MiB window).
const LCD_BASE: u32 = 0x9010_0000;

/// Coprocessor slot conventionally holding the system coprocessor.
const SYS_COPRO_SLOT: usize = 15;

/// Interrupt-controller source bit positions.
const INT_TIMER_SHIFT: u32 = 26;
const INT_LCD_BIT: u32 = 1 << 25;
const INT_UART_BIT: u32 = 1 << 24;

/// Bus sequencer state, held across `cycle` calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum BusState {
    /// Serving cache hits and internal-space accesses, one per cycle.
    #[default]
    Normal,
    /// Acquiring the external bus for a line fill.
    ReadLineSetup,
    /// Fetching the line, one word per cycle.
    ReadLine,
    /// Driving a write-through store on the external bus.
    WriteWord,
    /// Routing a store into the peripheral register windows.
    InternalWrite,
}

/// The processor: core, caches, coprocessors and on-chip peripherals.
#[derive(Debug)]
pub struct ArmProcessor {
    core: Core,
    icache: Option<Box<dyn Cache>>,
    dcache: Box<dyn Cache>,

    core_bus: CoreBus,
    copro_bus: CoproBus,
    copros: [Option<Box<dyn Coprocessor>>; 16],

    ostimer: OsTimer,
    intctrl: IntCtrl,
    lcd: LcdCtrl,
    uart: Uart,
    timer_bus: TimerBus,
    ic_bus: IntCtrlBus,
    lcd_bus: LcdBus,
    uart_bus: UartBus,

    state: BusState,
    addr_prev: u32,
    nread: usize,
    line: [u32; LINE_WORDS],
    pending_fiq: bool,
    pending_irq: bool,

    bus_speed: u64,
    stats: SimStats,
}

impl ArmProcessor {
    /// Builds a processor from the configuration.
    ///
    /// The system coprocessor is installed in slot 15; the other fifteen
    /// slots start empty.
    pub fn new(config: &Config) -> Self {
        let cache_cfg = &config.cache;
        let icache = if cache_cfg.unified {
            None
        } else {
            Some(build_cache(
                cache_cfg.kind,
                cache_cfg.icache_size,
                cache_cfg.ways,
            ))
        };
        let dcache = build_cache(cache_cfg.kind, cache_cfg.dcache_size, cache_cfg.ways);

        let mut copros: [Option<Box<dyn Coprocessor>>; 16] = std::array::from_fn(|_| None);
        copros[SYS_COPRO_SLOT] = Some(Box::new(SysControl::new()));

        Self {
            core: Core::new(),
            icache,
            dcache,
            core_bus: CoreBus::default(),
            copro_bus: CoproBus::default(),
            copros,
            ostimer: OsTimer::new(),
            intctrl: IntCtrl::new(),
            lcd: LcdCtrl::new(),
            uart: Uart::new(),
            timer_bus: TimerBus::default(),
            ic_bus: IntCtrlBus::default(),
            lcd_bus: LcdBus::default(),
            uart_bus: UartBus::default(),
            state: BusState::Normal,
            addr_prev: 0,
            nread: 0,
            line: [0; LINE_WORDS],
            pending_fiq: false,
            pending_irq: false,
            bus_speed: config.bus.speed,
            stats: SimStats::default(),
        }
    }

    /// Resets the whole processor: core, caches, peripherals, buses and
    /// the bus sequencer. Safe at any cycle boundary.
    pub fn reset(&mut self) {
        self.core.reset();
        if let Some(icache) = self.icache.as_deref_mut() {
            icache.reset();
        }
        self.dcache.reset();
        for copro in self.copros.iter_mut().flatten() {
            copro.reset();
        }
        self.ostimer.reset();
        self.intctrl.reset();
        self.lcd.reset();
        self.uart.reset();
        self.timer_bus = TimerBus::default();
        self.ic_bus = IntCtrlBus::default();
        self.lcd_bus = LcdBus::default();
        self.uart_bus = UartBus::default();
        self.state = BusState::Normal;
        self.pending_fiq = false;
        self.pending_irq = false;
    }

    /// The cache serving a request of the given fetch kind.
    fn cache_for(&mut self, instruction: bool) -> &mut dyn Cache {
        if instruction {
            if let Some(icache) = self.icache.as_deref_mut() {
                return icache;
            }
        }
        self.dcache.as_mut()
    }

    /// Reports a cache event into the system coprocessor's counters.
    fn note_cache_event(&mut self, event: CoproEvent) {
        if let Some(sys) = self.copros[SYS_COPRO_SLOT].as_deref_mut() {
            sys.note_event(event);
        }
    }

    /// Applies cache-maintenance requests queued by coprocessors.
    fn drain_cache_ops(&mut self) {
        for slot in 0..self.copros.len() {
            loop {
                let Some(op) = self
                    .copros[slot]
                    .as_deref_mut()
                    .and_then(Coprocessor::take_cache_op)
                else {
                    break;
                };

                trace!(?op, "cache maintenance");
                let (inst, data) = match op.target {
                    CacheTarget::Instruction => (true, false),
                    CacheTarget::Data => (false, true),
                    CacheTarget::Unified => (true, true),
                };
                if inst {
                    match op.line {
                        Some(addr) => self.cache_for(true).invalidate_line_by_addr(addr),
                        None => self.cache_for(true).reset(),
                    }
                }
                if data && (!inst || self.icache.is_some()) {
                    match op.line {
                        Some(addr) => self.cache_for(false).invalidate_line_by_addr(addr),
                        None => self.cache_for(false).reset(),
                    }
                }
            }
        }
    }

    /// Cycles the on-chip fabric once: peripherals, interrupt gating, the
    /// core, then every coprocessor slot.
    fn atomic_cycle(&mut self, pinout: &Pinout) {
        // The coprocessor bus wants the data word that was on the core
        // bus when the instruction was fetched.
        let din_before = self.core_bus.din;

        self.ic_bus.int_bits = 0;

        self.ostimer.cycle(&mut self.timer_bus);
        if self.timer_bus.interrupt != 0 {
            self.ic_bus.int_bits |= self.timer_bus.interrupt << INT_TIMER_SHIFT;
        }

        self.lcd.cycle(&mut self.lcd_bus);
        if self.lcd_bus.interrupt {
            self.ic_bus.int_bits |= INT_LCD_BIT;
        }

        self.uart.cycle(&mut self.uart_bus);
        if self.uart_bus.interrupt {
            self.ic_bus.int_bits |= INT_UART_BIT;
        }

        self.intctrl.cycle(&mut self.ic_bus);

        // Requests are one-shot; the next ones are generated below.
        self.timer_bus.r = false;
        self.timer_bus.w = false;
        self.ic_bus.r = false;
        self.ic_bus.w = false;
        self.lcd_bus.r = false;
        self.lcd_bus.w = false;
        self.uart_bus.r = false;
        self.uart_bus.w = false;

        // Interrupt lines are active-low: both the pin and the controller
        // must be quiet for the core to see a high level.
        self.core_bus.fiq = pinout.fiq && self.ic_bus.fiq;
        self.core_bus.irq = pinout.irq && self.ic_bus.irq;
        self.copro_bus.fiq = self.core_bus.fiq;
        self.copro_bus.irq = self.core_bus.irq;

        // A coprocessor drove data for the core (MRC) last cycle.
        if self.copro_bus.dw && self.core_bus.enout {
            self.core_bus.din = self.copro_bus.dout;
        }

        // Reads from the peripheral windows land on the core's data bus.
        let a = self.core_bus.a;
        if a & 0x8000_0000 != 0 {
            if a & 0xFFFF_0000 == INTCTRL_BASE {
                self.core_bus.din = self.ic_bus.data;
            } else if a & 0xFFFF_0000 == TIMER_BASE {
                self.core_bus.din = self.timer_bus.data;
            } else if a & 0xFFFF_F000 == UART_BASE {
                self.core_bus.din = self.uart_bus.data;
            } else if a & 0xFFF0_0000 == LCD_BASE {
                self.core_bus.din = self.lcd_bus.data;
            }
        }

        self.core.cycle(&mut self.core_bus);
        self.stats.core_cycles += 1;

        // Mirror the handshake onto the coprocessor bus and cycle every
        // slot; the last word on the data bus rides along for shadow
        // decode and MCR transfers.
        self.copro_bus.opc = self.core_bus.opc;
        self.copro_bus.cpi = self.core_bus.cpi;
        self.copro_bus.cpa = self.core_bus.cpa;
        self.copro_bus.cpb = true;
        self.copro_bus.dw = false;
        self.copro_bus.din = if self.core_bus.rw {
            if self.core_bus.opc {
                din_before
            } else {
                self.core_bus.dout
            }
        } else {
            self.core_bus.din
        };

        for copro in self.copros.iter_mut().flatten() {
            copro.cycle(&mut self.copro_bus);
        }

        self.core_bus.cpa = self.copro_bus.cpa;
        self.core_bus.cpb = self.copro_bus.cpb;

        // A coprocessor drove data for memory (STC) this cycle.
        if self.copro_bus.dw && !self.core_bus.enout {
            self.core_bus.dout = self.copro_bus.dout;
        }

        self.drain_cache_ops();
    }

    /// Runs one real bus cycle.
    ///
    /// The driver presents the previous cycle's bus reply in `pinout` and
    /// services whatever request is left on it afterwards.
    pub fn cycle(&mut self, pinout: &mut Pinout) {
        match self.state {
            BusState::Normal => self.cycle_normal(pinout),
            BusState::ReadLineSetup => self.cycle_read_setup(pinout),
            BusState::ReadLine => self.cycle_read_line(pinout),
            BusState::WriteWord => self.cycle_write_word(pinout),
            BusState::InternalWrite => self.cycle_internal_write(pinout),
        }

        self.stats.real_cycles += 1;
    }

    fn cycle_normal(&mut self, pinout: &mut Pinout) {
        // Replay interrupt pin drops latched while the bus was busy.
        if self.pending_fiq {
            pinout.fiq = false;
            self.pending_fiq = false;
        }
        if self.pending_irq {
            pinout.irq = false;
            self.pending_irq = false;
        }

        let addr = self.core_bus.a & 0xFFFF_FFFC;

        if addr & 0x8000_0000 == 0 {
            // Memory space: this must be a read; memory writes were
            // diverted to the write states last cycle. A coprocessor
            // transfer may leave rw high with enout set; the lookup is
            // harmless there and the data gets overridden by the
            // coprocessor mux.
            debug_assert!(
                !self.core_bus.rw || self.core_bus.enout,
                "memory write reached the Normal state"
            );

            let instruction = self.core_bus.di;
            match self.cache_for(instruction).read(addr >> 2) {
                Ok(word) => {
                    self.stats.cache_hits += 1;
                    self.note_cache_event(CoproEvent::CacheHit);
                    self.core_bus.din = word;
                }
                Err(_) => {
                    trace!(addr = format_args!("{:#010x}", addr), "cache miss");

                    // The core will not be clocked while the line streams
                    // in; note any interrupt pin drops ourselves.
                    if !pinout.fiq {
                        self.pending_fiq = true;
                    }
                    if !pinout.irq {
                        self.pending_irq = true;
                    }

                    self.stats.cache_misses += 1;
                    self.note_cache_event(CoproEvent::CacheMiss);
                    self.state = BusState::ReadLineSetup;
                    return;
                }
            }
        }

        // Sub-word extraction, and the unaligned-word rotate that brings
        // the addressed byte into the low lane.
        match self.core_bus.bw {
            Width::Word => {
                let rot = self.core_bus.a & 0x0000_0003;
                self.core_bus.din = self.core_bus.din.rotate_right(rot * 8);
            }
            Width::Byte => {
                let byte = self.core_bus.a & 0x0000_0003;
                self.core_bus.din = (self.core_bus.din >> (8 * byte)) & 0x0000_00FF;
            }
            Width::Half => {
                if self.core_bus.a & 0x0000_0002 != 0 {
                    self.core_bus.din >>= 16;
                } else {
                    self.core_bus.din &= 0x0000_FFFF;
                }
            }
        }

        self.atomic_cycle(pinout);

        // A host SWI ran: invalidate the caches behind it.
        if self.core_bus.swi_flush {
            if let Some(icache) = self.icache.as_deref_mut() {
                icache.reset();
            }
            self.dcache.reset();
            self.core_bus.swi_flush = false;
        }

        // Find out how the next cycle is going to go.
        let a = self.core_bus.a;
        if a & 0x8000_0000 != 0 {
            if self.core_bus.rw && !self.core_bus.enout {
                self.addr_prev = a;
                self.state = BusState::InternalWrite;
            }
            if !self.core_bus.rw && !self.core_bus.enout {
                self.route_internal_read(a);
            }
        } else if self.core_bus.rw && !self.core_bus.enout {
            self.addr_prev = a;
            self.state = BusState::WriteWord;
        }

        pinout.benable = false;
    }

    /// Posts a read request to whichever peripheral owns the window.
    fn route_internal_read(&mut self, a: u32) {
        if a & 0xFFFF_0000 == INTCTRL_BASE {
            self.ic_bus.addr = a & 0x0000_FFFF;
            self.ic_bus.r = true;
        } else if a & 0xFFFF_0000 == TIMER_BASE {
            self.timer_bus.addr = a & 0x0000_FFFF;
            self.timer_bus.r = true;
        } else if a & 0xFFFF_F000 == UART_BASE {
            self.uart_bus.addr = a & 0x0000_0FFF;
            self.uart_bus.r = true;
        } else if a & 0xFFF0_0000 == LCD_BASE {
            self.lcd_bus.addr = a & 0x000F_FFFF;
            self.lcd_bus.r = true;
        }
    }

    fn cycle_read_setup(&mut self, pinout: &mut Pinout) {
        self.nread = 0;

        if !pinout.fiq {
            self.pending_fiq = true;
        }
        if !pinout.irq {
            self.pending_irq = true;
        }

        pinout.address = self.core_bus.a & 0xFFFF_FFF0;
        pinout.rw = false;
        pinout.benable = true;
        self.state = BusState::ReadLine;

        // Bus acquisition penalty.
        self.stats.real_cycles += self.bus_speed;
    }

    fn cycle_read_line(&mut self, pinout: &mut Pinout) {
        self.line[self.nread] = pinout.data;
        self.nread += 1;

        if !pinout.fiq {
            self.pending_fiq = true;
        }
        if !pinout.irq {
            self.pending_irq = true;
        }

        if self.nread < LINE_WORDS {
            // Set up to read the next word of the line.
            pinout.address = (self.core_bus.a & 0xFFFF_FFF0) + (self.nread as u32 * 4);
            pinout.rw = false;
            pinout.benable = true;
        } else {
            let line = self.line;
            let instruction = self.core_bus.di;
            let line_index = (self.core_bus.a & 0xFFFF_FFF0) >> 2;
            self.cache_for(instruction)
                .write_line(line_index, &line);
            self.stats.line_fills += 1;

            pinout.benable = false;
            self.state = BusState::Normal;
        }

        // Per-word transfer penalty.
        self.stats.real_cycles += self.bus_speed;
    }

    fn cycle_write_word(&mut self, pinout: &mut Pinout) {
        // The width belongs to the store that requested this write, so it
        // is sampled before the core moves on.
        pinout.bw = self.core_bus.bw;

        self.atomic_cycle(pinout);

        // Drive the real bus write.
        pinout.benable = true;
        pinout.address = self.addr_prev;
        pinout.data = self.core_bus.dout;
        pinout.rw = true;

        self.stats.real_cycles += 2 * self.bus_speed;
        self.stats.bus_writes += 1;

        // Back-to-back stores chain through this state.
        if self.core_bus.rw && !self.core_bus.enout {
            self.addr_prev = self.core_bus.a;
            self.state = BusState::WriteWord;
        } else {
            self.state = BusState::Normal;
        }

        // Write through the cache: patch the word only if its line is
        // resident; a miss allocates nothing.
        let instruction = self.core_bus.di;
        let word_addr = pinout.address >> 2;
        let lane_shift = (pinout.address & 0x3) * 8;
        let data = pinout.data;
        let bw = pinout.bw;
        let cache = self.cache_for(instruction);
        if let Ok(old) = cache.read(word_addr) {
            let merged = match bw {
                Width::Word => data,
                Width::Byte => {
                    let mask = !(0xFFu32 << lane_shift);
                    (old & mask) | ((data << lane_shift) & !mask)
                }
                Width::Half => {
                    if pinout.address & 0x0000_0002 == 0 {
                        (old & 0xFFFF_0000) | (data & 0x0000_FFFF)
                    } else {
                        (old & 0x0000_FFFF) | (data << 16)
                    }
                }
            };
            let _ = cache.write_word(word_addr, merged);
        }
    }

    fn cycle_internal_write(&mut self, pinout: &mut Pinout) {
        self.atomic_cycle(pinout);

        // Peripheral writes never touch the external bus.
        pinout.benable = false;

        let a = self.addr_prev;
        let data = self.core_bus.dout;
        if a & 0xFFFF_0000 == INTCTRL_BASE {
            self.ic_bus.addr = a & 0x0000_FFFF;
            self.ic_bus.w = true;
            self.ic_bus.data = data;
        } else if a & 0xFFFF_0000 == TIMER_BASE {
            self.timer_bus.addr = a & 0x0000_FFFF;
            self.timer_bus.w = true;
            self.timer_bus.data = data;
        } else if a & 0xFFFF_F000 == UART_BASE {
            self.uart_bus.addr = a & 0x0000_0FFF;
            self.uart_bus.w = true;
            self.uart_bus.data = data;
        } else if a & 0xFFF0_0000 == LCD_BASE {
            self.lcd_bus.addr = a & 0x000F_FFFF;
            self.lcd_bus.w = true;
            self.lcd_bus.data = data;
        }

        self.state = BusState::Normal;
    }

    /// Registers an external coprocessor.
    ///
    /// # Arguments
    ///
    /// * `id`    - Slot number, 0 through 14 (15 is the system slot).
    /// * `copro` - The coprocessor.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::InvalidCoproId`] for out-of-range slots,
    /// [`RegistrationError::CoproSlotOccupied`] for occupied ones.
    pub fn register_coprocessor(
        &mut self,
        id: u32,
        copro: Box<dyn Coprocessor>,
    ) -> Result<(), RegistrationError> {
        if id > MAX_COPRO_ID {
            return Err(RegistrationError::InvalidCoproId(id));
        }
        let slot = &mut self.copros[id as usize];
        if slot.is_some() {
            return Err(RegistrationError::CoproSlotOccupied(id));
        }
        *slot = Some(copro);
        Ok(())
    }

    /// Removes an external coprocessor.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::InvalidCoproId`] for out-of-range slots.
    pub fn unregister_coprocessor(&mut self, id: u32) -> Result<(), RegistrationError> {
        if id > MAX_COPRO_ID {
            return Err(RegistrationError::InvalidCoproId(id));
        }
        self.copros[id as usize] = None;
        Ok(())
    }

    /// The processor core.
    #[inline]
    pub fn core(&self) -> &Core {
        &self.core
    }

    /// Mutable access to the core (SWI registration, test setup).
    #[inline]
    pub fn core_mut(&mut self) -> &mut Core {
        &mut self.core
    }

    /// The UART, for host-side byte exchange.
    #[inline]
    pub fn uart_mut(&mut self) -> &mut Uart {
        &mut self.uart
    }

    /// Accumulated statistics.
    #[inline]
    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Real bus cycles elapsed, including wait states.
    #[inline]
    pub fn real_cycles(&self) -> u64 {
        self.stats.real_cycles
    }

    /// Formats processor-wide state for diagnostics.
    pub fn debug_dump(&self) -> String {
        let mut out = self.core.debug_dump();
        for copro in self.copros.iter().flatten() {
            let dump = copro.debug_dump();
            if !dump.is_empty() {
                out.push('\n');
                out.push_str(&dump);
            }
        }
        out
    }
}
