//! OS timer.
//!
//! A free-running counter compared against four match registers. Each
//! match with its interrupt-enable bit set latches a status bit; the
//! interrupt output is `status & enable`. Match register 3 doubles as the
//! watchdog: with the watchdog enable set, a match raises the reset line
//! instead of just interrupting.

/// Bus to and from the OS timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimerBus {
    /// Register address (byte offset into the window).
    pub addr: u32,
    /// Data in/out.
    pub data: u32,
    /// Interrupt output, one bit per timer.
    pub interrupt: u32,
    /// Watchdog reset output.
    pub reset: bool,
    /// Read request.
    pub r: bool,
    /// Write request.
    pub w: bool,
}

const R_OSMR0: usize = 0x0;
const R_OSMR3: usize = 0x3;
const R_OSCR: usize = 0x4;
const R_OSSR: usize = 0x5;
const R_OWER: usize = 0x6;
const R_OIER: usize = 0x7;

/// OS timer register file.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsTimer {
    regs: [u32; 8],
}

impl OsTimer {
    /// Creates a reset timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all registers.
    pub fn reset(&mut self) {
        self.regs = [0; 8];
    }

    /// Advances the timer one cycle and services any register access.
    pub fn cycle(&mut self, bus: &mut TimerBus) {
        bus.interrupt = 0;
        bus.reset = false;

        if bus.w {
            match (bus.addr >> 2) as usize {
                // Match registers.
                idx @ R_OSMR0..=R_OSMR3 => self.regs[idx] = bus.data,
                // Status register: write-one-to-clear.
                R_OSSR => {
                    for i in 0..4 {
                        if bus.data >> i & 0x1 != 0 {
                            self.regs[R_OSSR] &= !(0x1 << i);
                        }
                    }
                }
                R_OWER => self.regs[R_OWER] = bus.data & 0x0000_0001,
                R_OIER => self.regs[R_OIER] = bus.data & 0x0000_000F,
                _ => {}
            }
        }

        self.regs[R_OSCR] = self.regs[R_OSCR].wrapping_add(1);

        for i in 0..4 {
            if self.regs[R_OSMR0 + i] == self.regs[R_OSCR] && self.regs[R_OIER] >> i & 0x1 != 0 {
                self.regs[R_OSSR] |= 0x1 << i;
            }
        }

        bus.interrupt = self.regs[R_OSSR] & self.regs[R_OIER];

        // Watchdog: a match on MR3 with the enable set pulls reset.
        if self.regs[R_OSMR3] == self.regs[R_OSCR] && self.regs[R_OWER] != 0 {
            bus.reset = true;
        }

        if bus.r {
            bus.data = self.regs[(bus.addr >> 2) as usize & 0x7];
        }
    }
}
