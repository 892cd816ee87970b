//! Bus signal records.
//!
//! Plain fixed-width snapshots of the signals crossing each boundary once per
//! cycle. They carry no behaviour and no persistent identity: the owning side
//! keeps a current/previous pair purely for edge detection.
//!
//! Interrupt lines follow the hardware convention and are active-low: `true`
//! means the line is high (inactive), `false` means the interrupt is asserted.

/// Transfer width on the data bus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Width {
    /// 32-bit word transfer.
    #[default]
    Word,
    /// 8-bit transfer; stores replicate the byte across all four lanes.
    Byte,
    /// 16-bit transfer; stores replicate the half-word across both lanes.
    Half,
}

/// Signals into and out of the processor core.
///
/// One instance is owned by the wrapper and handed to [`crate::core::Core::cycle`]
/// every cycle; the core reads the input half (din, interrupt levels,
/// coprocessor replies) and drives the output half (address, dout, control).
/// `Default` is the idle bus: interrupt lines high, no coprocessor busy.
#[derive(Clone, Copy, Debug)]
pub struct CoreBus {
    /// Address bus.
    pub a: u32,
    /// Data in (memory/coprocessor to core).
    pub din: u32,
    /// Data out (core to memory/coprocessor).
    pub dout: u32,
    /// Read/write select; `true` = write.
    pub rw: bool,
    /// Transfer width for the current bus request.
    pub bw: Width,
    /// IRQ level (active-low).
    pub irq: bool,
    /// FIQ level (active-low).
    pub fiq: bool,
    /// Marks the transfer as coprocessor-space rather than memory-space.
    pub enout: bool,
    /// Instruction-pipe advance marker; coprocessors shadow-decode on it.
    pub opc: bool,
    /// Coprocessor instruction request.
    pub cpi: bool,
    /// Coprocessor absent/abort reply; stays high when no coprocessor claims
    /// the instruction.
    pub cpa: bool,
    /// Coprocessor busy reply (active-low: `false` = busy).
    pub cpb: bool,
    /// Fetch kind of the current bus request; `true` = instruction fetch.
    pub di: bool,
    /// Emulator hook: a host SWI callback ran this cycle and the wrapper
    /// must invalidate the caches.
    pub swi_flush: bool,
}

impl Default for CoreBus {
    fn default() -> Self {
        Self {
            a: 0,
            din: 0,
            dout: 0,
            rw: false,
            bw: Width::Word,
            irq: true,
            fiq: true,
            enout: false,
            opc: false,
            cpi: false,
            cpa: true,
            cpb: true,
            di: false,
            swi_flush: false,
        }
    }
}

/// Signals between the core and the coprocessor slots.
///
/// `Default` is the idle bus: interrupt lines high, no request, not busy.
#[derive(Clone, Copy, Debug)]
pub struct CoproBus {
    /// Data in (core to coprocessor).
    pub din: u32,
    /// Data out (coprocessor to core).
    pub dout: u32,
    /// IRQ level (active-low).
    pub irq: bool,
    /// FIQ level (active-low).
    pub fiq: bool,
    /// Instruction-pipe advance marker, mirrored from the core bus.
    pub opc: bool,
    /// Coprocessor instruction request.
    pub cpi: bool,
    /// Absent/abort reply; a coprocessor pulls this low to acknowledge.
    pub cpa: bool,
    /// Busy reply (active-low: `false` = busy).
    pub cpb: bool,
    /// Data-out valid this cycle.
    pub dw: bool,
}

impl Default for CoproBus {
    fn default() -> Self {
        Self {
            din: 0,
            dout: 0,
            irq: true,
            fiq: true,
            opc: false,
            cpi: false,
            cpa: true,
            cpb: true,
            dw: false,
        }
    }
}

/// External pin-out serviced by the driver's memory model each cycle.
#[derive(Clone, Copy, Debug)]
pub struct Pinout {
    /// Address bus.
    pub address: u32,
    /// Data bus (driver supplies reads here, wrapper supplies writes).
    pub data: u32,
    /// FIQ line (active-low).
    pub fiq: bool,
    /// IRQ line (active-low).
    pub irq: bool,
    /// Read/write select; `true` = write.
    pub rw: bool,
    /// Bus enable; the driver only services the pins when set.
    pub benable: bool,
    /// Transfer width.
    pub bw: Width,
}

impl Default for Pinout {
    /// Idle pin state: interrupt lines high, bus disabled.
    fn default() -> Self {
        Self {
            address: 0,
            data: 0,
            fiq: true,
            irq: true,
            rw: false,
            benable: false,
            bw: Width::Word,
        }
    }
}
