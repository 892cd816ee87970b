//! On-chip peripheral models.
//!
//! Register-level models of the peripherals the wrapper maps into the
//! high address space. Each exposes the same contract: a per-device bus
//! struct carrying an optional address/data/read/write request in and
//! data plus interrupt/reset lines out, consumed once per processor cycle
//! through `cycle(&mut bus)`.

/// Interrupt controller.
pub mod intctrl;
/// LCD controller.
pub mod lcd;
/// OS timer.
pub mod ostimer;
/// UART.
pub mod uart;

pub use intctrl::{IntCtrl, IntCtrlBus};
pub use lcd::{LcdBus, LcdCtrl};
pub use ostimer::{OsTimer, TimerBus};
pub use uart::{Uart, UartBus};
