//! UART.
//!
//! Four registers: transmit data, receive data, control and status. The
//! status register exposes an in-data bit (a received byte is waiting)
//! and an out-free bit (the transmitter can accept a byte, always true
//! in this model). The host side is a pair of byte queues instead of a
//! terminal: push bytes in with [`Uart::push_rx`], collect output with
//! [`Uart::take_tx`].

use std::collections::VecDeque;

/// Status bit: a received byte is waiting in the rx data register.
pub const STATUS_IN_DATA: u32 = 0x1;
/// Status bit: the transmitter can accept a byte.
pub const STATUS_OUT_FREE: u32 = 0x2;

/// Bus to and from the UART.
#[derive(Clone, Copy, Debug, Default)]
pub struct UartBus {
    /// Register address (byte offset into the window).
    pub addr: u32,
    /// Data in/out.
    pub data: u32,
    /// Interrupt output.
    pub interrupt: bool,
    /// Read request.
    pub r: bool,
    /// Write request.
    pub w: bool,
}

/// UART register file and host-side queues.
#[derive(Clone, Debug, Default)]
pub struct Uart {
    control: u32,
    status: u32,
    rx_data: u32,
    rx_queue: VecDeque<u8>,
    tx_buffer: Vec<u8>,
}

impl Uart {
    /// Creates a reset UART.
    pub fn new() -> Self {
        let mut uart = Self::default();
        uart.reset();
        uart
    }

    /// Clears the registers; queued host bytes survive.
    pub fn reset(&mut self) {
        self.control = 0;
        self.rx_data = 0;
        self.status = STATUS_OUT_FREE;
    }

    /// Queues a byte for the guest to receive.
    pub fn push_rx(&mut self, byte: u8) {
        self.rx_queue.push_back(byte);
    }

    /// Drains everything the guest has transmitted so far.
    pub fn take_tx(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.tx_buffer)
    }

    /// Services any register access and refills the rx data register.
    pub fn cycle(&mut self, bus: &mut UartBus) {
        bus.interrupt = false;

        // Move the next queued byte into the rx register once the guest
        // has consumed the previous one.
        if self.status & STATUS_IN_DATA == 0 {
            if let Some(byte) = self.rx_queue.pop_front() {
                self.rx_data = u32::from(byte);
                self.status |= STATUS_IN_DATA;
            }
        }

        if bus.w {
            match bus.addr {
                // Transmit data.
                0x0 => self.tx_buffer.push(bus.data as u8),
                // Control.
                0x8 => self.control = bus.data,
                _ => {}
            }
        }

        if bus.r {
            bus.data = match bus.addr {
                // Receive data; reading frees the buffer.
                0x4 => {
                    self.status &= !STATUS_IN_DATA;
                    self.rx_data
                }
                0x8 => self.control,
                0xC => self.status | STATUS_OUT_FREE,
                _ => 0,
            };
        }

        bus.interrupt = self.status & STATUS_IN_DATA != 0;
    }
}
