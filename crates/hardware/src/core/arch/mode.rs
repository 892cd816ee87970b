//! ARM processor modes.
//!
//! The seven modes of the ARM7 programmer's model, with discriminants equal
//! to their CPSR mode-field encodings. User and System share one register
//! bank; FIQ shadows R8-R14; IRQ, SVC, Abort and Undefined shadow R13-R14.

/// Processor mode, encoded as the CPSR mode field value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Mode {
    /// User mode: unprivileged execution.
    User = 0x10,
    /// Fast interrupt mode.
    Fiq = 0x11,
    /// Interrupt mode.
    Irq = 0x12,
    /// Supervisor mode; entered on reset and SWI.
    Svc = 0x13,
    /// Abort mode.
    Abort = 0x17,
    /// Undefined-instruction mode.
    Undef = 0x1B,
    /// System mode: privileged, sharing the User bank.
    System = 0x1F,
}

impl Mode {
    /// Decodes a CPSR mode field.
    ///
    /// # Arguments
    ///
    /// * `bits` - The low five CPSR bits.
    ///
    /// # Returns
    ///
    /// The matching mode, or `None` for the ten reserved encodings.
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits & 0x1F {
            0x10 => Some(Self::User),
            0x11 => Some(Self::Fiq),
            0x12 => Some(Self::Irq),
            0x13 => Some(Self::Svc),
            0x17 => Some(Self::Abort),
            0x1B => Some(Self::Undef),
            0x1F => Some(Self::System),
            _ => None,
        }
    }

    /// The CPSR mode-field encoding of this mode.
    #[inline]
    pub fn bits(self) -> u32 {
        self as u32
    }

    /// Whether this mode uses the shared User/System register bank.
    #[inline]
    pub fn is_user_bank(self) -> bool {
        matches!(self, Self::User | Self::System)
    }

    /// Whether this mode has its own SPSR.
    #[inline]
    pub fn has_spsr(self) -> bool {
        !self.is_user_bank()
    }

    /// Short lowercase name, as used in register dumps (`spsr_fiq` etc.).
    pub fn name(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Fiq => "fiq",
            Self::Irq => "irq",
            Self::Svc => "svc",
            Self::Abort => "abort",
            Self::Undef => "undef",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
