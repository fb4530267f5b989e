//! Protocol catalog: line codes of the supported sensor families.
//!
//! Each supported protocol is described by a [`ProtocolDescriptor`]: the bit
//! patterns substituted for a payload `0` and `1`, a window into the shared
//! preamble pool, and the tick period every output bit is held for.
//!
//! Symbols are pulse-width or Manchester style codes, sampled at a multiple of
//! the protocol's native bit rate. For example, Oregon Scientific 1.0 runs at
//! 4x 342 Hz, so a payload `0` becomes `0011` (off-off-on-on) and a `1` becomes
//! `1100`.
//!
//! Preambles are stored pre-shifted: their bytes are clocked out verbatim,
//! MSB first, with no symbol substitution.
//!
//! ## Supported protocols
//!
//! | Index | Protocol                                             |
//! |-------|------------------------------------------------------|
//! | 0     | Oregon Scientific 1.0                                |
//! | 1     | Oregon Scientific 2.1                                |
//! | 2     | Oregon Scientific 3.0                                |
//! | 3     | AcuRite PSM (00955, 00782W3, 00606TX), OS SL-109H    |
//! | 4     | AcuRite PSM 00964TX                                  |
//! | 5     | AcuRite PSM 00609A1TX                                |
//! | 6     | Ambient Weather F007TH                               |
//! | 7     | Ambient Weather WH2B                                 |
//! | 8     | AcuRite PWM (VN1TX, 00592TXR)                        |

use crate::timer::{hz_to_ticks, us_to_ticks};

/// Longest supported symbol, in bits.
///
/// Patterns hold 8 bits; bits past the eighth are shifted out as zeros.
pub const SYMBOL_MAX_BITS: u8 = 9;

/// The bit code substituted for a single payload bit.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Symbol {
    /// Number of output bits this symbol occupies.
    pub len: u8,
    /// The code, MSB aligned.
    pub bits: u8,
}

impl Symbol {
    /// Creates a symbol of `len` bits whose code is the top bits of `bits`.
    pub const fn new(len: u8, bits: u8) -> Self {
        Self { len, bits }
    }
}

/// Immutable description of one radio protocol.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct ProtocolDescriptor {
    /// Code emitted for a payload `0`.
    pub zero: Symbol,
    /// Code emitted for a payload `1`.
    pub one: Symbol,
    /// Offset of this protocol's preamble in the preamble pool.
    pub preamble_offset: u8,
    /// Length of this protocol's preamble, in bytes.
    pub preamble_len: u8,
    /// Timer compare value the shift clock must be programmed with.
    pub tick_period: u8,
}

/// A table of protocols sharing one preamble pool.
#[derive(Debug)]
pub struct Catalog {
    protocols: &'static [ProtocolDescriptor],
    preambles: &'static [u8],
}

impl Catalog {
    /// Creates a catalog, checking that every preamble window lies within
    /// `preambles` and ends at or before byte 255, and that every symbol length
    /// is in `1..=SYMBOL_MAX_BITS`.
    ///
    /// # Panics
    /// Panics if the table is empty or an invariant does not hold. When used to
    /// initialize a `static`, the check happens at compile time.
    pub const fn new(protocols: &'static [ProtocolDescriptor], preambles: &'static [u8]) -> Self {
        assert!(!protocols.is_empty(), "catalog must hold at least one protocol");
        let mut i = 0;
        while i < protocols.len() {
            let p = &protocols[i];
            assert!(
                p.preamble_offset as usize + p.preamble_len as usize <= preambles.len(),
                "preamble window out of bounds"
            );
            // The encoder's u8 cursor ends one past the window
            assert!(
                p.preamble_offset as usize + p.preamble_len as usize <= u8::MAX as usize,
                "preamble window ends past byte 255"
            );
            assert!(p.zero.len >= 1 && p.zero.len <= SYMBOL_MAX_BITS, "bad zero symbol length");
            assert!(p.one.len >= 1 && p.one.len <= SYMBOL_MAX_BITS, "bad one symbol length");
            i += 1;
        }
        Self {
            protocols,
            preambles,
        }
    }

    /// Number of protocols in the catalog.
    pub const fn len(&self) -> usize {
        self.protocols.len()
    }

    /// Always `false`; catalogs cannot be empty.
    pub const fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }

    /// Returns the descriptor at `index`, wrapping out-of-range selectors back
    /// into the table.
    ///
    /// The selector comes straight from the host, so it is never rejected.
    pub fn descriptor_for(&self, index: u8) -> &ProtocolDescriptor {
        &self.protocols[index as usize % self.protocols.len()]
    }

    /// The preamble bytes of `descriptor`.
    pub fn preamble(&self, descriptor: &ProtocolDescriptor) -> &[u8] {
        let start = descriptor.preamble_offset as usize;
        &self.preambles[start..start + descriptor.preamble_len as usize]
    }

    /// A single byte of the preamble pool.
    pub(crate) fn preamble_byte(&self, pos: u8) -> u8 {
        self.preambles[pos as usize]
    }
}

/// Selector values of the built-in protocols.
#[repr(u8)]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Protocol {
    /// Oregon Scientific 1.0
    OregonScientific10 = 0,
    /// Oregon Scientific 2.1
    OregonScientific21 = 1,
    /// Oregon Scientific 3.0
    OregonScientific30 = 2,
    /// Oregon Scientific SL-109H and AcuRite PSM (00955, 00782W3, 00606TX)
    AcuritePsm = 3,
    /// AcuRite PSM 00964TX
    Acurite00964Tx = 4,
    /// AcuRite PSM 00609A1TX
    Acurite00609A1Tx = 5,
    /// Ambient Weather F007TH
    AmbientF007Th = 6,
    /// Ambient Weather WH2B
    AmbientWh2b = 7,
    /// AcuRite PWM (VN1TX, 00592TXR)
    AcuritePwm = 8,
}

impl Protocol {
    /// All built-in protocols, in selector order.
    pub const ALL: [Protocol; 9] = [
        Protocol::OregonScientific10,
        Protocol::OregonScientific21,
        Protocol::OregonScientific30,
        Protocol::AcuritePsm,
        Protocol::Acurite00964Tx,
        Protocol::Acurite00609A1Tx,
        Protocol::AmbientF007Th,
        Protocol::AmbientWh2b,
        Protocol::AcuritePwm,
    ];

    /// Resolves a host selector with the same wraparound as [`Catalog::descriptor_for`].
    pub fn from_selector(selector: u8) -> Self {
        Self::ALL[selector as usize % Self::ALL.len()]
    }

    /// The selector byte for this protocol.
    pub fn selector(self) -> u8 {
        self as u8
    }

    /// The descriptor of this protocol in the built-in [`CATALOG`].
    pub fn descriptor(self) -> &'static ProtocolDescriptor {
        CATALOG.descriptor_for(self.selector())
    }
}

/// Oregon Scientific 1.0: 4x 342 Hz.
pub const OS10_TICKS: u8 = hz_to_ticks(342 * 4);
/// Oregon Scientific 2.1: 2x 1024 Hz.
pub const OS21_TICKS: u8 = hz_to_ticks(1024 * 2);
/// Oregon Scientific 3.0: 2x 1024 Hz.
pub const OS30_TICKS: u8 = hz_to_ticks(1024 * 2);
/// AcuRite PSM family and Oregon Scientific SL-109H: 500 µs.
pub const AR_PSM_TICKS: u8 = us_to_ticks(500);
/// Ambient Weather F007TH: 2x 1024 Hz.
pub const AWF_TICKS: u8 = hz_to_ticks(1024 * 2);
/// Ambient Weather WH2B: 500 µs.
pub const AW2B_TICKS: u8 = us_to_ticks(500);
/// AcuRite PWM: 3x 1600 Hz.
pub const AR_PWM_TICKS: u8 = hz_to_ticks(1600 * 3);

const OS10_PREAMBLE: (u8, u8) = (0, 9);
const OS21_PREAMBLE: (u8, u8) = (OS10_PREAMBLE.0 + OS10_PREAMBLE.1, 10);
const OS30_PREAMBLE: (u8, u8) = (OS21_PREAMBLE.0 + OS21_PREAMBLE.1, 7);
const AR_PREAMBLE: (u8, u8) = (OS30_PREAMBLE.0 + OS30_PREAMBLE.1, 3);
const AW2B_PREAMBLE: (u8, u8) = (AR_PREAMBLE.0 + AR_PREAMBLE.1, 3);
const AWF_PREAMBLE: (u8, u8) = (AW2B_PREAMBLE.0 + AW2B_PREAMBLE.1, 4);
const AR964_PREAMBLE: (u8, u8) = (AWF_PREAMBLE.0 + AWF_PREAMBLE.1, 3);
const AR_PSM_PREAMBLE: (u8, u8) = (AR964_PREAMBLE.0 + AR964_PREAMBLE.1, 2);

/// Length of the built-in preamble pool.
pub const PREAMBLE_POOL_LEN: usize = (AR_PSM_PREAMBLE.0 + AR_PSM_PREAMBLE.1) as usize;

/// Preamble patterns of the built-in protocols, shifted out raw, MSB first.
pub static PREAMBLES: [u8; PREAMBLE_POOL_LEN] = [
    // os10: 12 1 bits, then sync of 4386us off, 5848us on, 5117us off
    0x06, 0x66, 0x66, 0x66, 0x66, 0x66, 0x60, 0x7f, 0x80,
    // os21: 16 1 bits then LSB first 1010
    0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x96, 0x96,
    // os30: 24 1 bits then LSB first 1010
    0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x66,
    // ar: 620uS high, 620uS low repeated 4 times
    0xe3, 0x8e, 0x38,
    // aw2b: 8 1's (500uS on, 1000uS off)
    0x92, 0x49, 0x24,
    // awf: 11 1's, 0, then 1
    0x02, 0xaa, 0xaa, 0xa6,
    // ar964tx: single 500uS pulse followed by 9000uS of silence
    0x40, 0x00, 0x00,
    // psm: 500uS pulse, 1000uS silence repeated 3 times
    0x01, 0x24,
];

const fn descriptor(
    zero: Symbol,
    one: Symbol,
    preamble: (u8, u8),
    tick_period: u8,
) -> ProtocolDescriptor {
    ProtocolDescriptor {
        zero,
        one,
        preamble_offset: preamble.0,
        preamble_len: preamble.1,
        tick_period,
    }
}

/// Descriptors of the built-in protocols, indexed by [`Protocol`].
pub static PROTOCOLS: [ProtocolDescriptor; 9] = [
    descriptor(
        Symbol::new(4, 0b0011_0000),
        Symbol::new(4, 0b1100_0000),
        OS10_PREAMBLE,
        OS10_TICKS,
    ),
    descriptor(
        Symbol::new(4, 0b1001_0000),
        Symbol::new(4, 0b0110_0000),
        OS21_PREAMBLE,
        OS21_TICKS,
    ),
    descriptor(
        Symbol::new(2, 0b0100_0000),
        Symbol::new(2, 0b1000_0000),
        OS30_PREAMBLE,
        OS30_TICKS,
    ),
    descriptor(
        Symbol::new(5, 0b1000_0000),
        Symbol::new(9, 0b1000_0000),
        AR_PSM_PREAMBLE,
        AR_PSM_TICKS,
    ),
    descriptor(
        Symbol::new(5, 0b1000_0000),
        Symbol::new(9, 0b1000_0000),
        AR964_PREAMBLE,
        AR_PSM_TICKS,
    ),
    descriptor(
        Symbol::new(3, 0b1000_0000),
        Symbol::new(5, 0b1000_0000),
        AR_PSM_PREAMBLE,
        AR_PSM_TICKS,
    ),
    descriptor(
        Symbol::new(2, 0b0100_0000),
        Symbol::new(2, 0b1000_0000),
        AWF_PREAMBLE,
        AWF_TICKS,
    ),
    descriptor(
        Symbol::new(5, 0b1110_0000),
        Symbol::new(3, 0b1000_0000),
        AW2B_PREAMBLE,
        AW2B_TICKS,
    ),
    descriptor(
        Symbol::new(3, 0b1000_0000),
        Symbol::new(3, 0b1100_0000),
        AR_PREAMBLE,
        AR_PWM_TICKS,
    ),
];

/// The built-in protocol catalog.
pub static CATALOG: Catalog = Catalog::new(&PROTOCOLS, &PREAMBLES);
