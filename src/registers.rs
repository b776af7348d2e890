//! Register map and power-on tuning sequences for the PMW3901 family.
//!
//! Addresses and sequence contents are datasheet/vendor constants and must be
//! reproduced bit-exactly for the hardware to behave.

/// Register addresses shared by the PMW3901 and PAA5100JE.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registers {
    ProductId = 0x00,
    RevisionId = 0x01,
    Motion = 0x02,
    DeltaXL = 0x03,
    DeltaXH = 0x04,
    DeltaYL = 0x05,
    DeltaYH = 0x06,
    Squal = 0x07,
    RawDataSum = 0x08,
    MaximumRawData = 0x09,
    MinimumRawData = 0x0A,
    ShutterLower = 0x0B,
    ShutterUpper = 0x0C,
    MotionBurst = 0x16,

    PowerUpReset = 0x3A,
    Shutdown = 0x3B,

    /// Per-pixel resolution control (PAA5100 only).
    Resolution = 0x4E,

    RawDataGrab = 0x58,
    RawDataGrabStatus = 0x59,

    Orientation = 0x5B,
}

/// Product ID reported by every chip in this family.
pub const PRODUCT_ID: u8 = 0x49;

/// Revisions this driver has been validated against.
pub const KNOWN_REVISIONS: [u8; 2] = [0x00, 0x01];

/// Magic value written to `PowerUpReset` to trigger a soft reset.
pub const POWER_UP_RESET_VALUE: u8 = 0x5A;

/// Magic value written to `Shutdown` to power the sensor down.
pub const SHUTDOWN_VALUE: u8 = 0xB6;

/// One step of a bulk register sequence.
///
/// The vendor sequences interleave register writes with fixed millisecond
/// waits, so the tables carry both.
#[derive(Debug, Clone, Copy)]
pub enum SeqOp {
    /// Write the value to the register.
    Write(u8, u8),
    /// Pause for the given number of milliseconds before continuing.
    WaitMs(u8),
}

use self::SeqOp::{WaitMs, Write};

// The tuning sequences below are proprietary calibration values lifted from
// the vendor reference driver. The datasheet does not document them.

/// First half of the calibration prologue, common to both variants.
///
/// After this the driver probes register 0x67 and writes 0x48 accordingly,
/// then continues with [`SEQ_PROLOGUE_B`].
pub const SEQ_PROLOGUE_A: [SeqOp; 5] = [
    Write(0x7F, 0x00),
    Write(0x55, 0x01),
    Write(0x50, 0x07),
    Write(0x7F, 0x0E),
    Write(0x43, 0x10),
];

/// Second half of the common calibration prologue.
pub const SEQ_PROLOGUE_B: [SeqOp; 5] = [
    Write(0x7F, 0x00),
    Write(0x51, 0x7B),
    Write(0x50, 0x00),
    Write(0x55, 0x00),
    Write(0x7F, 0x0E),
];

/// Written before the 0x70/0x71 compensation values when register 0x73
/// reads zero during the prologue.
pub const SEQ_COMPENSATION: [SeqOp; 4] = [
    Write(0x7F, 0x00),
    Write(0x61, 0xAD),
    Write(0x51, 0x70),
    Write(0x7F, 0x0E),
];

/// Variant-specific performance tuning for the PMW3901, written after the
/// common prologue.
pub const SEQ_TUNE_PMW3901: [SeqOp; 78] = [
    Write(0x7F, 0x00),
    Write(0x61, 0xAD),
    Write(0x7F, 0x03),
    Write(0x40, 0x00),
    Write(0x7F, 0x05),
    Write(0x41, 0xB3),
    Write(0x43, 0xF1),
    Write(0x45, 0x14),
    Write(0x5B, 0x32),
    Write(0x5F, 0x34),
    Write(0x7B, 0x08),
    Write(0x7F, 0x06),
    Write(0x44, 0x1B),
    Write(0x40, 0xBF),
    Write(0x4E, 0x3F),
    Write(0x7F, 0x08),
    Write(0x65, 0x20),
    Write(0x6A, 0x18),
    Write(0x7F, 0x09),
    Write(0x4F, 0xAF),
    Write(0x5F, 0x40),
    Write(0x48, 0x80),
    Write(0x49, 0x80),
    Write(0x57, 0x77),
    Write(0x60, 0x78),
    Write(0x61, 0x78),
    Write(0x62, 0x08),
    Write(0x63, 0x50),
    Write(0x7F, 0x0A),
    Write(0x45, 0x60),
    Write(0x7F, 0x00),
    Write(0x4D, 0x11),
    Write(0x55, 0x80),
    Write(0x74, 0x21),
    Write(0x75, 0x1F),
    Write(0x4A, 0x78),
    Write(0x4B, 0x78),
    Write(0x44, 0x08),
    Write(0x45, 0x50),
    Write(0x64, 0xFF),
    Write(0x65, 0x1F),
    Write(0x7F, 0x14),
    Write(0x65, 0x67),
    Write(0x66, 0x08),
    Write(0x63, 0x70),
    Write(0x7F, 0x15),
    Write(0x48, 0x48),
    Write(0x7F, 0x07),
    Write(0x41, 0x0D),
    Write(0x43, 0x14),
    Write(0x4B, 0x0E),
    Write(0x45, 0x0F),
    Write(0x44, 0x42),
    Write(0x4C, 0x80),
    Write(0x7F, 0x10),
    Write(0x5B, 0x02),
    Write(0x7F, 0x07),
    Write(0x40, 0x41),
    Write(0x70, 0x00),
    WaitMs(10),
    Write(0x32, 0x44),
    Write(0x7F, 0x07),
    Write(0x40, 0x40),
    Write(0x7F, 0x06),
    Write(0x62, 0xF0),
    Write(0x63, 0x00),
    Write(0x7F, 0x0D),
    Write(0x48, 0xC0),
    Write(0x6F, 0xD5),
    Write(0x7F, 0x00),
    Write(0x5B, 0xA0),
    Write(0x4E, 0xA8),
    Write(0x5A, 0x50),
    Write(0x40, 0x80),
    // settle, then enable LED_N pulsing
    WaitMs(240),
    Write(0x7F, 0x14),
    Write(0x6F, 0x1C),
    Write(0x7F, 0x00),
];

/// Variant-specific performance tuning for the PAA5100JE, written after the
/// common prologue. Longer than the PMW3901 sequence and different in the
/// LED drive and resolution registers, among others.
pub const SEQ_TUNE_PAA5100: [SeqOp; 86] = [
    Write(0x7F, 0x00),
    Write(0x61, 0xAD),
    Write(0x7F, 0x03),
    Write(0x40, 0x00),
    Write(0x7F, 0x05),
    Write(0x41, 0xB3),
    Write(0x43, 0xF1),
    Write(0x45, 0x14),
    Write(0x5F, 0x34),
    Write(0x7B, 0x08),
    Write(0x5E, 0x34),
    Write(0x5B, 0x11),
    Write(0x6D, 0x11),
    Write(0x45, 0x17),
    Write(0x70, 0xE5),
    Write(0x71, 0xE5),
    Write(0x7F, 0x06),
    Write(0x44, 0x1B),
    Write(0x40, 0xBF),
    Write(0x4E, 0x3F),
    Write(0x7F, 0x08),
    Write(0x66, 0x44),
    Write(0x65, 0x20),
    Write(0x6A, 0x3A),
    Write(0x61, 0x05),
    Write(0x62, 0x05),
    Write(0x7F, 0x09),
    Write(0x4F, 0xAF),
    Write(0x5F, 0x40),
    Write(0x48, 0x80),
    Write(0x49, 0x80),
    Write(0x57, 0x77),
    Write(0x60, 0x78),
    Write(0x61, 0x78),
    Write(0x62, 0x08),
    Write(0x63, 0x50),
    Write(0x7F, 0x0A),
    Write(0x45, 0x60),
    Write(0x7F, 0x00),
    Write(0x4D, 0x11),
    Write(0x55, 0x80),
    Write(0x74, 0x21),
    Write(0x75, 0x1F),
    Write(0x4A, 0x78),
    Write(0x4B, 0x78),
    Write(0x44, 0x08),
    Write(0x45, 0x50),
    Write(0x64, 0xFF),
    Write(0x65, 0x1F),
    Write(0x7F, 0x14),
    Write(0x65, 0x67),
    Write(0x66, 0x08),
    Write(0x63, 0x70),
    Write(0x6F, 0x1C),
    Write(0x7F, 0x15),
    Write(0x48, 0x48),
    Write(0x7F, 0x07),
    Write(0x41, 0x0D),
    Write(0x43, 0x14),
    Write(0x4B, 0x0E),
    Write(0x45, 0x0F),
    Write(0x44, 0x42),
    Write(0x4C, 0x80),
    Write(0x7F, 0x10),
    Write(0x5B, 0x02),
    Write(0x7F, 0x07),
    Write(0x40, 0x41),
    WaitMs(10),
    Write(0x7F, 0x00),
    Write(0x32, 0x00),
    Write(0x7F, 0x07),
    Write(0x40, 0x40),
    Write(0x7F, 0x06),
    Write(0x68, 0xF0),
    Write(0x69, 0x00),
    Write(0x7F, 0x0D),
    Write(0x48, 0xC0),
    Write(0x6F, 0xD5),
    Write(0x7F, 0x00),
    Write(0x5B, 0xA0),
    Write(0x4E, 0xA8),
    Write(0x5A, 0x90),
    Write(0x40, 0x80),
    Write(0x73, 0x1F),
    WaitMs(10),
    Write(0x73, 0x00),
];

/// Switches the sensor into raw-data-grab mode for a frame capture.
pub const SEQ_FRAME_CAPTURE: [SeqOp; 11] = [
    Write(0x7F, 0x07),
    Write(0x4C, 0x00),
    Write(0x7F, 0x08),
    Write(0x6A, 0x38),
    Write(0x7F, 0x00),
    Write(0x55, 0x04),
    Write(0x40, 0x80),
    Write(0x4D, 0x11),
    WaitMs(10),
    Write(0x7F, 0x00),
    Write(0x58, 0xFF),
];
