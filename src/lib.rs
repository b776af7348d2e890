//! Driver for the PMW3901 and PAA5100JE optical flow sensors.
//!
//! Both chips report 2-D motion deltas over SPI. They share a register map
//! and motion-burst format but require different proprietary tuning
//! sequences at power-on, so one parametrized driver covers the family:
//!
//! ```ignore
//! let mut flow = Pmw3901::new(Variant::Paa5100, spi, csn);
//! flow.init(&mut delay)?;
//! loop {
//!     let sample = flow.read_motion()?;
//!     if sample.motion {
//!         // sample.dx / sample.dy
//!     }
//! }
//! ```
//!
//! The driver is blocking and owns its SPI port and chip-select pin
//! exclusively. It keeps no state between calls besides the open transport;
//! polling cadence and retry policy belong to the caller. One handle per
//! physical sensor; multiple sensors on distinct chip-select lines work from
//! separate handles.

#![no_std]

use embedded_hal as hal;

use embedded_hal::blocking::delay::DelayMs;
use hal::digital::v2::OutputPin;

#[cfg(feature = "rttdebug")]
use panic_rtt_core::rprintln;

mod registers;

pub use registers::Registers;
use registers::{
    SeqOp, KNOWN_REVISIONS, POWER_UP_RESET_VALUE, PRODUCT_ID, SEQ_COMPENSATION, SEQ_FRAME_CAPTURE,
    SEQ_PROLOGUE_A, SEQ_PROLOGUE_B, SEQ_TUNE_PAA5100, SEQ_TUNE_PMW3901, SHUTDOWN_VALUE,
};

/// Errors in this crate
#[derive(Debug)]
pub enum Error<CommE, PinE> {
    /// Sensor communication error
    Comm(CommE),
    /// Pin setting error
    Pin(PinE),

    /// Product ID readback never matched this chip family;
    /// carries the last product ID byte seen
    UnknownChipId(u8),
    /// Sensor did not reach the expected state within the bounded wait
    Unresponsive,
}

/// Which chip of the family is wired up.
///
/// The PAA5100JE is a near-clone of the PMW3901 tuned for close-range
/// tracking; it answers with the same product ID but needs its own
/// power-on tuning sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Pmw3901,
    Paa5100,
}

impl Variant {
    fn tuning_sequence(self) -> &'static [SeqOp] {
        match self {
            Variant::Pmw3901 => &SEQ_TUNE_PMW3901,
            Variant::Paa5100 => &SEQ_TUNE_PAA5100,
        }
    }
}

/// Mounting rotation of the sensor, in 90 degree increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

/// One decoded motion-burst payload.
///
/// `dx`/`dy` are little-endian signed sensor counts; both are zero when the
/// motion bit was clear. The remaining fields are the vendor's surface
/// diagnostics, passed through undecoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionSample {
    pub dx: i16,
    pub dy: i16,
    /// Whether the sensor flagged motion since the last read
    pub motion: bool,
    pub observation: u8,
    /// Surface quality (SQUAL)
    pub squal: u8,
    pub raw_data_sum: u8,
    pub max_raw_data: u8,
    pub min_raw_data: u8,
    pub shutter_upper: u8,
    pub shutter_lower: u8,
}

impl MotionSample {
    /// Vendor criterion for a trustworthy sample: motion was flagged and the
    /// surface quality / shutter combination does not suggest the sensor is
    /// staring at a featureless surface.
    pub fn is_reliable(&self) -> bool {
        self.motion && !(self.squal < 0x19 && self.shutter_upper == 0x1F)
    }
}

/// No-op chip-select pin for wirings where the SPI bus itself asserts CS.
pub struct DummyCs;

impl OutputPin for DummyCs {
    type Error = core::convert::Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Register writes set the high bit of the address; reads leave it clear.
const DIR_WRITE: u8 = 0x80;

/// Motion bit in the burst status byte.
const MOTION_OCCURRED: u8 = 0b1000_0000;

/// Bytes clocked out of the motion burst register per transaction.
const MOTION_BURST_LEN: usize = 12;

/// Orientation register bits. Axes are swapped before inversion.
const ORIENT_SWAP_XY: u8 = 0b1000_0000;
const ORIENT_INVERT_Y: u8 = 0b0100_0000;
const ORIENT_INVERT_X: u8 = 0b0010_0000;

/// Either raw-data-grab status bit means the capture machinery is ready.
const RAW_DATA_READY: u8 = 0b1100_0000;

/// Edge length of a captured raw frame, in pixels.
pub const FRAME_WIDTH: usize = 35;

/// Pixel count of a captured raw frame.
pub const FRAME_PIXELS: usize = FRAME_WIDTH * FRAME_WIDTH;

/// Status polls before a frame capture is declared unresponsive.
const FRAME_SYNC_ATTEMPTS: u32 = 1000;

/// Grab-register reads before a frame capture is declared unresponsive.
/// Each pixel needs at least two in-phase reads.
const FRAME_READ_ATTEMPTS: u32 = 10 * FRAME_PIXELS as u32;

pub struct Pmw3901<SPI, CSN> {
    /// the SPI port to use when communicating
    spi: SPI,
    /// the Chip Select pin (GPIO output) to use when communicating
    csn: CSN,
    /// which power-on tuning sequence this chip needs
    variant: Variant,
}

impl<SPI, CSN, CommE, PinE> Pmw3901<SPI, CSN>
where
    SPI: hal::blocking::spi::Write<u8, Error = CommE>
        + hal::blocking::spi::Transfer<u8, Error = CommE>,
    CSN: OutputPin<Error = PinE>,
{
    /// Product ID verification attempts before `init` gives up.
    const ID_PROBE_ATTEMPTS: u8 = 5;

    pub fn new(variant: Variant, spi: SPI, csn: CSN) -> Self {
        let mut inst = Self { spi, csn, variant };
        // ensure that the device is initially deselected
        let _ = inst.csn.set_high();
        inst
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Initialize this device.
    ///
    /// Soft-resets the chip, writes the power-on tuning sequences for the
    /// configured variant, then verifies the product ID and revision.
    /// No other call is valid until this has returned `Ok`.
    pub fn init(&mut self, delay_source: &mut impl DelayMs<u8>) -> Result<(), Error<CommE, PinE>> {
        // toggle chip select to reset the sensor's SPI state machine
        self.csn.set_low().map_err(Error::Pin)?;
        delay_source.delay_ms(50);
        self.csn.set_high().map_err(Error::Pin)?;

        // soft reset
        self.register_write(Registers::PowerUpReset as u8, POWER_UP_RESET_VALUE)?;
        delay_source.delay_ms(20);

        // one read of each motion register clears any stale deltas
        for offset in 0..5u8 {
            self.register_read(Registers::Motion as u8 + offset)?;
        }

        self.write_tuning_registers(delay_source)?;

        // the chip may not answer with its identity right after power-up
        let mut product = 0;
        for attempt in 0..Self::ID_PROBE_ATTEMPTS {
            if attempt > 0 {
                delay_source.delay_ms(10);
            }
            let (id, revision) = self.product_id()?;
            product = id;
            if id == PRODUCT_ID && KNOWN_REVISIONS.contains(&revision) {
                #[cfg(feature = "rttdebug")]
                rprintln!("product 0x{:x} rev 0x{:x}", id, revision);
                return Ok(());
            }
        }

        Err(Error::UnknownChipId(product))
    }

    /// Read the product ID and revision registers.
    pub fn product_id(&mut self) -> Result<(u8, u8), Error<CommE, PinE>> {
        let product = self.register_read(Registers::ProductId as u8)?;
        let revision = self.register_read(Registers::RevisionId as u8)?;
        Ok((product, revision))
    }

    /// Read one motion sample via a burst transaction.
    ///
    /// A sample with the motion bit clear reports zero deltas; that is an
    /// ordinary "no motion since last poll" result, not an error. Bus
    /// failures surface immediately and are never retried here.
    pub fn read_motion(&mut self) -> Result<MotionSample, Error<CommE, PinE>> {
        let mut block = [0u8; MOTION_BURST_LEN + 1];
        block[0] = Registers::MotionBurst as u8;
        self.transfer_block(&mut block)?;

        let motion = block[1] & MOTION_OCCURRED != 0;
        let mut sample = MotionSample {
            motion,
            observation: block[2],
            squal: block[7],
            raw_data_sum: block[8],
            max_raw_data: block[9],
            min_raw_data: block[10],
            shutter_upper: block[11],
            shutter_lower: block[12],
            ..MotionSample::default()
        };
        if motion {
            sample.dx = i16::from_le_bytes([block[3], block[4]]);
            sample.dy = i16::from_le_bytes([block[5], block[6]]);
        }

        Ok(sample)
    }

    /// Set sensor orientation in 90 degree increments.
    pub fn set_rotation(&mut self, rotation: Rotation) -> Result<(), Error<CommE, PinE>> {
        match rotation {
            Rotation::Deg0 => self.set_orientation(true, true, true),
            Rotation::Deg90 => self.set_orientation(false, true, false),
            Rotation::Deg180 => self.set_orientation(false, false, true),
            Rotation::Deg270 => self.set_orientation(true, false, false),
        }
    }

    /// Set sensor orientation manually. Swapping happens before inversion.
    pub fn set_orientation(
        &mut self,
        invert_x: bool,
        invert_y: bool,
        swap_xy: bool,
    ) -> Result<(), Error<CommE, PinE>> {
        let mut value = 0;
        if swap_xy {
            value |= ORIENT_SWAP_XY;
        }
        if invert_y {
            value |= ORIENT_INVERT_Y;
        }
        if invert_x {
            value |= ORIENT_INVERT_X;
        }
        self.register_write(Registers::Orientation as u8, value)
    }

    /// Capture one raw 35x35 image frame into `frame`.
    ///
    /// This is very slow and mainly useful for checking what surface the
    /// sensor sees. Motion reporting stops in grab mode; call [`init`]
    /// again afterwards to resume it.
    ///
    /// [`init`]: Pmw3901::init
    pub fn frame_capture(
        &mut self,
        frame: &mut [u8; FRAME_PIXELS],
        delay_source: &mut impl DelayMs<u8>,
    ) -> Result<(), Error<CommE, PinE>> {
        self.write_sequence(&SEQ_FRAME_CAPTURE, delay_source)?;

        // wait for the grab machinery to signal readiness
        let mut synced = false;
        for _ in 0..FRAME_SYNC_ATTEMPTS {
            let status = self.register_read(Registers::RawDataGrabStatus as u8)?;
            if status & RAW_DATA_READY != 0 {
                synced = true;
                break;
            }
            delay_source.delay_ms(1);
        }
        if !synced {
            return Err(Error::Unresponsive);
        }

        self.register_write(Registers::RawDataGrab as u8, 0x00)?;

        // each pixel arrives as a 6-bit upper piece then a 2-bit lower piece;
        // anything else is out of phase and gets skipped
        let mut filled = 0;
        for _ in 0..FRAME_READ_ATTEMPTS {
            let data = self.register_read(Registers::RawDataGrab as u8)?;
            match data & 0b1100_0000 {
                0b0100_0000 => {
                    frame[filled] = (frame[filled] & 0b0000_0011) | ((data & 0b0011_1111) << 2);
                }
                0b1000_0000 => {
                    frame[filled] = (frame[filled] & 0b1111_1100) | ((data & 0b0000_1100) >> 2);
                    filled += 1;
                    if filled == FRAME_PIXELS {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }

        Err(Error::Unresponsive)
    }

    /// Power the sensor down. A full [`init`] is required to use it again.
    ///
    /// [`init`]: Pmw3901::init
    pub fn shutdown(&mut self) -> Result<(), Error<CommE, PinE>> {
        self.register_write(Registers::Shutdown as u8, SHUTDOWN_VALUE)
    }

    /// Give back the SPI port and chip-select pin.
    pub fn release(self) -> (SPI, CSN) {
        (self.spi, self.csn)
    }

    /// Write the common calibration prologue, then the variant's tuning
    /// sequence. The prologue contains two data-dependent steps that read
    /// factory calibration out of the chip.
    fn write_tuning_registers(
        &mut self,
        delay_source: &mut impl DelayMs<u8>,
    ) -> Result<(), Error<CommE, PinE>> {
        self.write_sequence(&SEQ_PROLOGUE_A, delay_source)?;

        // an undocumented factory bit selects the 0x48 value
        if self.register_read(0x67)? & 0b1000_0000 != 0 {
            self.register_write(0x48, 0x04)?;
        } else {
            self.register_write(0x48, 0x02)?;
        }

        self.write_sequence(&SEQ_PROLOGUE_B, delay_source)?;

        // chips without compensation burned in get it derived here
        if self.register_read(0x73)? == 0x00 {
            let mut c1 = u16::from(self.register_read(0x70)?);
            let mut c2 = u16::from(self.register_read(0x71)?);
            if c1 <= 28 {
                c1 += 14;
            }
            if c1 > 28 {
                c1 += 11;
            }
            c1 = c1.min(0x3F);
            c2 = (c2 * 45) / 100;
            self.write_sequence(&SEQ_COMPENSATION, delay_source)?;
            self.register_write(0x70, c1 as u8)?;
            self.register_write(0x71, c2 as u8)?;
        }

        self.write_sequence(self.variant.tuning_sequence(), delay_source)
    }

    /// Play back one write/wait sequence table.
    fn write_sequence(
        &mut self,
        seq: &[SeqOp],
        delay_source: &mut impl DelayMs<u8>,
    ) -> Result<(), Error<CommE, PinE>> {
        for op in seq {
            match *op {
                SeqOp::Write(reg, value) => self.register_write(reg, value)?,
                SeqOp::WaitMs(ms) => delay_source.delay_ms(ms),
            }
        }
        Ok(())
    }

    /// Read a single register's value.
    fn register_read(&mut self, reg: u8) -> Result<u8, Error<CommE, PinE>> {
        // reads clock the bare address, then one dummy byte for the value
        let mut block: [u8; 2] = [reg, 0];
        self.transfer_block(&mut block)?;
        #[cfg(feature = "rttdebug")]
        rprintln!("read reg 0x{:x} {:x?}", reg, block[1]);

        Ok(block[1])
    }

    /// Write a value to a single register.
    fn register_write(&mut self, reg: u8, val: u8) -> Result<(), Error<CommE, PinE>> {
        let block: [u8; 2] = [reg | DIR_WRITE, val];
        self.write_block(&block)
    }

    /// Full-duplex transfer with chip select held for the duration.
    fn transfer_block(&mut self, buffer: &mut [u8]) -> Result<(), Error<CommE, PinE>> {
        self.csn.set_low().map_err(Error::Pin)?;
        let rc = self.spi.transfer(buffer);
        self.csn.set_high().map_err(Error::Pin)?;
        rc.map_err(Error::Comm)?;

        Ok(())
    }

    /// Write a block to the device with chip select held for the duration.
    fn write_block(&mut self, block: &[u8]) -> Result<(), Error<CommE, PinE>> {
        #[cfg(feature = "rttdebug")]
        rprintln!("write {:x?}", block);

        self.csn.set_low().map_err(Error::Pin)?;
        let rc = self.spi.write(block);
        self.csn.set_high().map_err(Error::Pin)?;
        rc.map_err(Error::Comm)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::collections::VecDeque;
    use std::vec;
    use std::vec::Vec;

    use super::*;
    use crate::registers::{
        SeqOp, SEQ_PROLOGUE_A, SEQ_PROLOGUE_B, SEQ_TUNE_PAA5100, SEQ_TUNE_PMW3901,
    };
    use embedded_hal::blocking::delay::DelayMs;
    use embedded_hal::blocking::spi::{Transfer, Write};
    use embedded_hal::digital::v2::OutputPin;

    struct FakeDelay;

    impl DelayMs<u8> for FakeDelay {
        fn delay_ms(&mut self, _ms: u8) {}
    }

    struct FakePin;

    impl OutputPin for FakePin {
        type Error = ();

        fn set_low(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    /// Scripted SPI port: records every transaction and replays canned
    /// register values.
    struct FakeSpi {
        /// fail every bus operation when set
        fail: bool,
        /// canned responses for single-register reads
        reads: Vec<(u8, u8)>,
        /// consumed byte-by-byte on reads of the raw-data-grab register
        grab: VecDeque<u8>,
        /// payload returned for motion burst transfers
        burst: [u8; MOTION_BURST_LEN],
        /// every transaction's outgoing bytes, in order
        log: Vec<Vec<u8>>,
        /// transactions attempted, including failed ones
        attempts: usize,
    }

    impl FakeSpi {
        /// A sensor that passes identity verification and has its
        /// compensation values burned in.
        fn ready() -> Self {
            FakeSpi {
                fail: false,
                reads: vec![(0x00, 0x49), (0x01, 0x01), (0x67, 0x00), (0x73, 0x1F)],
                grab: VecDeque::new(),
                burst: [0; MOTION_BURST_LEN],
                log: Vec::new(),
                attempts: 0,
            }
        }

        fn read_value(&mut self, reg: u8) -> u8 {
            if reg == Registers::RawDataGrab as u8 {
                if let Some(value) = self.grab.pop_front() {
                    return value;
                }
            }
            self.reads
                .iter()
                .find(|(r, _)| *r == reg)
                .map(|(_, v)| *v)
                .unwrap_or(0)
        }
    }

    impl Transfer<u8> for FakeSpi {
        type Error = ();

        fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], Self::Error> {
            self.attempts += 1;
            if self.fail {
                return Err(());
            }
            self.log.push(words.to_vec());
            if words.len() == MOTION_BURST_LEN + 1 && words[0] == Registers::MotionBurst as u8 {
                let burst = self.burst;
                words[1..].copy_from_slice(&burst);
            } else if words.len() == 2 && words[0] & DIR_WRITE == 0 {
                words[1] = self.read_value(words[0]);
            }
            Ok(words)
        }
    }

    impl Write<u8> for FakeSpi {
        type Error = ();

        fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
            self.attempts += 1;
            if self.fail {
                return Err(());
            }
            self.log.push(words.to_vec());
            Ok(())
        }
    }

    /// Register writes (address with the direction bit set) from a
    /// transaction log.
    fn register_writes(log: &[Vec<u8>]) -> Vec<[u8; 2]> {
        log.iter()
            .filter(|t| t.len() == 2 && t[0] & DIR_WRITE != 0)
            .map(|t| [t[0], t[1]])
            .collect()
    }

    /// The writes a sequence table should produce on the bus.
    fn sequence_writes(seq: &[SeqOp]) -> Vec<[u8; 2]> {
        seq.iter()
            .filter_map(|op| match *op {
                SeqOp::Write(reg, value) => Some([reg | DIR_WRITE, value]),
                SeqOp::WaitMs(_) => None,
            })
            .collect()
    }

    fn init_writes(variant: Variant) -> Vec<[u8; 2]> {
        let mut flow = Pmw3901::new(variant, FakeSpi::ready(), FakePin);
        flow.init(&mut FakeDelay).unwrap();
        let (spi, _) = flow.release();
        register_writes(&spi.log)
    }

    #[test]
    fn init_succeeds_with_valid_id() {
        let mut flow = Pmw3901::new(Variant::Pmw3901, FakeSpi::ready(), FakePin);
        assert!(flow.init(&mut FakeDelay).is_ok());
    }

    #[test]
    fn init_fails_after_bounded_id_retries() {
        let mut spi = FakeSpi::ready();
        spi.reads[0] = (0x00, 0x5B);
        let mut flow = Pmw3901::new(Variant::Pmw3901, spi, FakePin);

        assert!(matches!(
            flow.init(&mut FakeDelay),
            Err(Error::UnknownChipId(0x5B))
        ));

        let (spi, _) = flow.release();
        let id_probes = spi
            .log
            .iter()
            .filter(|t| t.len() == 2 && t[0] == Registers::ProductId as u8)
            .count();
        assert_eq!(id_probes, 5);
    }

    #[test]
    fn init_rejects_unknown_revision() {
        let mut spi = FakeSpi::ready();
        spi.reads[1] = (0x01, 0x7F);
        let mut flow = Pmw3901::new(Variant::Pmw3901, spi, FakePin);

        assert!(matches!(
            flow.init(&mut FakeDelay),
            Err(Error::UnknownChipId(0x49))
        ));
    }

    #[test]
    fn variant_tuning_extends_the_common_sequence() {
        let pmw = init_writes(Variant::Pmw3901);
        let paa = init_writes(Variant::Paa5100);

        // soft reset, prologue A, the 0x48 probe outcome, prologue B
        let mut common = vec![[Registers::PowerUpReset as u8 | DIR_WRITE, 0x5A]];
        common.extend(sequence_writes(&SEQ_PROLOGUE_A));
        common.push([0x48 | DIR_WRITE, 0x02]);
        common.extend(sequence_writes(&SEQ_PROLOGUE_B));

        assert_eq!(&pmw[..common.len()], &common[..]);
        assert_eq!(&paa[..common.len()], &common[..]);

        // then each variant writes exactly its own tuning table
        assert_eq!(&pmw[common.len()..], &sequence_writes(&SEQ_TUNE_PMW3901)[..]);
        assert_eq!(&paa[common.len()..], &sequence_writes(&SEQ_TUNE_PAA5100)[..]);
    }

    #[test]
    fn compensation_derived_when_not_burned_in() {
        let mut spi = FakeSpi::ready();
        spi.reads[3] = (0x73, 0x00);
        spi.reads.push((0x70, 20));
        spi.reads.push((0x71, 100));
        let mut flow = Pmw3901::new(Variant::Pmw3901, spi, FakePin);
        flow.init(&mut FakeDelay).unwrap();

        // 20 + 14 -> 34, then + 11 -> 45; 100 * 45 / 100 -> 45
        let (spi, _) = flow.release();
        let writes = register_writes(&spi.log);
        assert!(writes.contains(&[0x70 | DIR_WRITE, 45]));
        assert!(writes.contains(&[0x71 | DIR_WRITE, 45]));
    }

    #[test]
    fn no_motion_decodes_to_zero_deltas() {
        let mut spi = FakeSpi::ready();
        // motion bit clear, stale delta bytes present
        spi.burst = [0x00, 0x00, 0xFF, 0xFF, 0x01, 0x00, 0x30, 0, 0, 0, 0, 0];
        let mut flow = Pmw3901::new(Variant::Pmw3901, spi, FakePin);

        let sample = flow.read_motion().unwrap();
        assert!(!sample.motion);
        assert_eq!((sample.dx, sample.dy), (0, 0));
    }

    #[test]
    fn motion_deltas_decode_little_endian_signed() {
        let mut spi = FakeSpi::ready();
        spi.burst = [0x80, 0x00, 0xFF, 0xFF, 0x01, 0x00, 0x30, 1, 2, 3, 4, 5];
        let mut flow = Pmw3901::new(Variant::Pmw3901, spi, FakePin);

        let sample = flow.read_motion().unwrap();
        assert!(sample.motion);
        assert_eq!((sample.dx, sample.dy), (-1, 1));
        assert_eq!(sample.squal, 0x30);
        assert_eq!(sample.raw_data_sum, 1);
        assert_eq!(sample.max_raw_data, 2);
        assert_eq!(sample.min_raw_data, 3);
        assert_eq!(sample.shutter_upper, 4);
        assert_eq!(sample.shutter_lower, 5);
    }

    #[test]
    fn low_quality_sample_is_not_reliable() {
        let mut spi = FakeSpi::ready();
        // motion flagged, but SQUAL low with a maxed shutter
        spi.burst = [0x80, 0, 0x02, 0x00, 0x03, 0x00, 0x10, 0, 0, 0, 0x1F, 0];
        let mut flow = Pmw3901::new(Variant::Pmw3901, spi, FakePin);

        let sample = flow.read_motion().unwrap();
        assert!(sample.motion);
        assert!(!sample.is_reliable());
    }

    #[test]
    fn transport_failure_propagates_without_retry() {
        let mut spi = FakeSpi::ready();
        spi.fail = true;
        let mut flow = Pmw3901::new(Variant::Pmw3901, spi, FakePin);

        assert!(matches!(flow.read_motion(), Err(Error::Comm(()))));

        let (spi, _) = flow.release();
        assert_eq!(spi.attempts, 1);
    }

    #[test]
    fn rotation_maps_to_orientation_bits() {
        let cases = [
            (Rotation::Deg0, 0xE0),
            (Rotation::Deg90, 0x40),
            (Rotation::Deg180, 0x80),
            (Rotation::Deg270, 0x20),
        ];
        for (rotation, expected) in cases.iter() {
            let mut flow = Pmw3901::new(Variant::Paa5100, FakeSpi::ready(), FakePin);
            flow.set_rotation(*rotation).unwrap();
            let (spi, _) = flow.release();
            assert_eq!(
                register_writes(&spi.log),
                vec![[Registers::Orientation as u8 | DIR_WRITE, *expected]]
            );
        }
    }

    #[test]
    fn frame_capture_assembles_pixels() {
        let mut spi = FakeSpi::ready();
        spi.reads.push((Registers::RawDataGrabStatus as u8, 0xC0));
        // one out-of-phase byte, then every pixel as upper then lower piece
        spi.grab.push_back(0x00);
        for _ in 0..FRAME_PIXELS {
            spi.grab.push_back(0x40 | (0xA5 >> 2));
            spi.grab.push_back(0x80 | ((0xA5 & 0x03) << 2));
        }
        let mut flow = Pmw3901::new(Variant::Pmw3901, spi, FakePin);

        let mut frame = [0u8; FRAME_PIXELS];
        flow.frame_capture(&mut frame, &mut FakeDelay).unwrap();
        assert!(frame.iter().all(|&pixel| pixel == 0xA5));
    }

    #[test]
    fn frame_capture_without_ready_status_is_unresponsive() {
        let mut flow = Pmw3901::new(Variant::Pmw3901, FakeSpi::ready(), FakePin);

        let mut frame = [0u8; FRAME_PIXELS];
        assert!(matches!(
            flow.frame_capture(&mut frame, &mut FakeDelay),
            Err(Error::Unresponsive)
        ));
    }

    #[test]
    fn shutdown_writes_the_power_down_value() {
        let mut flow = Pmw3901::new(Variant::Pmw3901, FakeSpi::ready(), FakePin);
        flow.shutdown().unwrap();
        let (spi, _) = flow.release();
        assert_eq!(
            register_writes(&spi.log),
            vec![[Registers::Shutdown as u8 | DIR_WRITE, 0xB6]]
        );
    }
}
