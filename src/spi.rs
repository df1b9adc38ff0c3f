//! SPI transfers.
//!
//! The operations here never split a buffer. Large writes should go through
//! [`Spi::write_chunked`] or be sliced by the caller.

use crate::device::DeviceHandle;
use crate::error::{check_code, Error, Peripheral, Result};
use crate::marshal::{c_count, c_len, SpiConfigRaw};
use crate::native::{dispatch, NativeApi};
use log::{debug, trace};
use std::fmt;
use std::os::raw::c_int;
use std::sync::Arc;

/// SPI bus and chip-select line, encoded as `bus | cs << 4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpiIndex(u8);

impl SpiIndex {
    pub const SPI1: SpiIndex = SpiIndex(0x00);
    pub const SPI1_CS0: SpiIndex = SpiIndex(0x00);
    pub const SPI1_CS1: SpiIndex = SpiIndex(0x10);
    pub const SPI1_CS2: SpiIndex = SpiIndex(0x20);
    pub const SPI1_CS3: SpiIndex = SpiIndex(0x30);
    pub const SPI1_CS4: SpiIndex = SpiIndex(0x40);
    pub const SPI2: SpiIndex = SpiIndex(0x01);
    pub const SPI2_CS0: SpiIndex = SpiIndex(0x01);
    pub const SPI2_CS1: SpiIndex = SpiIndex(0x11);
    pub const SPI2_CS2: SpiIndex = SpiIndex(0x21);
    pub const SPI2_CS3: SpiIndex = SpiIndex(0x31);
    pub const SPI2_CS4: SpiIndex = SpiIndex(0x41);

    /// Builds an index from a bus (1 or 2) and chip-select line (0-4).
    pub fn new(bus: u8, chip_select: u8) -> Result<Self> {
        if !(1..=2).contains(&bus) {
            return Err(Error::ArgumentOutOfRange(format!(
                "SPI bus {} out of range (1-2)",
                bus
            )));
        }
        if chip_select > 4 {
            return Err(Error::ArgumentOutOfRange(format!(
                "SPI chip select {} out of range (0-4)",
                chip_select
            )));
        }
        Ok(SpiIndex((bus - 1) | (chip_select << 4)))
    }

    /// Bus number (1 or 2).
    pub fn bus(&self) -> u8 {
        (self.0 & 0x0F) + 1
    }

    /// Chip-select line (0-4).
    pub fn chip_select(&self) -> u8 {
        self.0 >> 4
    }

    /// Encoded value passed to the native call.
    pub fn raw(&self) -> u8 {
        self.0
    }

    fn native(&self) -> c_int {
        self.0 as c_int
    }
}

impl fmt::Display for SpiIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SPI{}_CS{}", self.bus(), self.chip_select())
    }
}

/// Transfer engine used by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpiMode {
    #[default]
    HardFullDuplex,
    HardHalfDuplex,
    SoftHalfDuplex,
    SoftOneWire,
    SoftFullDuplex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpiRole {
    Slave,
    #[default]
    Master,
}

/// Clock level while idle (CPOL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockPolarity {
    #[default]
    IdleLow,
    IdleHigh,
}

/// Clock edge data is sampled on (CPHA).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockPhase {
    #[default]
    FirstEdge,
    SecondEdge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitOrder {
    #[default]
    MsbFirst,
    LsbFirst,
}

/// Active level of the chip-select line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectPolarity {
    #[default]
    ActiveLow,
    ActiveHigh,
}

/// Controller configuration applied by [`Spi::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiConfig {
    pub mode: SpiMode,
    pub role: SpiRole,
    pub polarity: ClockPolarity,
    pub phase: ClockPhase,
    pub bit_order: BitOrder,
    pub select_polarity: SelectPolarity,
    pub clock_speed_hz: u32,
}

impl Default for SpiConfig {
    fn default() -> Self {
        SpiConfig {
            mode: SpiMode::HardFullDuplex,
            role: SpiRole::Master,
            polarity: ClockPolarity::IdleLow,
            phase: ClockPhase::FirstEdge,
            bit_order: BitOrder::MsbFirst,
            select_polarity: SelectPolarity::ActiveLow,
            clock_speed_hz: 1_000_000,
        }
    }
}

impl From<&SpiConfig> for SpiConfigRaw {
    fn from(config: &SpiConfig) -> Self {
        SpiConfigRaw {
            mode: match config.mode {
                SpiMode::HardFullDuplex => 0,
                SpiMode::HardHalfDuplex => 1,
                SpiMode::SoftHalfDuplex => 2,
                SpiMode::SoftOneWire => 3,
                SpiMode::SoftFullDuplex => 4,
            },
            master: matches!(config.role, SpiRole::Master) as i8,
            cpol: matches!(config.polarity, ClockPolarity::IdleHigh) as i8,
            cpha: matches!(config.phase, ClockPhase::SecondEdge) as i8,
            lsb_first: matches!(config.bit_order, BitOrder::LsbFirst) as i8,
            sel_polarity: matches!(config.select_polarity, SelectPolarity::ActiveHigh) as i8,
            clock_speed_hz: config.clock_speed_hz,
        }
    }
}

/// SPI operations scoped to one opened handle.
#[derive(Clone)]
pub struct Spi {
    native: Arc<dyn NativeApi>,
    handle: DeviceHandle,
}

impl fmt::Debug for Spi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spi").field("handle", &self.handle).finish()
    }
}

impl Spi {
    pub(crate) fn new(native: Arc<dyn NativeApi>, handle: DeviceHandle) -> Self {
        Spi { native, handle }
    }

    /// Configures a controller. Must succeed before transfers on `index`.
    pub async fn init(&self, index: SpiIndex, config: &SpiConfig) -> Result<()> {
        let handle = self.handle.0;
        let mut raw = SpiConfigRaw::from(config);
        debug!("{} init: {:?}", index, config);
        let ret = dispatch(&self.native, move |api| {
            api.spi_init(handle, index.native(), &mut raw)
        })
        .await?;
        check_code(Peripheral::Spi, "SPI_Init", ret)
    }

    /// Writes `data`, returning once the adapter has clocked it out.
    pub async fn write_bytes(&self, index: SpiIndex, data: &[u8]) -> Result<()> {
        c_len(data.len())?;
        let handle = self.handle.0;
        let mut write = data.to_vec();
        trace!("{} write {} bytes", index, write.len());
        let ret = dispatch(&self.native, move |api| {
            api.spi_write_bytes(handle, index.native(), &mut write)
        })
        .await?;
        check_code(Peripheral::Spi, "SPI_WriteBytes", ret)
    }

    /// Writes `data` without waiting for the adapter to finish clocking.
    /// The buffer is sent as one native call.
    pub async fn write_bytes_async(&self, index: SpiIndex, data: &[u8]) -> Result<()> {
        c_len(data.len())?;
        let handle = self.handle.0;
        let mut write = data.to_vec();
        trace!("{} async write {} bytes", index, write.len());
        let ret = dispatch(&self.native, move |api| {
            api.spi_write_bytes_async(handle, index.native(), &mut write)
        })
        .await?;
        check_code(Peripheral::Spi, "SPI_WriteBytesAsync", ret)
    }

    /// Reads `len` bytes.
    pub async fn read_bytes(&self, index: SpiIndex, len: usize) -> Result<Vec<u8>> {
        c_len(len)?;
        let handle = self.handle.0;
        let (ret, read) = dispatch(&self.native, move |api| {
            let mut read = vec![0u8; len];
            let ret = api.spi_read_bytes(handle, index.native(), &mut read);
            (ret, read)
        })
        .await?;
        check_code(Peripheral::Spi, "SPI_ReadBytes", ret)?;
        trace!("{} read data: {:02X?}", index, read);
        Ok(read)
    }

    /// Writes `data`, waits `interval_us`, then reads `read_len` bytes.
    pub async fn write_read_bytes(
        &self,
        index: SpiIndex,
        data: &[u8],
        read_len: usize,
        interval_us: u32,
    ) -> Result<Vec<u8>> {
        c_len(data.len())?;
        c_len(read_len)?;
        let interval_us = c_count("Interval", interval_us)?;
        let handle = self.handle.0;
        let mut write = data.to_vec();
        debug!(
            "{} write {} / read {} bytes, interval {}us",
            index,
            write.len(),
            read_len,
            interval_us
        );
        let (ret, read) = dispatch(&self.native, move |api| {
            let mut read = vec![0u8; read_len];
            let ret =
                api.spi_write_read_bytes(handle, index.native(), &mut write, &mut read, interval_us);
            (ret, read)
        })
        .await?;
        check_code(Peripheral::Spi, "SPI_WriteReadBytes", ret)?;
        Ok(read)
    }

    /// Sends `data` as consecutive [`Spi::write_bytes_async`] calls of at most
    /// `chunk_len` bytes, in order, awaiting each one. Returns the number of
    /// calls issued. Stops at the first failing chunk.
    ///
    /// [`crate::consts::SPI_ASYNC_CHUNK_LEN`] is a size the adapter handles well.
    pub async fn write_chunked(
        &self,
        index: SpiIndex,
        data: &[u8],
        chunk_len: usize,
    ) -> Result<usize> {
        if chunk_len == 0 {
            return Err(Error::ArgumentOutOfRange(
                "SPI chunk length must be greater than 0".to_string(),
            ));
        }
        let mut calls = 0;
        for chunk in data.chunks(chunk_len) {
            self.write_bytes_async(index, chunk).await?;
            calls += 1;
        }
        debug!("{} chunked write of {} bytes in {} calls", index, data.len(), calls);
        Ok(calls)
    }
}
