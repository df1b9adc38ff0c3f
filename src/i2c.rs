//! I2C master and slave transfers.
//!
//! Each bus index must be configured with [`I2c::init`] before any transfer
//! on it. Timeouts are per call; a timeout surfaces as an ordinary native
//! error code.

use crate::consts;
use crate::device::DeviceHandle;
use crate::error::{check_code, check_count, Error, Peripheral, Result};
use crate::marshal::{c_count, c_len, c_timeout_ms, I2cConfigRaw};
use crate::native::{dispatch, NativeApi};
use log::{debug, trace};
use std::fmt;
use std::os::raw::{c_int, c_short};
use std::sync::Arc;
use std::time::Duration;

/// Represents a 7-bit or 10-bit I2C slave address.
/// Use `I2cAddress::new_7bit(addr)` or `I2cAddress::new_10bit(addr)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum I2cAddress {
    /// Standard 7-bit address (0x00 - 0x7F).
    Bit7(u8),
    /// Extended 10-bit address (0x0000 - 0x03FF).
    Bit10(u16),
}

impl I2cAddress {
    /// Creates a 7-bit address, checking validity (0-127).
    pub fn new_7bit(addr: u8) -> Result<Self> {
        if addr <= 0x7F {
            Ok(I2cAddress::Bit7(addr))
        } else {
            Err(Error::ArgumentOutOfRange(
                "7-bit I2C address must be 0-127".to_string(),
            ))
        }
    }

    /// Creates a 10-bit address, checking validity (0-1023).
    pub fn new_10bit(addr: u16) -> Result<Self> {
        if addr <= 0x03FF {
            Ok(I2cAddress::Bit10(addr))
        } else {
            Err(Error::InvalidI2c10BitAddress(addr))
        }
    }

    /// Unshifted address as passed in the native `short` argument.
    pub fn raw(&self) -> u16 {
        match *self {
            I2cAddress::Bit7(a) => a as u16,
            I2cAddress::Bit10(a) => a,
        }
    }

    fn native(&self) -> c_short {
        // Both variants are range-checked to fit in 10 bits.
        self.raw() as c_short
    }
}

impl fmt::Display for I2cAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            I2cAddress::Bit7(a) => write!(f, "7-bit 0x{:02X}", a),
            I2cAddress::Bit10(a) => write!(f, "10-bit 0x{:03X}", a),
        }
    }
}

/// I2C controller on the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum I2cIndex {
    I2c0,
    I2c1,
    I2c2,
    I2c3,
    I2c4,
    I2c5,
    I2c6,
    I2c7,
}

impl I2cIndex {
    /// Bus number (0-7) passed to the native call.
    pub fn number(&self) -> u8 {
        *self as u8
    }

    /// Creates an index from its bus number, checking validity (0-7).
    pub fn new(bus: u8) -> Result<Self> {
        use I2cIndex::*;
        const ALL: [I2cIndex; 8] = [I2c0, I2c1, I2c2, I2c3, I2c4, I2c5, I2c6, I2c7];
        ALL.get(bus as usize).copied().ok_or_else(|| {
            Error::ArgumentOutOfRange(format!("I2C index {} out of range (0-7)", bus))
        })
    }

    fn native(&self) -> c_int {
        self.number() as c_int
    }
}

/// Whether the controller drives the bus or answers as a slave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum I2cRole {
    Slave,
    #[default]
    Master,
}

/// Address width used by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum I2cAddressWidth {
    #[default]
    Bits7,
    Bits10,
}

/// Bus configuration applied by [`I2c::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cConfig {
    pub clock_speed_hz: u32,
    /// Own address, used when acting as a slave.
    pub own_addr: u16,
    pub role: I2cRole,
    pub address_width: I2cAddressWidth,
    /// Enables the adapter's internal pull-up resistors.
    pub enable_pull_up: bool,
}

impl Default for I2cConfig {
    fn default() -> Self {
        I2cConfig {
            clock_speed_hz: 100_000,
            own_addr: 0,
            role: I2cRole::Master,
            address_width: I2cAddressWidth::Bits7,
            enable_pull_up: false,
        }
    }
}

impl From<&I2cConfig> for I2cConfigRaw {
    fn from(config: &I2cConfig) -> Self {
        I2cConfigRaw {
            clock_speed_hz: config.clock_speed_hz,
            own_addr: config.own_addr,
            master: match config.role {
                I2cRole::Slave => 0,
                I2cRole::Master => 1,
            },
            addr_bits: match config.address_width {
                I2cAddressWidth::Bits7 => 7,
                I2cAddressWidth::Bits10 => 10,
            },
            enable_pu: config.enable_pull_up as u8,
        }
    }
}

/// I2C operations scoped to one opened handle.
#[derive(Clone)]
pub struct I2c {
    native: Arc<dyn NativeApi>,
    handle: DeviceHandle,
}

impl fmt::Debug for I2c {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("I2c").field("handle", &self.handle).finish()
    }
}

impl I2c {
    pub(crate) fn new(native: Arc<dyn NativeApi>, handle: DeviceHandle) -> Self {
        I2c { native, handle }
    }

    /// Configures a bus. Must succeed before transfers on `index`.
    pub async fn init(&self, index: I2cIndex, config: &I2cConfig) -> Result<()> {
        let handle = self.handle.0;
        let mut raw = I2cConfigRaw::from(config);
        debug!("I2C{} init: {:?}", index.number(), config);
        let ret = dispatch(&self.native, move |api| {
            api.iic_init(handle, index.native(), &mut raw)
        })
        .await?;
        check_code(Peripheral::I2c, "IIC_Init", ret)
    }

    /// Reads back the controller's own (slave) address.
    pub async fn slave_addr(&self, index: I2cIndex) -> Result<u16> {
        let handle = self.handle.0;
        let (ret, addr) = dispatch(&self.native, move |api| {
            let mut addr = 0u16;
            let ret = api.iic_get_slave_addr(handle, index.native(), &mut addr);
            (ret, addr)
        })
        .await?;
        check_code(Peripheral::I2c, "IIC_GetSlaveAddr", ret)?;
        Ok(addr)
    }

    /// Writes `data` to the slave at `addr`.
    pub async fn write_bytes(
        &self,
        index: I2cIndex,
        addr: I2cAddress,
        data: &[u8],
        timeout: Duration,
    ) -> Result<()> {
        c_len(data.len())?;
        let timeout_ms = c_timeout_ms(timeout)?;
        let handle = self.handle.0;
        let mut write = data.to_vec();
        debug!("I2C{} write {} bytes to {}", index.number(), write.len(), addr);
        trace!("I2C write data: {:02X?}", write);
        let ret = dispatch(&self.native, move |api| {
            api.iic_write_bytes(handle, index.native(), addr.native(), &mut write, timeout_ms)
        })
        .await?;
        check_code(Peripheral::I2c, "IIC_WriteBytes", ret)
    }

    /// Reads `len` bytes from the slave at `addr`.
    pub async fn read_bytes(
        &self,
        index: I2cIndex,
        addr: I2cAddress,
        len: usize,
        timeout: Duration,
    ) -> Result<Vec<u8>> {
        c_len(len)?;
        let timeout_ms = c_timeout_ms(timeout)?;
        let handle = self.handle.0;
        debug!("I2C{} read {} bytes from {}", index.number(), len, addr);
        let (ret, read) = dispatch(&self.native, move |api| {
            let mut read = vec![0u8; len];
            let ret =
                api.iic_read_bytes(handle, index.native(), addr.native(), &mut read, timeout_ms);
            (ret, read)
        })
        .await?;
        check_code(Peripheral::I2c, "IIC_ReadBytes", ret)?;
        trace!("I2C read data: {:02X?}", read);
        Ok(read)
    }

    /// Writes `data` then reads `read_len` bytes in one transaction,
    /// typically a register read.
    pub async fn write_read_bytes(
        &self,
        index: I2cIndex,
        addr: I2cAddress,
        data: &[u8],
        read_len: usize,
        timeout: Duration,
    ) -> Result<Vec<u8>> {
        c_len(data.len())?;
        c_len(read_len)?;
        let timeout_ms = c_timeout_ms(timeout)?;
        let handle = self.handle.0;
        let mut write = data.to_vec();
        debug!(
            "I2C{} write {} / read {} bytes at {}",
            index.number(),
            write.len(),
            read_len,
            addr
        );
        let (ret, read) = dispatch(&self.native, move |api| {
            let mut read = vec![0u8; read_len];
            let ret = api.iic_write_read_bytes(
                handle,
                index.native(),
                addr.native(),
                &mut write,
                &mut read,
                timeout_ms,
            );
            (ret, read)
        })
        .await?;
        check_code(Peripheral::I2c, "IIC_WriteReadBytes", ret)?;
        trace!("I2C read data: {:02X?}", read);
        Ok(read)
    }

    /// Writes `data` in pages of `block_size` bytes, pausing `interval`
    /// between pages (EEPROM-style page writes).
    pub async fn block_write_bytes(
        &self,
        index: I2cIndex,
        addr: I2cAddress,
        data: &[u8],
        block_size: u32,
        interval: Duration,
    ) -> Result<()> {
        c_len(data.len())?;
        let block_size = c_count("Block size", block_size)?;
        let interval_ms = c_timeout_ms(interval)?;
        let handle = self.handle.0;
        let mut write = data.to_vec();
        debug!(
            "I2C{} block write {} bytes to {} (block {})",
            index.number(),
            write.len(),
            addr,
            block_size
        );
        let ret = dispatch(&self.native, move |api| {
            api.iic_block_write_bytes(
                handle,
                index.native(),
                addr.native(),
                &mut write,
                block_size,
                interval_ms,
            )
        })
        .await?;
        check_code(Peripheral::I2c, "IIC_BlockWriteBytes", ret)
    }

    /// Reads `len` bytes in pages of `block_size` bytes.
    pub async fn block_read_bytes(
        &self,
        index: I2cIndex,
        addr: I2cAddress,
        len: usize,
        block_size: u32,
        interval: Duration,
    ) -> Result<Vec<u8>> {
        c_len(len)?;
        let block_size = c_count("Block size", block_size)?;
        let interval_ms = c_timeout_ms(interval)?;
        let handle = self.handle.0;
        debug!(
            "I2C{} block read {} bytes from {} (block {})",
            index.number(),
            len,
            addr,
            block_size
        );
        let (ret, read) = dispatch(&self.native, move |api| {
            let mut read = vec![0u8; len];
            let ret = api.iic_block_read_bytes(
                handle,
                index.native(),
                addr.native(),
                &mut read,
                block_size,
                interval_ms,
            );
            (ret, read)
        })
        .await?;
        check_code(Peripheral::I2c, "IIC_BlockReadBytes", ret)?;
        Ok(read)
    }

    /// In slave mode, queues `data` for the next master read.
    pub async fn slave_write_bytes(
        &self,
        index: I2cIndex,
        data: &[u8],
        timeout: Duration,
    ) -> Result<()> {
        c_len(data.len())?;
        let timeout_ms = c_timeout_ms(timeout)?;
        let handle = self.handle.0;
        let mut write = data.to_vec();
        debug!("I2C{} slave write {} bytes", index.number(), write.len());
        let ret = dispatch(&self.native, move |api| {
            api.iic_slave_write_bytes(handle, index.native(), &mut write, timeout_ms)
        })
        .await?;
        check_code(Peripheral::I2c, "IIC_SlaveWriteBytes", ret)
    }

    /// In slave mode, returns whatever a master wrote, waiting up to `timeout`.
    pub async fn slave_read_bytes(&self, index: I2cIndex, timeout: Duration) -> Result<Vec<u8>> {
        let timeout_ms = c_timeout_ms(timeout)?;
        let handle = self.handle.0;
        let (ret, mut read) = dispatch(&self.native, move |api| {
            let mut read = vec![0u8; consts::I2C_SLAVE_READ_CAPACITY];
            let ret = api.iic_slave_read_bytes(handle, index.native(), &mut read, timeout_ms);
            (ret, read)
        })
        .await?;
        let count = check_count(Peripheral::I2c, "IIC_SlaveReadBytes", ret)?;
        read.truncate(count.min(consts::I2C_SLAVE_READ_CAPACITY));
        debug!("I2C{} slave read {} bytes", index.number(), read.len());
        trace!("I2C slave data: {:02X?}", read);
        Ok(read)
    }

    /// In slave mode, number of queued bytes the master has not read yet.
    pub async fn slave_write_remain(&self, index: I2cIndex) -> Result<usize> {
        let handle = self.handle.0;
        let ret = dispatch(&self.native, move |api| {
            api.iic_slave_write_remain(handle, index.native())
        })
        .await?;
        check_count(Peripheral::I2c, "IIC_SlaveWriteRemain", ret)
    }
}
