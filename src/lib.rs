//! # usb2xxx
//!
//! Async Rust binding for the USB2XXX family of USB-to-GPIO/I²C/SPI bridge
//! adapters.
//!
//! The vendor ships a closed-source shared library that does all the USB
//! work. This crate loads it at runtime with `libloading`, marshals buffers
//! and `#[repr(C)]` structs across the call boundary, and turns the native
//! return values into typed [`Error`]s. Each native call runs on tokio's
//! blocking pool so awaiting it never stalls the runtime.
//!
//! ## Features
//!
//! *   Device discovery and lifecycle (`scan`, `open`, `info`, `close`, `reset`,
//!     `set_power_level`).
//! *   GPIO: input/output/open-drain configuration with pull resistors, masked
//!     write/read, timed pulse trains.
//! *   I²C: per-bus init, write/read/write-read, page (block) transfers, slave
//!     mode transfers.
//! *   SPI: per-index init, write (blocking and async), read, write-read with
//!     inter-phase delay, chunked writes for large buffers.
//!
//! ## Native Library Location
//!
//! The library is looked up at `<root>/usb2xxx/<os>/<arch>/<file>`, with
//! `<os>` one of `darwin`, `linux`, `win32` and `<arch>` one of `x64`,
//! `ia32`, `arm64`, `arm`. `<root>` is taken from the `USB2XXX_ROOT`
//! environment variable, the running executable's directory, or this crate's
//! directory, in that order. On Linux `libusb-1.0` is preloaded first. On
//! Windows the library's directory is added to the process DLL search path
//! (`SetDllDirectoryW`) so DLLs it loads later resolve from there as well.
//!
//! ## Basic Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use usb2xxx::{I2cAddress, I2cConfig, I2cIndex, Result, Usb2xxx};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let usb = Usb2xxx::new()?;
//!     let Some(&handle) = usb.scan().await?.first() else {
//!         println!("No devices");
//!         return Ok(());
//!     };
//!     let Some(dev) = usb.open(handle).await? else {
//!         println!("Device not opened");
//!         return Ok(());
//!     };
//!
//!     dev.i2c.init(I2cIndex::I2c0, &I2cConfig::default()).await?;
//!     let addr = I2cAddress::new_7bit(0x44)?;
//!     let data = dev
//!         .i2c
//!         .write_read_bytes(I2cIndex::I2c0, addr, &[0x2c, 0x06], 6, Duration::from_millis(200))
//!         .await?;
//!     println!("{:02X?}", data);
//!     dev.device.close().await
//! }
//! ```
//!
//! ## Concurrency
//!
//! The crate has no internal queue or lock. Await each call before issuing
//! the next one on the same handle. Dropping a pending future does not
//! cancel the native call already dispatched.

use log::debug;
use std::fmt;
use std::sync::Arc;

pub mod consts;
pub mod device;
mod error;
pub mod gpio;
pub mod i2c;
pub mod marshal;
pub mod native;
pub mod spi;

pub use device::{Device, DeviceHandle, PowerLevel};
pub use error::{Error, Peripheral, Result};
pub use gpio::{Gpio, GpioMode, GpioPin, GpioPull};
pub use i2c::{I2c, I2cAddress, I2cAddressWidth, I2cConfig, I2cIndex, I2cRole};
pub use marshal::{DeviceInfo, Version};
pub use native::{NativeApi, NativeLibrary};
pub use spi::{
    BitOrder, ClockPhase, ClockPolarity, SelectPolarity, Spi, SpiConfig, SpiIndex, SpiMode,
    SpiRole,
};

/// Entry point: enumerates and opens adapters through one native library.
#[derive(Clone)]
pub struct Usb2xxx {
    native: Arc<dyn NativeApi>,
}

impl fmt::Debug for Usb2xxx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Usb2xxx").finish_non_exhaustive()
    }
}

impl Usb2xxx {
    /// Uses the process-wide native library, loading it on first use.
    ///
    /// Fails with [`Error::UnsupportedPlatform`], [`Error::LibraryNotFound`] or
    /// [`Error::MissingSymbol`] before any device call is possible.
    pub fn new() -> Result<Self> {
        let native: Arc<dyn NativeApi> = NativeLibrary::global()?;
        Ok(Self::with_native(native))
    }

    /// Uses a specific implementation of the native call table.
    pub fn with_native(native: Arc<dyn NativeApi>) -> Self {
        Usb2xxx { native }
    }

    /// Lists the handles of attached adapters (at most
    /// [`consts::MAX_DEVICES`]). An empty list means no adapter.
    pub async fn scan(&self) -> Result<Vec<DeviceHandle>> {
        device::scan(&self.native).await
    }

    /// Opens `handle`. Returns `None` when the native library refuses it.
    pub async fn open(&self, handle: DeviceHandle) -> Result<Option<UsbDevice>> {
        if device::open(&self.native, handle).await? {
            Ok(Some(UsbDevice::new(Arc::clone(&self.native), handle)))
        } else {
            debug!("Device {} could not be opened", handle);
            Ok(None)
        }
    }

    /// Opens the first adapter found. **Warning:** Ambiguous if multiple devices exist.
    pub async fn open_first(&self) -> Result<Option<UsbDevice>> {
        match self.scan().await?.first() {
            Some(&handle) => self.open(handle).await,
            None => Ok(None),
        }
    }
}

/// An opened adapter with its peripheral modules.
#[derive(Debug, Clone)]
pub struct UsbDevice {
    handle: DeviceHandle,
    /// Lifecycle and identity.
    pub device: Device,
    pub gpio: Gpio,
    pub i2c: I2c,
    pub spi: Spi,
}

impl UsbDevice {
    fn new(native: Arc<dyn NativeApi>, handle: DeviceHandle) -> Self {
        UsbDevice {
            handle,
            device: Device::new(Arc::clone(&native), handle),
            gpio: Gpio::new(Arc::clone(&native), handle),
            i2c: I2c::new(Arc::clone(&native), handle),
            spi: Spi::new(native, handle),
        }
    }

    /// The native handle shared by all modules of this device.
    pub fn handle(&self) -> DeviceHandle {
        self.handle
    }
}
