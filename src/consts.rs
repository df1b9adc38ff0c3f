//! Fixed capacities, library artifact names and defaults.

use std::time::Duration;

/// Maximum number of devices `USB_ScanDevice` may report in one call.
pub const MAX_DEVICES: usize = 10;

/// Capacity of the function-list buffer passed to `DEV_GetDeviceInfo`.
pub const FUNCTION_STRING_CAPACITY: usize = 256;

/// Chunk size used by [`crate::Spi::write_chunked`] callers for large transfers.
pub const SPI_ASYNC_CHUNK_LEN: usize = 10 * 1024;

/// Receive buffer handed to `IIC_SlaveReadBytes`.
pub const I2C_SLAVE_READ_CAPACITY: usize = 1024;

/// Default I2C timeout for callers that don't pick one.
pub const DEFAULT_I2C_TIMEOUT: Duration = Duration::from_millis(500);

/// Environment variable overriding the install root searched for the native library.
pub const ROOT_ENV_VAR: &str = "USB2XXX_ROOT";

/// Directory under the install root holding per-platform artifacts.
pub const LIB_SUBDIR: &str = "usb2xxx";

pub mod lib_file {
    pub const MACOS: &str = "libUSB2XXX.dylib";
    pub const LINUX: &str = "libUSB2XXX.so";
    pub const WINDOWS: &str = "USB2XXX.dll";

    /// libusb copy shipped next to the Linux artifact.
    pub const LINUX_LIBUSB_BUNDLED: &str = "libusb-1.0.so";
    /// System soname tried when no bundled copy exists.
    pub const LINUX_LIBUSB_SYSTEM: &str = "libusb-1.0.so.0";
}
