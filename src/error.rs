use std::fmt;
use std::os::raw::c_int;
use std::path::PathBuf;
use thiserror::Error;

/// Peripheral class whose native call reported an error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Peripheral {
    Gpio,
    I2c,
    Spi,
}

impl fmt::Display for Peripheral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Peripheral::Gpio => write!(f, "GPIO"),
            Peripheral::I2c => write!(f, "I2C"),
            Peripheral::Spi => write!(f, "SPI"),
        }
    }
}

/// Errors that can occur when using a USB2XXX adapter.
///
/// Load-time variants (`UnsupportedPlatform`, `LibraryNotFound`,
/// `MissingSymbol`) are fatal: no call surface exists without the library.
/// Call failures keep the two native reporting conventions apart. Device
/// lifecycle calls only return a boolean and map to [`Error::DeviceFailed`];
/// GPIO, I2C and SPI calls return an integer code carried by [`Error::Native`].
#[derive(Error, Debug)]
pub enum Error {
    /// No native artifact exists for this operating system or architecture.
    #[error("USB2XXX is not supported on {os}/{arch}")]
    UnsupportedPlatform {
        /// Operating system as reported by the Rust target.
        os: String,
        /// Processor architecture as reported by the Rust target.
        arch: String,
    },
    /// The shared library could not be loaded from the resolved path.
    #[error("Failed to load native library at '{}': {source}", path.display())]
    LibraryNotFound {
        /// Path that was tried.
        path: PathBuf,
        /// Loader error.
        source: libloading::Error,
    },
    /// The shared library loaded but does not export an expected entry point.
    #[error("Native library does not export '{name}': {source}")]
    MissingSymbol {
        /// Exported symbol name.
        name: &'static str,
        /// Loader error.
        source: libloading::Error,
    },
    /// A boolean-returning device call reported failure.
    #[error("USB device operation '{operation}' failed")]
    DeviceFailed {
        /// Name of the native operation.
        operation: &'static str,
    },
    /// A code-returning peripheral call reported a non-zero result.
    #[error("{peripheral} operation '{operation}' failed with error: {code}")]
    Native {
        /// Peripheral class of the call.
        peripheral: Peripheral,
        /// Name of the native operation.
        operation: &'static str,
        /// Raw code returned by the native library.
        code: i32,
    },
    /// Function argument is outside the range the native call accepts.
    #[error("Argument out of range: {0}")]
    ArgumentOutOfRange(String),
    /// Invalid 10-bit I2C address specified.
    #[error("Invalid I2C 10-bit address: {0:04X}")]
    InvalidI2c10BitAddress(u16),
    /// The blocking worker running a native call panicked.
    #[error("Native call dispatch failed: {0}")]
    Dispatch(#[from] tokio::task::JoinError),
}

/// Result type alias for USB2XXX operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Maps the integer convention (0 = success) onto [`Error::Native`].
pub(crate) fn check_code(
    peripheral: Peripheral,
    operation: &'static str,
    code: c_int,
) -> Result<()> {
    if code == 0 {
        Ok(())
    } else {
        log::warn!("{} {} returned error code {}", peripheral, operation, code);
        Err(Error::Native {
            peripheral,
            operation,
            code,
        })
    }
}

/// Maps the boolean convention onto [`Error::DeviceFailed`].
pub(crate) fn check_flag(operation: &'static str, ok: bool) -> Result<()> {
    if ok {
        Ok(())
    } else {
        log::warn!("{} reported failure", operation);
        Err(Error::DeviceFailed { operation })
    }
}

/// Counting calls report a count when non-negative and an error code otherwise.
pub(crate) fn check_count(
    peripheral: Peripheral,
    operation: &'static str,
    ret: c_int,
) -> Result<usize> {
    if ret >= 0 {
        Ok(ret as usize)
    } else {
        check_code(peripheral, operation, ret).map(|_| 0)
    }
}
