//! Fixed-layout records and buffer conversions for the native call boundary.
//!
//! Every record here mirrors a struct from the vendor headers field for
//! field. A wrong width or order does not fail loudly, it corrupts data, so
//! sizes and offsets are asserted at compile time.

use crate::consts;
use crate::error::{Error, Result};
use std::fmt;
use std::mem::{offset_of, size_of};
use std::os::raw::{c_char, c_int};
use std::time::Duration;

/// `DEVICE_INFO` as filled by `DEV_GetDeviceInfo`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DeviceInfoRaw {
    pub firmware_name: [c_char; 32],
    pub build_date: [c_char; 32],
    pub hardware_version: u32,
    pub firmware_version: u32,
    pub serial_number: [u32; 3],
    pub functions: u32,
}

impl Default for DeviceInfoRaw {
    fn default() -> Self {
        DeviceInfoRaw {
            firmware_name: [0; 32],
            build_date: [0; 32],
            hardware_version: 0,
            firmware_version: 0,
            serial_number: [0; 3],
            functions: 0,
        }
    }
}

/// `IIC_CONFIG` passed to `IIC_Init`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct I2cConfigRaw {
    pub clock_speed_hz: u32,
    pub own_addr: u16,
    pub master: u8,
    pub addr_bits: u8,
    pub enable_pu: u8,
}

/// `SPI_CONFIG` passed to `SPI_Init`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpiConfigRaw {
    pub mode: i8,
    pub master: i8,
    pub cpol: i8,
    pub cpha: i8,
    pub lsb_first: i8,
    pub sel_polarity: i8,
    pub clock_speed_hz: u32,
}

const _: () = {
    assert!(size_of::<DeviceInfoRaw>() == 88);
    assert!(offset_of!(DeviceInfoRaw, hardware_version) == 64);
    assert!(offset_of!(DeviceInfoRaw, serial_number) == 72);
    assert!(offset_of!(DeviceInfoRaw, functions) == 84);
    assert!(size_of::<I2cConfigRaw>() == 12);
    assert!(offset_of!(I2cConfigRaw, own_addr) == 4);
    assert!(offset_of!(I2cConfigRaw, enable_pu) == 8);
    assert!(size_of::<SpiConfigRaw>() == 12);
    assert!(offset_of!(SpiConfigRaw, clock_speed_hz) == 8);
};

/// Hardware or firmware version decoded from a packed 32-bit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub patch: u16,
}

impl Version {
    /// Splits `0xMMmmPPPP` into its three components.
    pub fn from_packed(packed: u32) -> Self {
        Version {
            major: ((packed >> 24) & 0xFF) as u8,
            minor: ((packed >> 16) & 0xFF) as u8,
            patch: (packed & 0xFFFF) as u16,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Snapshot of the adapter's identity, read on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub firmware_name: String,
    pub build_date: String,
    pub hardware_version: Version,
    pub firmware_version: Version,
    /// 24 uppercase hex digits.
    pub serial_number: String,
    /// Capability names such as `"IIC"` or `"SPI"`.
    pub functions: Vec<String>,
}

impl DeviceInfo {
    pub(crate) fn from_raw(raw: &DeviceInfoRaw, functions: &[c_char]) -> Self {
        DeviceInfo {
            firmware_name: read_c_string(&raw.firmware_name),
            build_date: read_c_string(&raw.build_date),
            hardware_version: Version::from_packed(raw.hardware_version),
            firmware_version: Version::from_packed(raw.firmware_version),
            serial_number: serial_to_hex(&raw.serial_number),
            functions: split_functions(&read_c_string(functions)),
        }
    }

    /// Whether the adapter advertises a capability (case-insensitive).
    pub fn supports(&self, function: &str) -> bool {
        self.functions
            .iter()
            .any(|f| f.eq_ignore_ascii_case(function))
    }
}

/// Reads a NUL-terminated string out of a fixed `char` array.
/// The whole array is used when no terminator is present.
pub fn read_c_string(buf: &[c_char]) -> String {
    let bytes: Vec<u8> = buf
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Each group is rendered most significant byte first.
pub fn serial_to_hex(serial: &[u32; 3]) -> String {
    serial.iter().map(|group| format!("{:08X}", group)).collect()
}

/// Splits the comma-separated capability list, dropping blank entries.
pub fn split_functions(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(String::from)
        .collect()
}

/// Converts a buffer length to the native `int` width.
pub(crate) fn c_len(len: usize) -> Result<c_int> {
    c_int::try_from(len).map_err(|_| {
        Error::ArgumentOutOfRange(format!("Buffer length {} exceeds native limit", len))
    })
}

/// Converts a timeout to whole milliseconds in the native `int` width.
pub(crate) fn c_timeout_ms(timeout: Duration) -> Result<c_int> {
    c_int::try_from(timeout.as_millis()).map_err(|_| {
        Error::ArgumentOutOfRange(format!("Timeout {:?} exceeds native limit", timeout))
    })
}

/// Converts a non-negative count argument (block size, interval) to `int`.
pub(crate) fn c_count(name: &str, value: u32) -> Result<c_int> {
    c_int::try_from(value).map_err(|_| {
        Error::ArgumentOutOfRange(format!("{} {} exceeds native limit", name, value))
    })
}

/// Function-list buffer sized for `DEV_GetDeviceInfo`.
pub(crate) fn function_buffer() -> Vec<c_char> {
    vec![0; consts::FUNCTION_STRING_CAPACITY]
}
