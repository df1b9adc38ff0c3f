//! Device discovery and lifecycle for USB2XXX adapters.

use crate::consts;
use crate::error::{check_flag, Result};
use crate::marshal::{self, DeviceInfo, DeviceInfoRaw};
use crate::native::{dispatch, NativeApi};
use log::{debug, trace, warn};
use std::fmt;
use std::os::raw::{c_char, c_int};
use std::sync::Arc;

/// Opaque handle of an attached adapter, as reported by `USB_ScanDevice`.
///
/// The native library owns the device session; this is only its identifier.
/// Do not use a handle after [`Device::close`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceHandle(pub(crate) c_int);

impl DeviceHandle {
    /// Wraps a raw native handle value.
    pub fn from_raw(raw: i32) -> Self {
        DeviceHandle(raw)
    }

    /// Returns the raw native handle value.
    #[inline]
    pub fn raw(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// Output voltage selector for `DEV_SetPowerLevel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PowerLevel(pub u8);

impl PowerLevel {
    pub const NONE: PowerLevel = PowerLevel(0);
    pub const V1_8: PowerLevel = PowerLevel(1);
    pub const V2_5: PowerLevel = PowerLevel(2);
    pub const V3_3: PowerLevel = PowerLevel(3);
}

/// Enumerates attached adapters.
///
/// At most [`consts::MAX_DEVICES`] handles are returned. A count outside
/// `0..=MAX_DEVICES` from the native side is clamped. No adapters is an empty
/// list, not an error.
pub(crate) async fn scan(native: &Arc<dyn NativeApi>) -> Result<Vec<DeviceHandle>> {
    let (count, handles) = dispatch(native, |api| {
        let mut handles: [c_int; consts::MAX_DEVICES] = [0; consts::MAX_DEVICES];
        let count = api.usb_scan_device(&mut handles);
        (count, handles)
    })
    .await?;

    if !(0..=consts::MAX_DEVICES as c_int).contains(&count) {
        warn!(
            "USB_ScanDevice reported {} devices, clamping to 0..={}",
            count,
            consts::MAX_DEVICES
        );
    }
    let count = count.clamp(0, consts::MAX_DEVICES as c_int) as usize;
    let found: Vec<DeviceHandle> = handles[..count].iter().copied().map(DeviceHandle).collect();
    debug!("Found {} USB2XXX device(s): {:?}", found.len(), found);
    Ok(found)
}

/// Asks the native library to open (and validate) a handle.
pub(crate) async fn open(native: &Arc<dyn NativeApi>, handle: DeviceHandle) -> Result<bool> {
    let opened = dispatch(native, move |api| api.usb_open_device(handle.0)).await?;
    debug!("USB_OpenDevice({}) -> {}", handle, opened);
    Ok(opened)
}

/// Lifecycle operations scoped to one opened handle.
#[derive(Clone)]
pub struct Device {
    native: Arc<dyn NativeApi>,
    handle: DeviceHandle,
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device").field("handle", &self.handle).finish()
    }
}

impl Device {
    pub(crate) fn new(native: Arc<dyn NativeApi>, handle: DeviceHandle) -> Self {
        Device { native, handle }
    }

    /// The handle these operations target.
    pub fn handle(&self) -> DeviceHandle {
        self.handle
    }

    /// Reads firmware name, build date, versions, serial and capabilities.
    ///
    /// Returns `Ok(None)` when the native call reports failure; the partially
    /// filled record is discarded. Nothing is cached.
    pub async fn info(&self) -> Result<Option<DeviceInfo>> {
        let handle = self.handle;
        let (ok, raw, functions) = dispatch(&self.native, move |api| {
            let mut raw = DeviceInfoRaw::default();
            let mut functions = marshal::function_buffer();
            let ok = api.dev_get_device_info(handle.0, &mut raw, &mut functions);
            (ok, raw, functions)
        })
        .await?;

        if !ok {
            warn!("DEV_GetDeviceInfo failed for {}", handle);
            return Ok(None);
        }
        trace!("Raw device info for {}: {:?}", handle, raw);
        Ok(Some(DeviceInfo::from_raw(&raw, &functions)))
    }

    /// Closes the device. The handle must not be used afterwards.
    pub async fn close(&self) -> Result<()> {
        let handle = self.handle;
        debug!("Closing device {}", handle);
        let ok = dispatch(&self.native, move |api| api.usb_close_device(handle.0)).await?;
        check_flag("USB_CloseDevice", ok)
    }

    /// Resets the adapter.
    pub async fn reset(&self) -> Result<()> {
        let handle = self.handle;
        debug!("Resetting device {}", handle);
        let ok = dispatch(&self.native, move |api| api.usb_reset_device(handle.0)).await?;
        check_flag("USB_ResetDevice", ok)
    }

    /// Selects the voltage the adapter supplies on its power pins.
    pub async fn set_power_level(&self, level: PowerLevel) -> Result<()> {
        let handle = self.handle;
        debug!("Setting power level {} on {}", level.0, handle);
        let ok = dispatch(&self.native, move |api| {
            api.dev_set_power_level(handle.0, level.0 as c_char)
        })
        .await?;
        check_flag("DEV_SetPowerLevel", ok)
    }
}
