//! Loading the vendor library and the table of its exported entry points.

use crate::consts;
use crate::error::{Error, Result};
use crate::marshal::{DeviceInfoRaw, I2cConfigRaw, SpiConfigRaw};
use libloading::Library;
use log::{debug, trace};
use once_cell::sync::OnceCell;
use std::os::raw::{c_char, c_int, c_short};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The USB2XXX export table as seen from Rust.
///
/// One method per native entry point, taking the native argument types.
/// Buffers are passed as slices whose length is the capacity the native
/// side may use. `NativeLibrary` forwards the length as the matching `int`
/// argument where the C signature has one (clamped to `c_int::MAX`). Exports
/// without a length argument fill a buffer of fixed capacity
/// ([`consts::MAX_DEVICES`], [`consts::FUNCTION_STRING_CAPACITY`],
/// [`consts::I2C_SLAVE_READ_CAPACITY`]) of which the slice receives a prefix.
///
/// `NativeLibrary` is the real implementation. Anything else implementing
/// this trait (a recording fake in tests, a simulator) can be plugged into
/// [`crate::Usb2xxx::with_native`].
pub trait NativeApi: Send + Sync {
    // Device
    /// Fills `handles` and returns the number of devices found.
    fn usb_scan_device(&self, handles: &mut [c_int]) -> c_int;
    fn usb_open_device(&self, handle: c_int) -> bool;
    fn usb_close_device(&self, handle: c_int) -> bool;
    fn usb_reset_device(&self, handle: c_int) -> bool;
    fn dev_get_device_info(
        &self,
        handle: c_int,
        info: &mut DeviceInfoRaw,
        functions: &mut [c_char],
    ) -> bool;
    fn dev_set_power_level(&self, handle: c_int, level: c_char) -> bool;

    // GPIO
    fn gpio_set_input(&self, handle: c_int, pin_mask: u32, pull: u8) -> c_int;
    fn gpio_set_output(&self, handle: c_int, pin_mask: u32, pull: u8) -> c_int;
    fn gpio_set_open_drain(&self, handle: c_int, pin_mask: u32, pull: u8) -> c_int;
    fn gpio_write(&self, handle: c_int, pin_mask: u32, value: u32) -> c_int;
    fn gpio_read(&self, handle: c_int, pin_mask: u32, value: &mut u32) -> c_int;
    fn gpio_send_pulses(
        &self,
        handle: c_int,
        pin_mask: u32,
        pulse_width_us: u32,
        pulse_period_us: u32,
        pulse_count: u32,
    ) -> c_int;

    // I2C
    fn iic_init(&self, handle: c_int, index: c_int, config: &mut I2cConfigRaw) -> c_int;
    fn iic_get_slave_addr(&self, handle: c_int, index: c_int, addr: &mut u16) -> c_int;
    fn iic_write_bytes(
        &self,
        handle: c_int,
        index: c_int,
        addr: c_short,
        data: &mut [u8],
        timeout_ms: c_int,
    ) -> c_int;
    fn iic_read_bytes(
        &self,
        handle: c_int,
        index: c_int,
        addr: c_short,
        data: &mut [u8],
        timeout_ms: c_int,
    ) -> c_int;
    fn iic_write_read_bytes(
        &self,
        handle: c_int,
        index: c_int,
        addr: c_short,
        write: &mut [u8],
        read: &mut [u8],
        timeout_ms: c_int,
    ) -> c_int;
    fn iic_block_write_bytes(
        &self,
        handle: c_int,
        index: c_int,
        addr: c_short,
        data: &mut [u8],
        block_size: c_int,
        interval_ms: c_int,
    ) -> c_int;
    fn iic_block_read_bytes(
        &self,
        handle: c_int,
        index: c_int,
        addr: c_short,
        data: &mut [u8],
        block_size: c_int,
        interval_ms: c_int,
    ) -> c_int;
    fn iic_slave_write_bytes(
        &self,
        handle: c_int,
        index: c_int,
        data: &mut [u8],
        timeout_ms: c_int,
    ) -> c_int;
    /// Returns the received count, or a negative error code.
    fn iic_slave_read_bytes(
        &self,
        handle: c_int,
        index: c_int,
        data: &mut [u8],
        timeout_ms: c_int,
    ) -> c_int;
    fn iic_slave_write_remain(&self, handle: c_int, index: c_int) -> c_int;

    // SPI
    fn spi_init(&self, handle: c_int, index: c_int, config: &mut SpiConfigRaw) -> c_int;
    fn spi_write_bytes(&self, handle: c_int, index: c_int, data: &mut [u8]) -> c_int;
    fn spi_write_bytes_async(&self, handle: c_int, index: c_int, data: &mut [u8]) -> c_int;
    fn spi_read_bytes(&self, handle: c_int, index: c_int, data: &mut [u8]) -> c_int;
    fn spi_write_read_bytes(
        &self,
        handle: c_int,
        index: c_int,
        write: &mut [u8],
        read: &mut [u8],
        interval_us: c_int,
    ) -> c_int;
}

/// Runs one native call on the blocking pool and awaits its result.
///
/// The closure owns everything it passes to the native side, so buffers live
/// exactly as long as the call.
pub(crate) async fn dispatch<F, R>(native: &Arc<dyn NativeApi>, call: F) -> Result<R>
where
    F: FnOnce(&dyn NativeApi) -> R + Send + 'static,
    R: Send + 'static,
{
    let native = Arc::clone(native);
    let ret = tokio::task::spawn_blocking(move || call(native.as_ref())).await?;
    Ok(ret)
}

// --- Platform resolution ---

/// File name of the native artifact for an operating system
/// (values of `std::env::consts::OS`).
pub fn library_file_name(os: &str) -> Option<&'static str> {
    match os {
        "macos" => Some(consts::lib_file::MACOS),
        "linux" => Some(consts::lib_file::LINUX),
        "windows" => Some(consts::lib_file::WINDOWS),
        _ => None,
    }
}

fn os_dir(os: &str) -> Option<&'static str> {
    match os {
        "macos" => Some("darwin"),
        "linux" => Some("linux"),
        "windows" => Some("win32"),
        _ => None,
    }
}

fn arch_dir(arch: &str) -> Option<&'static str> {
    match arch {
        "x86_64" => Some("x64"),
        "x86" => Some("ia32"),
        "aarch64" => Some("arm64"),
        "arm" => Some("arm"),
        _ => None,
    }
}

/// Path of the native artifact below `root` for the given OS and architecture.
///
/// Layout: `<root>/usb2xxx/<os>/<arch>/<file>`.
pub fn library_path(root: &Path, os: &str, arch: &str) -> Result<PathBuf> {
    let unsupported = || Error::UnsupportedPlatform {
        os: os.to_string(),
        arch: arch.to_string(),
    };
    let file = library_file_name(os).ok_or_else(unsupported)?;
    let os_dir = os_dir(os).ok_or_else(unsupported)?;
    let arch_dir = arch_dir(arch).ok_or_else(unsupported)?;
    Ok(root
        .join(consts::LIB_SUBDIR)
        .join(os_dir)
        .join(arch_dir)
        .join(file))
}

/// Install roots searched in order: `USB2XXX_ROOT`, the executable's
/// directory, then this crate's manifest directory.
fn candidate_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(root) = std::env::var_os(consts::ROOT_ENV_VAR) {
        roots.push(PathBuf::from(root));
    }
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        roots.push(dir);
    }
    roots.push(PathBuf::from(env!("CARGO_MANIFEST_DIR")));
    roots
}

/// Picks the first candidate root that actually contains the artifact,
/// falling back to the first candidate so the load error names a path.
fn discover_library_path() -> Result<PathBuf> {
    let mut first = None;
    for root in candidate_roots() {
        let path = library_path(&root, std::env::consts::OS, std::env::consts::ARCH)?;
        trace!("Looking for native library at {}", path.display());
        if path.is_file() {
            return Ok(path);
        }
        first.get_or_insert(path);
    }
    // candidate_roots always yields the manifest dir
    first.ok_or_else(|| Error::UnsupportedPlatform {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
    })
}

// --- Loading ---

#[cfg(target_os = "linux")]
fn preload_dependencies(lib_path: &Path) -> Vec<Library> {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_GLOBAL, RTLD_NOW};

    // libUSB2XXX.so leaves its libusb symbols unresolved, they must already
    // be visible globally when it is opened.
    let bundled = lib_path.with_file_name(consts::lib_file::LINUX_LIBUSB_BUNDLED);
    let candidates = [
        bundled.into_os_string(),
        consts::lib_file::LINUX_LIBUSB_SYSTEM.into(),
    ];
    for candidate in candidates {
        match unsafe { UnixLibrary::open(Some(&candidate), RTLD_NOW | RTLD_GLOBAL) } {
            Ok(lib) => {
                debug!("Preloaded libusb from {:?}", candidate);
                return vec![lib.into()];
            }
            Err(e) => trace!("libusb not loadable from {:?}: {}", candidate, e),
        }
    }
    log::warn!("Could not preload libusb-1.0; relying on the system loader");
    Vec::new()
}

#[cfg(not(target_os = "linux"))]
fn preload_dependencies(_lib_path: &Path) -> Vec<Library> {
    Vec::new()
}

/// NUL-terminated UTF-16 directory of `lib_path`, for `SetDllDirectoryW`.
#[cfg(windows)]
fn dll_directory_wide(lib_path: &Path) -> Option<Vec<u16>> {
    use std::os::windows::ffi::OsStrExt;
    let dir = lib_path.parent().filter(|d| !d.as_os_str().is_empty())?;
    Some(dir.as_os_str().encode_wide().chain(std::iter::once(0)).collect())
}

#[cfg(windows)]
unsafe fn open_library(path: &Path) -> std::result::Result<Library, libloading::Error> {
    use libloading::os::windows::{Library as WindowsLibrary, LOAD_WITH_ALTERED_SEARCH_PATH};
    use windows_sys::Win32::System::LibraryLoader::SetDllDirectoryW;

    // The search path covers DLLs the vendor library loads lazily; the load
    // flag covers its import table.
    if let Some(dir) = dll_directory_wide(path) {
        if SetDllDirectoryW(dir.as_ptr()) == 0 {
            log::warn!("SetDllDirectoryW failed for {}", path.display());
        }
    }
    WindowsLibrary::load_with_flags(path, LOAD_WITH_ALTERED_SEARCH_PATH).map(Library::from)
}

#[cfg(not(windows))]
unsafe fn open_library(path: &Path) -> std::result::Result<Library, libloading::Error> {
    Library::new(path)
}

/// Copies a typed function pointer out of the library.
///
/// # Safety
/// `T` must match the C signature of the export.
unsafe fn symbol<T: Copy>(lib: &Library, name: &'static str) -> Result<T> {
    let sym = lib
        .get::<T>(name.as_bytes())
        .map_err(|source| Error::MissingSymbol { name, source })?;
    Ok(*sym)
}

type ScanDeviceFn = unsafe extern "system" fn(*mut c_int) -> c_int;
type HandleFn = unsafe extern "system" fn(c_int) -> bool;
type GetDeviceInfoFn = unsafe extern "system" fn(c_int, *mut DeviceInfoRaw, *mut c_char) -> bool;
type SetPowerLevelFn = unsafe extern "system" fn(c_int, c_char) -> bool;
type GpioModeFn = unsafe extern "system" fn(c_int, u32, u8) -> c_int;
type GpioWriteFn = unsafe extern "system" fn(c_int, u32, u32) -> c_int;
type GpioReadFn = unsafe extern "system" fn(c_int, u32, *mut u32) -> c_int;
type GpioSendPulsesFn = unsafe extern "system" fn(c_int, u32, u32, u32, u32) -> c_int;
type IicInitFn = unsafe extern "system" fn(c_int, c_int, *mut I2cConfigRaw) -> c_int;
type IicGetSlaveAddrFn = unsafe extern "system" fn(c_int, c_int, *mut u16) -> c_int;
type IicTransferFn = unsafe extern "system" fn(c_int, c_int, c_short, *mut u8, c_int, c_int) -> c_int;
type IicWriteReadFn =
    unsafe extern "system" fn(c_int, c_int, c_short, *mut u8, c_int, *mut u8, c_int, c_int) -> c_int;
type IicBlockFn =
    unsafe extern "system" fn(c_int, c_int, c_short, *mut u8, c_int, c_int, c_int) -> c_int;
type IicSlaveWriteFn = unsafe extern "system" fn(c_int, c_int, *mut u8, c_int, c_int) -> c_int;
type IicSlaveReadFn = unsafe extern "system" fn(c_int, c_int, *mut u8, c_int) -> c_int;
type IicSlaveWriteRemainFn = unsafe extern "system" fn(c_int, c_int) -> c_int;
type SpiInitFn = unsafe extern "system" fn(c_int, c_int, *mut SpiConfigRaw) -> c_int;
type SpiTransferFn = unsafe extern "system" fn(c_int, c_int, *mut u8, c_int) -> c_int;
type SpiWriteReadFn = unsafe extern "system" fn(c_int, c_int, *mut u8, c_int, *mut u8, c_int, c_int) -> c_int;

struct Symbols {
    usb_scan_device: ScanDeviceFn,
    usb_open_device: HandleFn,
    usb_close_device: HandleFn,
    usb_reset_device: HandleFn,
    dev_get_device_info: GetDeviceInfoFn,
    dev_set_power_level: SetPowerLevelFn,
    gpio_set_input: GpioModeFn,
    gpio_set_output: GpioModeFn,
    gpio_set_open_drain: GpioModeFn,
    gpio_write: GpioWriteFn,
    gpio_read: GpioReadFn,
    gpio_send_pulses: GpioSendPulsesFn,
    iic_init: IicInitFn,
    iic_get_slave_addr: IicGetSlaveAddrFn,
    iic_write_bytes: IicTransferFn,
    iic_read_bytes: IicTransferFn,
    iic_write_read_bytes: IicWriteReadFn,
    iic_block_write_bytes: IicBlockFn,
    iic_block_read_bytes: IicBlockFn,
    iic_slave_write_bytes: IicSlaveWriteFn,
    iic_slave_read_bytes: IicSlaveReadFn,
    iic_slave_write_remain: IicSlaveWriteRemainFn,
    spi_init: SpiInitFn,
    spi_write_bytes: SpiTransferFn,
    spi_write_bytes_async: SpiTransferFn,
    spi_read_bytes: SpiTransferFn,
    spi_write_read_bytes: SpiWriteReadFn,
}

impl Symbols {
    unsafe fn resolve(lib: &Library) -> Result<Self> {
        Ok(Symbols {
            usb_scan_device: symbol(lib, "USB_ScanDevice")?,
            usb_open_device: symbol(lib, "USB_OpenDevice")?,
            usb_close_device: symbol(lib, "USB_CloseDevice")?,
            usb_reset_device: symbol(lib, "USB_ResetDevice")?,
            dev_get_device_info: symbol(lib, "DEV_GetDeviceInfo")?,
            dev_set_power_level: symbol(lib, "DEV_SetPowerLevel")?,
            gpio_set_input: symbol(lib, "GPIO_SetInput")?,
            gpio_set_output: symbol(lib, "GPIO_SetOutput")?,
            gpio_set_open_drain: symbol(lib, "GPIO_SetOpenDrain")?,
            gpio_write: symbol(lib, "GPIO_Write")?,
            gpio_read: symbol(lib, "GPIO_Read")?,
            gpio_send_pulses: symbol(lib, "GPIO_SendPulses")?,
            iic_init: symbol(lib, "IIC_Init")?,
            iic_get_slave_addr: symbol(lib, "IIC_GetSlaveAddr")?,
            iic_write_bytes: symbol(lib, "IIC_WriteBytes")?,
            iic_read_bytes: symbol(lib, "IIC_ReadBytes")?,
            iic_write_read_bytes: symbol(lib, "IIC_WriteReadBytes")?,
            iic_block_write_bytes: symbol(lib, "IIC_BlockWriteBytes")?,
            iic_block_read_bytes: symbol(lib, "IIC_BlockReadBytes")?,
            iic_slave_write_bytes: symbol(lib, "IIC_SlaveWriteBytes")?,
            iic_slave_read_bytes: symbol(lib, "IIC_SlaveReadBytes")?,
            iic_slave_write_remain: symbol(lib, "IIC_SlaveWriteRemain")?,
            spi_init: symbol(lib, "SPI_Init")?,
            spi_write_bytes: symbol(lib, "SPI_WriteBytes")?,
            spi_write_bytes_async: symbol(lib, "SPI_WriteBytesAsync")?,
            spi_read_bytes: symbol(lib, "SPI_ReadBytes")?,
            spi_write_read_bytes: symbol(lib, "SPI_WriteReadBytes")?,
        })
    }
}

/// The loaded vendor library with every export resolved.
pub struct NativeLibrary {
    path: PathBuf,
    symbols: Symbols,
    // Keeps the function pointers in `symbols` valid. Declared after them so
    // the library is unloaded last.
    _lib: Library,
    _deps: Vec<Library>,
}

static GLOBAL: OnceCell<Arc<NativeLibrary>> = OnceCell::new();

impl NativeLibrary {
    /// The process-wide library, loaded from the discovered install root on
    /// first use. A failed load is retried on the next call.
    pub fn global() -> Result<Arc<NativeLibrary>> {
        GLOBAL
            .get_or_try_init(|| Self::load_path(&discover_library_path()?).map(Arc::new))
            .cloned()
    }

    /// Loads the library below an explicit install root.
    pub fn load_from(root: impl AsRef<Path>) -> Result<NativeLibrary> {
        let path = library_path(
            root.as_ref(),
            std::env::consts::OS,
            std::env::consts::ARCH,
        )?;
        Self::load_path(&path)
    }

    /// Loads the library from an exact file path.
    pub fn load_path(path: &Path) -> Result<NativeLibrary> {
        debug!("Loading native library from {}", path.display());
        let deps = preload_dependencies(path);
        let lib = unsafe { open_library(path) }.map_err(|source| Error::LibraryNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        // Every type alias above mirrors the vendor header.
        let symbols = unsafe { Symbols::resolve(&lib)? };
        debug!("Native library loaded: {}", path.display());
        Ok(NativeLibrary {
            path: path.to_path_buf(),
            symbols,
            _lib: lib,
            _deps: deps,
        })
    }

    /// Path the library was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for NativeLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeLibrary")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Length argument for a slice. Oversized slices are clamped, so the native
/// side only ever sees a prefix of the buffer.
fn native_len(len: usize) -> c_int {
    c_int::try_from(len).unwrap_or(c_int::MAX)
}

/// Copies as much of a staged buffer as fits into the caller's slice.
fn copy_staged<T: Copy>(staged: &[T], out: &mut [T]) {
    let n = staged.len().min(out.len());
    out[..n].copy_from_slice(&staged[..n]);
}

// Exports without a length argument write into fixed-capacity buffers owned
// here; the caller's slice receives at most its own length.
impl NativeApi for NativeLibrary {
    fn usb_scan_device(&self, handles: &mut [c_int]) -> c_int {
        let mut staged = [0 as c_int; consts::MAX_DEVICES];
        let count = unsafe { (self.symbols.usb_scan_device)(staged.as_mut_ptr()) };
        copy_staged(&staged, handles);
        count
    }

    fn usb_open_device(&self, handle: c_int) -> bool {
        unsafe { (self.symbols.usb_open_device)(handle) }
    }

    fn usb_close_device(&self, handle: c_int) -> bool {
        unsafe { (self.symbols.usb_close_device)(handle) }
    }

    fn usb_reset_device(&self, handle: c_int) -> bool {
        unsafe { (self.symbols.usb_reset_device)(handle) }
    }

    fn dev_get_device_info(
        &self,
        handle: c_int,
        info: &mut DeviceInfoRaw,
        functions: &mut [c_char],
    ) -> bool {
        let mut staged = [0 as c_char; consts::FUNCTION_STRING_CAPACITY];
        let ok = unsafe { (self.symbols.dev_get_device_info)(handle, info, staged.as_mut_ptr()) };
        copy_staged(&staged, functions);
        ok
    }

    fn dev_set_power_level(&self, handle: c_int, level: c_char) -> bool {
        unsafe { (self.symbols.dev_set_power_level)(handle, level) }
    }

    fn gpio_set_input(&self, handle: c_int, pin_mask: u32, pull: u8) -> c_int {
        unsafe { (self.symbols.gpio_set_input)(handle, pin_mask, pull) }
    }

    fn gpio_set_output(&self, handle: c_int, pin_mask: u32, pull: u8) -> c_int {
        unsafe { (self.symbols.gpio_set_output)(handle, pin_mask, pull) }
    }

    fn gpio_set_open_drain(&self, handle: c_int, pin_mask: u32, pull: u8) -> c_int {
        unsafe { (self.symbols.gpio_set_open_drain)(handle, pin_mask, pull) }
    }

    fn gpio_write(&self, handle: c_int, pin_mask: u32, value: u32) -> c_int {
        unsafe { (self.symbols.gpio_write)(handle, pin_mask, value) }
    }

    fn gpio_read(&self, handle: c_int, pin_mask: u32, value: &mut u32) -> c_int {
        unsafe { (self.symbols.gpio_read)(handle, pin_mask, value) }
    }

    fn gpio_send_pulses(
        &self,
        handle: c_int,
        pin_mask: u32,
        pulse_width_us: u32,
        pulse_period_us: u32,
        pulse_count: u32,
    ) -> c_int {
        unsafe {
            (self.symbols.gpio_send_pulses)(
                handle,
                pin_mask,
                pulse_width_us,
                pulse_period_us,
                pulse_count,
            )
        }
    }

    fn iic_init(&self, handle: c_int, index: c_int, config: &mut I2cConfigRaw) -> c_int {
        unsafe { (self.symbols.iic_init)(handle, index, config) }
    }

    fn iic_get_slave_addr(&self, handle: c_int, index: c_int, addr: &mut u16) -> c_int {
        unsafe { (self.symbols.iic_get_slave_addr)(handle, index, addr) }
    }

    fn iic_write_bytes(
        &self,
        handle: c_int,
        index: c_int,
        addr: c_short,
        data: &mut [u8],
        timeout_ms: c_int,
    ) -> c_int {
        unsafe {
            (self.symbols.iic_write_bytes)(
                handle,
                index,
                addr,
                data.as_mut_ptr(),
                native_len(data.len()),
                timeout_ms,
            )
        }
    }

    fn iic_read_bytes(
        &self,
        handle: c_int,
        index: c_int,
        addr: c_short,
        data: &mut [u8],
        timeout_ms: c_int,
    ) -> c_int {
        unsafe {
            (self.symbols.iic_read_bytes)(
                handle,
                index,
                addr,
                data.as_mut_ptr(),
                native_len(data.len()),
                timeout_ms,
            )
        }
    }

    fn iic_write_read_bytes(
        &self,
        handle: c_int,
        index: c_int,
        addr: c_short,
        write: &mut [u8],
        read: &mut [u8],
        timeout_ms: c_int,
    ) -> c_int {
        unsafe {
            (self.symbols.iic_write_read_bytes)(
                handle,
                index,
                addr,
                write.as_mut_ptr(),
                native_len(write.len()),
                read.as_mut_ptr(),
                native_len(read.len()),
                timeout_ms,
            )
        }
    }

    fn iic_block_write_bytes(
        &self,
        handle: c_int,
        index: c_int,
        addr: c_short,
        data: &mut [u8],
        block_size: c_int,
        interval_ms: c_int,
    ) -> c_int {
        unsafe {
            (self.symbols.iic_block_write_bytes)(
                handle,
                index,
                addr,
                data.as_mut_ptr(),
                native_len(data.len()),
                block_size,
                interval_ms,
            )
        }
    }

    fn iic_block_read_bytes(
        &self,
        handle: c_int,
        index: c_int,
        addr: c_short,
        data: &mut [u8],
        block_size: c_int,
        interval_ms: c_int,
    ) -> c_int {
        unsafe {
            (self.symbols.iic_block_read_bytes)(
                handle,
                index,
                addr,
                data.as_mut_ptr(),
                native_len(data.len()),
                block_size,
                interval_ms,
            )
        }
    }

    fn iic_slave_write_bytes(
        &self,
        handle: c_int,
        index: c_int,
        data: &mut [u8],
        timeout_ms: c_int,
    ) -> c_int {
        unsafe {
            (self.symbols.iic_slave_write_bytes)(
                handle,
                index,
                data.as_mut_ptr(),
                native_len(data.len()),
                timeout_ms,
            )
        }
    }

    fn iic_slave_read_bytes(
        &self,
        handle: c_int,
        index: c_int,
        data: &mut [u8],
        timeout_ms: c_int,
    ) -> c_int {
        let mut staged = [0u8; consts::I2C_SLAVE_READ_CAPACITY];
        let ret = unsafe {
            (self.symbols.iic_slave_read_bytes)(handle, index, staged.as_mut_ptr(), timeout_ms)
        };
        copy_staged(&staged, data);
        ret
    }

    fn iic_slave_write_remain(&self, handle: c_int, index: c_int) -> c_int {
        unsafe { (self.symbols.iic_slave_write_remain)(handle, index) }
    }

    fn spi_init(&self, handle: c_int, index: c_int, config: &mut SpiConfigRaw) -> c_int {
        unsafe { (self.symbols.spi_init)(handle, index, config) }
    }

    fn spi_write_bytes(&self, handle: c_int, index: c_int, data: &mut [u8]) -> c_int {
        unsafe {
            (self.symbols.spi_write_bytes)(
                handle,
                index,
                data.as_mut_ptr(),
                native_len(data.len()),
            )
        }
    }

    fn spi_write_bytes_async(&self, handle: c_int, index: c_int, data: &mut [u8]) -> c_int {
        unsafe {
            (self.symbols.spi_write_bytes_async)(
                handle,
                index,
                data.as_mut_ptr(),
                native_len(data.len()),
            )
        }
    }

    fn spi_read_bytes(&self, handle: c_int, index: c_int, data: &mut [u8]) -> c_int {
        unsafe {
            (self.symbols.spi_read_bytes)(
                handle,
                index,
                data.as_mut_ptr(),
                native_len(data.len()),
            )
        }
    }

    fn spi_write_read_bytes(
        &self,
        handle: c_int,
        index: c_int,
        write: &mut [u8],
        read: &mut [u8],
        interval_us: c_int,
    ) -> c_int {
        unsafe {
            (self.symbols.spi_write_read_bytes)(
                handle,
                index,
                write.as_mut_ptr(),
                native_len(write.len()),
                read.as_mut_ptr(),
                native_len(read.len()),
                interval_us,
            )
        }
    }
}
