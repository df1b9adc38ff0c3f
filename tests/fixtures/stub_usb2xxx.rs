//! Stand-in for the vendor `USB2XXX` shared library.
//!
//! Built as a `cdylib` by `tests/native_library_tests.rs`. Every export keeps
//! the vendor signature, records its name, scalar arguments and input bytes,
//! and answers with predictable data. `STUB_Last*` exports read the record.
//! Building with `--cfg omit_export` leaves out `SPI_WriteReadBytes`.

#![allow(non_snake_case)]
#![allow(dead_code)]
#![allow(clippy::missing_safety_doc)]

use std::os::raw::{c_char, c_int, c_short};
use std::slice;
use std::sync::atomic::{AtomicI32, AtomicU16, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

const HANDLE_BASE: c_int = 100;
const MAX_DEVICES: usize = 10;
const FUNCTION_STRING_CAPACITY: usize = 256;
const SLAVE_READ_CAPACITY: usize = 1024;

#[repr(C)]
pub struct DeviceInfo {
    firmware_name: [c_char; 32],
    build_date: [c_char; 32],
    hardware_version: u32,
    firmware_version: u32,
    serial_number: [u32; 3],
    functions: u32,
}

#[repr(C)]
pub struct IicConfig {
    clock_speed_hz: u32,
    own_addr: u16,
    master: u8,
    addr_bits: u8,
    enable_pu: u8,
}

#[repr(C)]
pub struct SpiConfig {
    mode: i8,
    master: i8,
    cpol: i8,
    cpha: i8,
    lsb_first: i8,
    sel_polarity: i8,
    clock_speed_hz: u32,
}

struct LastCall {
    name: &'static str,
    args: Vec<i64>,
    data: Vec<u8>,
}

static LAST: Mutex<LastCall> = Mutex::new(LastCall {
    name: "",
    args: Vec::new(),
    data: Vec::new(),
});
static GPIO_LEVELS: AtomicU32 = AtomicU32::new(0);
static OWN_ADDR: AtomicU16 = AtomicU16::new(0);
static SLAVE_REMAIN: AtomicI32 = AtomicI32::new(0);

fn last() -> MutexGuard<'static, LastCall> {
    LAST.lock().unwrap_or_else(|e| e.into_inner())
}

fn record(name: &'static str, args: &[i64], data: &[u8]) {
    let mut last = last();
    last.name = name;
    last.args = args.to_vec();
    last.data = data.to_vec();
}

unsafe fn bytes<'a>(ptr: *const u8, len: c_int) -> &'a [u8] {
    if ptr.is_null() || len <= 0 {
        Default::default()
    } else {
        slice::from_raw_parts(ptr, len as usize)
    }
}

unsafe fn bytes_mut<'a>(ptr: *mut u8, len: c_int) -> &'a mut [u8] {
    if ptr.is_null() || len <= 0 {
        Default::default()
    } else {
        slice::from_raw_parts_mut(ptr, len as usize)
    }
}

fn fill_c_string(dst: &mut [c_char], s: &str) {
    for (d, b) in dst.iter_mut().zip(s.bytes().chain(std::iter::once(0))) {
        *d = b as c_char;
    }
}

unsafe fn copy_out<T: Copy>(src: &[T], out: *mut T, cap: c_int) -> c_int {
    if !out.is_null() && cap > 0 {
        let n = src.len().min(cap as usize);
        slice::from_raw_parts_mut(out, n).copy_from_slice(&src[..n]);
    }
    src.len() as c_int
}

// Inspection

#[no_mangle]
pub unsafe extern "system" fn STUB_LastName(out: *mut u8, cap: c_int) -> c_int {
    copy_out(last().name.as_bytes(), out, cap)
}

#[no_mangle]
pub unsafe extern "system" fn STUB_LastArgs(out: *mut i64, cap: c_int) -> c_int {
    copy_out(&last().args, out, cap)
}

#[no_mangle]
pub unsafe extern "system" fn STUB_LastData(out: *mut u8, cap: c_int) -> c_int {
    copy_out(&last().data, out, cap)
}

// Device

/// Always writes all ten slots.
#[no_mangle]
pub unsafe extern "system" fn USB_ScanDevice(handles: *mut c_int) -> c_int {
    record("USB_ScanDevice", &[], &[]);
    let handles = slice::from_raw_parts_mut(handles, MAX_DEVICES);
    for (i, h) in handles.iter_mut().enumerate() {
        *h = HANDLE_BASE + i as c_int;
    }
    MAX_DEVICES as c_int
}

#[no_mangle]
pub extern "system" fn USB_OpenDevice(handle: c_int) -> bool {
    record("USB_OpenDevice", &[handle as i64], &[]);
    handle >= HANDLE_BASE
}

#[no_mangle]
pub extern "system" fn USB_CloseDevice(handle: c_int) -> bool {
    record("USB_CloseDevice", &[handle as i64], &[]);
    handle >= HANDLE_BASE
}

#[no_mangle]
pub extern "system" fn USB_ResetDevice(handle: c_int) -> bool {
    record("USB_ResetDevice", &[handle as i64], &[]);
    handle >= HANDLE_BASE
}

/// Fills the whole 256-byte function buffer, padding after the terminator.
#[no_mangle]
pub unsafe extern "system" fn DEV_GetDeviceInfo(
    handle: c_int,
    info: *mut DeviceInfo,
    functions: *mut c_char,
) -> bool {
    record("DEV_GetDeviceInfo", &[handle as i64], &[]);
    if handle < HANDLE_BASE {
        return false;
    }
    let info = &mut *info;
    fill_c_string(&mut info.firmware_name, "STUB2XXX");
    fill_c_string(&mut info.build_date, "Jan 02 2024 03:04:05");
    info.hardware_version = 0x0201_0003;
    info.firmware_version = 0x0103_0110;
    info.serial_number = [0x1122_3344, 0x5566_7788, 0x99AA_BBCC];
    info.functions = 0;

    let functions = slice::from_raw_parts_mut(functions, FUNCTION_STRING_CAPACITY);
    functions.fill(b'#' as c_char);
    fill_c_string(functions, "GPIO, IIC,SPI,");
    functions[FUNCTION_STRING_CAPACITY - 1] = 0;
    true
}

#[no_mangle]
pub extern "system" fn DEV_SetPowerLevel(handle: c_int, level: c_char) -> bool {
    record("DEV_SetPowerLevel", &[handle as i64, level as i64], &[]);
    (0..=3).contains(&level)
}

// GPIO

fn gpio_mode(name: &'static str, handle: c_int, pin_mask: u32, pupd: u8) -> c_int {
    record(name, &[handle as i64, pin_mask as i64, pupd as i64], &[]);
    if pupd > 2 {
        -1
    } else {
        0
    }
}

#[no_mangle]
pub extern "system" fn GPIO_SetInput(handle: c_int, pin_mask: u32, pupd: u8) -> c_int {
    gpio_mode("GPIO_SetInput", handle, pin_mask, pupd)
}

#[no_mangle]
pub extern "system" fn GPIO_SetOutput(handle: c_int, pin_mask: u32, pupd: u8) -> c_int {
    gpio_mode("GPIO_SetOutput", handle, pin_mask, pupd)
}

#[no_mangle]
pub extern "system" fn GPIO_SetOpenDrain(handle: c_int, pin_mask: u32, pupd: u8) -> c_int {
    gpio_mode("GPIO_SetOpenDrain", handle, pin_mask, pupd)
}

#[no_mangle]
pub extern "system" fn GPIO_Write(handle: c_int, pin_mask: u32, value: u32) -> c_int {
    record("GPIO_Write", &[handle as i64, pin_mask as i64, value as i64], &[]);
    let levels = GPIO_LEVELS.load(Ordering::SeqCst);
    GPIO_LEVELS.store((levels & !pin_mask) | (value & pin_mask), Ordering::SeqCst);
    0
}

#[no_mangle]
pub unsafe extern "system" fn GPIO_Read(handle: c_int, pin_mask: u32, value: *mut u32) -> c_int {
    record("GPIO_Read", &[handle as i64, pin_mask as i64], &[]);
    *value = GPIO_LEVELS.load(Ordering::SeqCst) & pin_mask;
    0
}

#[no_mangle]
pub extern "system" fn GPIO_SendPulses(
    handle: c_int,
    pin_mask: u32,
    pulse_width_us: u32,
    pulse_period_us: u32,
    pulse_num: u32,
) -> c_int {
    record(
        "GPIO_SendPulses",
        &[
            handle as i64,
            pin_mask as i64,
            pulse_width_us as i64,
            pulse_period_us as i64,
            pulse_num as i64,
        ],
        &[],
    );
    0
}

// I2C

#[no_mangle]
pub unsafe extern "system" fn IIC_Init(handle: c_int, index: c_int, config: *mut IicConfig) -> c_int {
    let config = &*config;
    record(
        "IIC_Init",
        &[
            handle as i64,
            index as i64,
            config.clock_speed_hz as i64,
            config.own_addr as i64,
            config.master as i64,
            config.addr_bits as i64,
            config.enable_pu as i64,
        ],
        &[],
    );
    OWN_ADDR.store(config.own_addr, Ordering::SeqCst);
    if config.clock_speed_hz == 0 {
        -1
    } else {
        0
    }
}

#[no_mangle]
pub unsafe extern "system" fn IIC_GetSlaveAddr(handle: c_int, index: c_int, addr: *mut u16) -> c_int {
    record("IIC_GetSlaveAddr", &[handle as i64, index as i64], &[]);
    *addr = OWN_ADDR.load(Ordering::SeqCst);
    0
}

/// Only address 0x44 acknowledges; anything else returns code 1.
#[no_mangle]
pub unsafe extern "system" fn IIC_WriteBytes(
    handle: c_int,
    index: c_int,
    addr: c_short,
    data: *mut u8,
    len: c_int,
    timeout_ms: c_int,
) -> c_int {
    record(
        "IIC_WriteBytes",
        &[handle as i64, index as i64, addr as i64, len as i64, timeout_ms as i64],
        bytes(data, len),
    );
    if addr == 0x44 {
        0
    } else {
        1
    }
}

/// Returns `addr + i` in byte `i`.
#[no_mangle]
pub unsafe extern "system" fn IIC_ReadBytes(
    handle: c_int,
    index: c_int,
    addr: c_short,
    data: *mut u8,
    len: c_int,
    timeout_ms: c_int,
) -> c_int {
    record(
        "IIC_ReadBytes",
        &[handle as i64, index as i64, addr as i64, len as i64, timeout_ms as i64],
        &[],
    );
    for (i, b) in bytes_mut(data, len).iter_mut().enumerate() {
        *b = (addr as u8).wrapping_add(i as u8);
    }
    0
}

/// Echoes the written bytes, repeated, into the read buffer.
#[no_mangle]
pub unsafe extern "system" fn IIC_WriteReadBytes(
    handle: c_int,
    index: c_int,
    addr: c_short,
    write: *mut u8,
    write_len: c_int,
    read: *mut u8,
    read_len: c_int,
    timeout_ms: c_int,
) -> c_int {
    let write = bytes(write, write_len);
    record(
        "IIC_WriteReadBytes",
        &[
            handle as i64,
            index as i64,
            addr as i64,
            write_len as i64,
            read_len as i64,
            timeout_ms as i64,
        ],
        write,
    );
    if !write.is_empty() {
        for (i, b) in bytes_mut(read, read_len).iter_mut().enumerate() {
            *b = write[i % write.len()];
        }
    }
    0
}

#[no_mangle]
pub unsafe extern "system" fn IIC_BlockWriteBytes(
    handle: c_int,
    index: c_int,
    addr: c_short,
    data: *mut u8,
    len: c_int,
    block_size: c_int,
    interval_ms: c_int,
) -> c_int {
    record(
        "IIC_BlockWriteBytes",
        &[
            handle as i64,
            index as i64,
            addr as i64,
            len as i64,
            block_size as i64,
            interval_ms as i64,
        ],
        bytes(data, len),
    );
    0
}

/// Returns each byte's offset within its block.
#[no_mangle]
pub unsafe extern "system" fn IIC_BlockReadBytes(
    handle: c_int,
    index: c_int,
    addr: c_short,
    data: *mut u8,
    len: c_int,
    block_size: c_int,
    interval_ms: c_int,
) -> c_int {
    record(
        "IIC_BlockReadBytes",
        &[
            handle as i64,
            index as i64,
            addr as i64,
            len as i64,
            block_size as i64,
            interval_ms as i64,
        ],
        &[],
    );
    if block_size <= 0 {
        return -1;
    }
    for (i, b) in bytes_mut(data, len).iter_mut().enumerate() {
        *b = (i % block_size as usize) as u8;
    }
    0
}

#[no_mangle]
pub unsafe extern "system" fn IIC_SlaveWriteBytes(
    handle: c_int,
    index: c_int,
    data: *mut u8,
    len: c_int,
    timeout_ms: c_int,
) -> c_int {
    record(
        "IIC_SlaveWriteBytes",
        &[handle as i64, index as i64, len as i64, timeout_ms as i64],
        bytes(data, len),
    );
    SLAVE_REMAIN.store(len, Ordering::SeqCst);
    0
}

/// Receives three bytes but fills the whole 1024-byte buffer.
#[no_mangle]
pub unsafe extern "system" fn IIC_SlaveReadBytes(
    handle: c_int,
    index: c_int,
    data: *mut u8,
    timeout_ms: c_int,
) -> c_int {
    record(
        "IIC_SlaveReadBytes",
        &[handle as i64, index as i64, timeout_ms as i64],
        &[],
    );
    let data = slice::from_raw_parts_mut(data, SLAVE_READ_CAPACITY);
    data.fill(0xEE);
    data[..3].copy_from_slice(&[7, 8, 9]);
    3
}

#[no_mangle]
pub extern "system" fn IIC_SlaveWriteRemain(handle: c_int, index: c_int) -> c_int {
    record("IIC_SlaveWriteRemain", &[handle as i64, index as i64], &[]);
    SLAVE_REMAIN.load(Ordering::SeqCst)
}

// SPI

#[no_mangle]
pub unsafe extern "system" fn SPI_Init(handle: c_int, index: c_int, config: *mut SpiConfig) -> c_int {
    let config = &*config;
    record(
        "SPI_Init",
        &[
            handle as i64,
            index as i64,
            config.mode as i64,
            config.master as i64,
            config.cpol as i64,
            config.cpha as i64,
            config.lsb_first as i64,
            config.sel_polarity as i64,
            config.clock_speed_hz as i64,
        ],
        &[],
    );
    0
}

#[no_mangle]
pub unsafe extern "system" fn SPI_WriteBytes(
    handle: c_int,
    index: c_int,
    data: *mut u8,
    len: c_int,
) -> c_int {
    record(
        "SPI_WriteBytes",
        &[handle as i64, index as i64, len as i64],
        bytes(data, len),
    );
    0
}

#[no_mangle]
pub unsafe extern "system" fn SPI_WriteBytesAsync(
    handle: c_int,
    index: c_int,
    data: *mut u8,
    len: c_int,
) -> c_int {
    record(
        "SPI_WriteBytesAsync",
        &[handle as i64, index as i64, len as i64],
        bytes(data, len),
    );
    0
}

/// Returns `i ^ 0x5A` in byte `i`.
#[no_mangle]
pub unsafe extern "system" fn SPI_ReadBytes(
    handle: c_int,
    index: c_int,
    data: *mut u8,
    len: c_int,
) -> c_int {
    record("SPI_ReadBytes", &[handle as i64, index as i64, len as i64], &[]);
    for (i, b) in bytes_mut(data, len).iter_mut().enumerate() {
        *b = (i as u8) ^ 0x5A;
    }
    0
}

/// Answers with the bitwise complement of the written bytes, repeated.
#[cfg(not(omit_export))]
#[no_mangle]
pub unsafe extern "system" fn SPI_WriteReadBytes(
    handle: c_int,
    index: c_int,
    write: *mut u8,
    write_len: c_int,
    read: *mut u8,
    read_len: c_int,
    interval_us: c_int,
) -> c_int {
    let write = bytes(write, write_len);
    record(
        "SPI_WriteReadBytes",
        &[
            handle as i64,
            index as i64,
            write_len as i64,
            read_len as i64,
            interval_us as i64,
        ],
        write,
    );
    if !write.is_empty() {
        for (i, b) in bytes_mut(read, read_len).iter_mut().enumerate() {
            *b = !write[i % write.len()];
        }
    }
    0
}
