//! GPIO control on the adapter's pin header.
//!
//! Every operation takes a 32-bit pin mask; bit `n` selects pin `n`.

use crate::device::DeviceHandle;
use crate::error::{check_code, Error, Peripheral, Result};
use crate::native::{dispatch, NativeApi};
use log::{debug, trace};
use std::fmt;
use std::sync::Arc;

/// Pin function selected by [`Gpio::configure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioMode {
    Input,
    Output,
    OpenDrain,
}

/// Pull resistor applied while configuring pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpioPull {
    #[default]
    None,
    Up,
    Down,
}

impl GpioPull {
    pub(crate) fn raw(self) -> u8 {
        match self {
            GpioPull::None => 0x00,
            GpioPull::Up => 0x01,
            GpioPull::Down => 0x02,
        }
    }
}

/// Represents a valid GPIO Pin number (0-31).
/// Use `GpioPin::new(num)` to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpioPin(u8);

impl GpioPin {
    /// Creates a new GpioPin, returning an error if the number is out of range (0-31).
    pub fn new(pin_num: u8) -> Result<Self> {
        if pin_num <= 31 {
            Ok(GpioPin(pin_num))
        } else {
            Err(Error::ArgumentOutOfRange(format!(
                "GPIO pin {} out of range (0-31)",
                pin_num
            )))
        }
    }

    /// Returns the underlying pin number (0-31).
    #[inline]
    pub fn number(&self) -> u8 {
        self.0
    }

    /// Returns the bit mask (1 << number) for mask-based operations.
    #[inline]
    pub fn mask(&self) -> u32 {
        1u32 << self.0
    }

    /// Combines several pins into one mask.
    pub fn mask_of(pins: &[GpioPin]) -> u32 {
        pins.iter().fold(0, |mask, pin| mask | pin.mask())
    }
}

/// GPIO operations scoped to one opened handle.
#[derive(Clone)]
pub struct Gpio {
    native: Arc<dyn NativeApi>,
    handle: DeviceHandle,
}

impl fmt::Debug for Gpio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gpio").field("handle", &self.handle).finish()
    }
}

impl Gpio {
    pub(crate) fn new(native: Arc<dyn NativeApi>, handle: DeviceHandle) -> Self {
        Gpio { native, handle }
    }

    /// Configures the pins in `pin_mask` as inputs.
    pub async fn set_input(&self, pin_mask: u32, pull: GpioPull) -> Result<()> {
        self.configure(pin_mask, GpioMode::Input, pull).await
    }

    /// Configures the pins in `pin_mask` as push-pull outputs.
    pub async fn set_output(&self, pin_mask: u32, pull: GpioPull) -> Result<()> {
        self.configure(pin_mask, GpioMode::Output, pull).await
    }

    /// Configures the pins in `pin_mask` as open-drain outputs.
    pub async fn set_open_drain(&self, pin_mask: u32, pull: GpioPull) -> Result<()> {
        self.configure(pin_mask, GpioMode::OpenDrain, pull).await
    }

    /// Configures the pins in `pin_mask` for `mode` with the given pull resistor.
    pub async fn configure(&self, pin_mask: u32, mode: GpioMode, pull: GpioPull) -> Result<()> {
        let handle = self.handle.0;
        let pull_raw = pull.raw();
        debug!(
            "GPIO configure mask=0x{:08X} mode={:?} pull={:?}",
            pin_mask, mode, pull
        );
        let (operation, ret) = dispatch(&self.native, move |api| match mode {
            GpioMode::Input => ("GPIO_SetInput", api.gpio_set_input(handle, pin_mask, pull_raw)),
            GpioMode::Output => (
                "GPIO_SetOutput",
                api.gpio_set_output(handle, pin_mask, pull_raw),
            ),
            GpioMode::OpenDrain => (
                "GPIO_SetOpenDrain",
                api.gpio_set_open_drain(handle, pin_mask, pull_raw),
            ),
        })
        .await?;
        check_code(Peripheral::Gpio, operation, ret)
    }

    /// Drives the pins in `pin_mask` to the matching bits of `value`.
    pub async fn write(&self, pin_mask: u32, value: u32) -> Result<()> {
        let handle = self.handle.0;
        trace!("GPIO write mask=0x{:08X} value=0x{:08X}", pin_mask, value);
        let ret = dispatch(&self.native, move |api| api.gpio_write(handle, pin_mask, value)).await?;
        check_code(Peripheral::Gpio, "GPIO_Write", ret)
    }

    /// Reads the current level of the pins in `pin_mask`.
    pub async fn read(&self, pin_mask: u32) -> Result<u32> {
        let handle = self.handle.0;
        let (ret, value) = dispatch(&self.native, move |api| {
            let mut value = 0u32;
            let ret = api.gpio_read(handle, pin_mask, &mut value);
            (ret, value)
        })
        .await?;
        check_code(Peripheral::Gpio, "GPIO_Read", ret)?;
        trace!("GPIO read mask=0x{:08X} -> 0x{:08X}", pin_mask, value);
        Ok(value)
    }

    /// Emits `pulse_count` pulses of `pulse_width_us` every `pulse_period_us`
    /// on the pins in `pin_mask`.
    pub async fn send_pulses(
        &self,
        pin_mask: u32,
        pulse_width_us: u32,
        pulse_period_us: u32,
        pulse_count: u32,
    ) -> Result<()> {
        let handle = self.handle.0;
        debug!(
            "GPIO pulses mask=0x{:08X} width={}us period={}us count={}",
            pin_mask, pulse_width_us, pulse_period_us, pulse_count
        );
        let ret = dispatch(&self.native, move |api| {
            api.gpio_send_pulses(handle, pin_mask, pulse_width_us, pulse_period_us, pulse_count)
        })
        .await?;
        check_code(Peripheral::Gpio, "GPIO_SendPulses", ret)
    }
}
