use std::time::Duration;
use usb2xxx::{GpioPin, GpioPull, Result, Usb2xxx};

const PULSE_PIN_NUM: u8 = 4;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let usb = Usb2xxx::new()?;
    println!("Opening first USB2XXX device...");
    let Some(dev) = usb.open_first().await? else {
        println!("No device opened");
        return Ok(());
    };

    let pin = GpioPin::new(PULSE_PIN_NUM)?;
    dev.gpio.set_output(pin.mask(), GpioPull::None).await?;

    println!("Blinking pin {} five times...", pin.number());
    for _ in 0..5 {
        dev.gpio.write(pin.mask(), pin.mask()).await?;
        tokio::time::sleep(Duration::from_millis(250)).await;
        dev.gpio.write(pin.mask(), 0).await?;
        tokio::time::sleep(Duration::from_millis(250)).await;
    }

    // 1 kHz, 25% duty, 1000 pulses generated by the adapter
    println!("Sending pulse train on pin {}...", pin.number());
    dev.gpio.send_pulses(pin.mask(), 250, 1000, 1000).await?;

    dev.device.close().await
}
