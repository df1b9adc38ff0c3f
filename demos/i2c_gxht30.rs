use std::time::Duration;
use usb2xxx::{I2cAddress, I2cConfig, I2cIndex, Result, Usb2xxx};

const SENSOR_ADDR: u8 = 0x44;
// Single shot, high repeatability, clock stretching enabled
const MEASURE_CMD: [u8; 2] = [0x2c, 0x06];
const TIMEOUT: Duration = Duration::from_millis(200);

/// Converts a 6-byte measurement (T msb, T lsb, crc, RH msb, RH lsb, crc).
fn decode(data: &[u8]) -> (f32, f32) {
    let raw_t = u16::from_be_bytes([data[0], data[1]]) as f32;
    let raw_rh = u16::from_be_bytes([data[3], data[4]]) as f32;
    let temperature = -45.0 + 175.0 * raw_t / 65535.0;
    let humidity = 100.0 * raw_rh / 65535.0;
    (temperature, humidity)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let usb = Usb2xxx::new()?;
    let Some(dev) = usb.open_first().await? else {
        println!("No device opened");
        return Ok(());
    };

    let config = I2cConfig {
        clock_speed_hz: 200_000,
        ..I2cConfig::default()
    };
    dev.i2c.init(I2cIndex::I2c0, &config).await?;
    let addr = I2cAddress::new_7bit(SENSOR_ADDR)?;

    // Separate write and read
    dev.i2c
        .write_bytes(I2cIndex::I2c0, addr, &MEASURE_CMD, TIMEOUT)
        .await?;
    let r1 = dev.i2c.read_bytes(I2cIndex::I2c0, addr, 6, TIMEOUT).await?;
    let (t, rh) = decode(&r1);
    println!("result 1: {:02x?} -> {:.2} °C, {:.2} %RH", r1, t, rh);

    // Combined write-read
    let r2 = dev
        .i2c
        .write_read_bytes(I2cIndex::I2c0, addr, &MEASURE_CMD, 6, TIMEOUT)
        .await?;
    let (t, rh) = decode(&r2);
    println!("result 2: {:02x?} -> {:.2} °C, {:.2} %RH", r2, t, rh);

    dev.device.close().await
}
