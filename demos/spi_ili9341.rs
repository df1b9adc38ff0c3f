use std::time::Duration;
use tokio::time::sleep;
use usb2xxx::{consts, GpioPull, Result, SpiConfig, SpiIndex, Usb2xxx, UsbDevice};

const PIN_DC: u32 = 1 << 0;
const PIN_RST: u32 = 1 << 1;
const PANEL: SpiIndex = SpiIndex::SPI1_CS0;

const WIDTH: u16 = 240;
const HEIGHT: u16 = 320;

const MEMORY_ACCESS_BGR: u8 = 1 << 3;

const INIT_SEQUENCE: &[(u8, &[u8])] = &[
    (0xCF, &[0x00, 0xC1, 0x30]),
    (0xED, &[0x64, 0x03, 0x12, 0x81]),
    (0xE8, &[0x85, 0x00, 0x79]),
    (0xCB, &[0x39, 0x2C, 0x00, 0x34, 0x02]),
    (0xF7, &[0x20]),
    (0xEA, &[0x00, 0x00]),
    // Power control
    (0xC0, &[0x1D]),
    (0xC1, &[0x12]),
    // VCM control
    (0xC5, &[0x33, 0x3F]),
    (0xC7, &[0x92]),
    // Pixel format and memory access
    (0x3A, &[0x55]),
    (0x36, &[MEMORY_ACCESS_BGR]),
    (0xB1, &[0x00, 0x12]),
    // Display function control
    (0xB6, &[0x0A, 0xA2]),
    (0x44, &[0x02]),
    // 3-gamma off, curve 1
    (0xF2, &[0x00]),
    (0x26, &[0x01]),
    (
        0xE0,
        &[0x0F, 0x22, 0x1C, 0x1B, 0x08, 0x0F, 0x48, 0xB8, 0x34, 0x05, 0x0C, 0x09, 0x0F, 0x07, 0x00],
    ),
    (
        0xE1,
        &[0x00, 0x23, 0x24, 0x07, 0x10, 0x07, 0x38, 0x47, 0x4B, 0x0A, 0x13, 0x06, 0x30, 0x38, 0x0F],
    ),
    // Display on
    (0x29, &[]),
];

fn rgb565(rgb: u32) -> u16 {
    let r = ((rgb >> 16) & 0xFF) >> 3;
    let g = ((rgb >> 8) & 0xFF) >> 2;
    let b = (rgb & 0xFF) >> 3;
    ((r << 11) | (g << 5) | b) as u16
}

/// Sends a command byte with DC low, then its parameters with DC high.
async fn write_command(dev: &UsbDevice, cmd: u8, data: &[u8]) -> Result<()> {
    dev.gpio.write(PIN_DC, 0).await?;
    dev.spi.write_bytes_async(PANEL, &[cmd]).await?;
    dev.gpio.write(PIN_DC, PIN_DC).await?;
    if !data.is_empty() {
        dev.spi
            .write_chunked(PANEL, data, consts::SPI_ASYNC_CHUNK_LEN)
            .await?;
    }
    Ok(())
}

async fn set_window(dev: &UsbDevice, x1: u16, y1: u16, x2: u16, y2: u16) -> Result<()> {
    let [x1h, x1l] = x1.to_be_bytes();
    let [x2h, x2l] = x2.to_be_bytes();
    write_command(dev, 0x2A, &[x1h, x1l, x2h, x2l]).await?;
    let [y1h, y1l] = y1.to_be_bytes();
    let [y2h, y2l] = y2.to_be_bytes();
    write_command(dev, 0x2B, &[y1h, y1l, y2h, y2l]).await
}

async fn fill(dev: &UsbDevice, color: u32, x: u16, y: u16, w: u16, h: u16) -> Result<()> {
    let pixel = rgb565(color).to_be_bytes();
    let bitmap: Vec<u8> = pixel
        .iter()
        .copied()
        .cycle()
        .take(w as usize * h as usize * 2)
        .collect();
    set_window(dev, x, y, x + w - 1, y + h - 1).await?;
    write_command(dev, 0x2C, &bitmap).await
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let usb = Usb2xxx::new()?;
    let Some(dev) = usb.open_first().await? else {
        println!("No device opened");
        return Ok(());
    };

    let config = SpiConfig {
        clock_speed_hz: 50_000_000,
        ..SpiConfig::default()
    };
    dev.spi.init(SpiIndex::SPI1, &config).await?;
    dev.gpio.set_output(PIN_DC, GpioPull::Up).await?;
    dev.gpio.set_output(PIN_RST, GpioPull::Up).await?;

    println!("Resetting panel...");
    dev.gpio.write(PIN_RST, PIN_RST).await?;
    sleep(Duration::from_millis(100)).await;
    dev.gpio.write(PIN_RST, 0).await?;
    sleep(Duration::from_millis(100)).await;
    dev.gpio.write(PIN_RST, PIN_RST).await?;
    sleep(Duration::from_millis(100)).await;

    // Sleep out
    write_command(&dev, 0x11, &[]).await?;
    sleep(Duration::from_millis(120)).await;
    for (cmd, data) in INIT_SEQUENCE {
        write_command(&dev, *cmd, data).await?;
    }

    println!("Drawing...");
    fill(&dev, 0x000000, 0, 0, WIDTH, HEIGHT).await?;
    for (color, x, y, w, h) in [
        (0xFFFFFF, 20, 100, 220, 80),
        (0x0000FF, 120, 200, 120, 40),
        (0x00FF00, 100, 10, 50, 300),
        (0xFF0000, 50, 220, 120, 50),
    ] {
        sleep(Duration::from_millis(300)).await;
        fill(&dev, color, x, y, w, h).await?;
    }

    dev.device.close().await
}
