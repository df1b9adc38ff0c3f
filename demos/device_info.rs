use usb2xxx::{Result, Usb2xxx};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let usb = Usb2xxx::new()?;

    let devices = usb.scan().await?;
    if devices.is_empty() {
        println!("No devices");
        return Ok(());
    }
    println!("Found {} device(s):", devices.len());
    for handle in &devices {
        println!("  {}", handle);
    }

    let Some(dev) = usb.open(devices[0]).await? else {
        println!("Device not opened");
        return Ok(());
    };

    match dev.device.info().await? {
        Some(info) => {
            println!("Firmware name:    {}", info.firmware_name);
            println!("Build date:       {}", info.build_date);
            println!("Hardware version: {}", info.hardware_version);
            println!("Firmware version: {}", info.firmware_version);
            println!("Serial number:    {}", info.serial_number);
            println!("Functions:        {}", info.functions.join(", "));
        }
        None => println!("Device info not available"),
    }

    dev.device.close().await
}
