use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use vhid::codes::{self, BTN_EAST, BTN_SOUTH, BTN_TOOL_PEN};
use vhid::{
    CustomDevice, DeviceSpec, Dial, DrawingTablet, Gamepad, HatDirection, Keyboard, Mouse,
    TouchBounds, TouchPad,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// uinput node to register devices on (defaults to $VHID_UINPUT_PATH or /dev/uinput)
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Name the device reports to the kernel
    #[arg(short, long, default_value = "vhid demo device")]
    name: String,

    /// Pause between scripted steps, in milliseconds
    #[arg(long, default_value = "250")]
    delay: u64,

    #[command(subcommand)]
    device: DeviceArg,
}

#[derive(Subcommand, Debug)]
enum DeviceArg {
    /// Press a couple of face buttons, sweep the left stick, tap the hat
    Gamepad {
        #[arg(long, value_parser = parse_u16, default_value = "0x045e")]
        vendor: u16,
        #[arg(long, value_parser = parse_u16, default_value = "0x028e")]
        product: u16,
    },
    /// Draw a diagonal stroke with rising pressure
    Tablet,
    /// Type the given keys, by name (e.g. KEY_H KEY_I)
    Keyboard {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Trace a square and click
    Mouse,
    /// Tap the corners of the given area
    Touchpad {
        #[arg(long, default_value = "1920")]
        width: i32,
        #[arg(long, default_value = "1080")]
        height: i32,
    },
    /// Turn a full revolution back and forth
    Dial,
    /// Register a device from a JSON description and press its first key
    Custom {
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn parse_u16(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid id '{}': {}", s, e))
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let path = args.path.clone().unwrap_or_else(vhid::default_device_path);
    let pause = || thread::sleep(Duration::from_millis(args.delay));

    tracing::info!("Using uinput node {}", path.display());

    match args.device {
        DeviceArg::Gamepad { vendor, product } => {
            let pad = Gamepad::create(&path, &args.name, vendor, product)
                .context("Failed to create gamepad")?;
            report_sysname(pad.device());
            pause();
            pad.button_press(BTN_SOUTH)?;
            pause();
            pad.button_press(BTN_EAST)?;
            for step in -4..=4 {
                pad.left_stick_move(step as f32 / 4.0, 0.0)?;
                pause();
            }
            pad.left_stick_move(0.0, 0.0)?;
            pad.hat_press(HatDirection::Up)?;
            pause();
            pad.hat_release(HatDirection::Up)?;
            pad.close()?;
        }
        DeviceArg::Tablet => {
            let tablet =
                DrawingTablet::create(&path, &args.name).context("Failed to create tablet")?;
            report_sysname(tablet.device());
            pause();
            tablet.button_down(BTN_TOOL_PEN)?;
            for step in 0..=10 {
                let t = step as f32 / 10.0;
                tablet.move_to(0.25 + t / 2.0, 0.25 + t / 2.0)?;
                tablet.pressure(t)?;
                pause();
            }
            tablet.pressure(0.0)?;
            tablet.button_up(BTN_TOOL_PEN)?;
            tablet.close()?;
        }
        DeviceArg::Keyboard { keys } => {
            let key_codes = keys
                .iter()
                .map(|name| {
                    codes::lookup(name).with_context(|| format!("Unknown key name '{}'", name))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            let keyboard =
                Keyboard::create(&path, &args.name).context("Failed to create keyboard")?;
            report_sysname(keyboard.device());
            pause();
            for code in key_codes {
                keyboard.key_press(code)?;
                pause();
            }
            keyboard.close()?;
        }
        DeviceArg::Mouse => {
            let mouse = Mouse::create(&path, &args.name).context("Failed to create mouse")?;
            report_sysname(mouse.device());
            pause();
            for _ in 0..10 {
                mouse.move_right(10)?;
                pause();
            }
            mouse.move_by(0, 100)?;
            pause();
            mouse.move_left(100)?;
            pause();
            mouse.move_up(100)?;
            mouse.wheel(false, -1)?;
            mouse.left_click()?;
            mouse.close()?;
        }
        DeviceArg::Touchpad { width, height } => {
            if width <= 0 || height <= 0 {
                bail!("Touchpad area must be positive, got {}x{}", width, height);
            }
            let bounds = TouchBounds {
                min_x: 0,
                max_x: width - 1,
                min_y: 0,
                max_y: height - 1,
            };
            let pad = TouchPad::create(&path, &args.name, bounds)
                .context("Failed to create touchpad")?;
            report_sysname(pad.device());
            pause();
            for (x, y) in [(0, 0), (width, 0), (width, height), (0, height)] {
                pad.move_to(x, y)?;
                pad.touch_down()?;
                pad.touch_up()?;
                pause();
            }
            pad.close()?;
        }
        DeviceArg::Dial => {
            let dial = Dial::create(&path, &args.name).context("Failed to create dial")?;
            report_sysname(dial.device());
            pause();
            for delta in [1; 12].into_iter().chain([-1; 12]) {
                dial.turn(delta)?;
                pause();
            }
            dial.close()?;
        }
        DeviceArg::Custom { config } => {
            let json = std::fs::read_to_string(&config)
                .with_context(|| format!("Failed to read {}", config.display()))?;
            let spec = DeviceSpec::from_json(&json)
                .with_context(|| format!("Invalid device description in {}", config.display()))?;
            let device =
                CustomDevice::create(&path, &spec).context("Failed to create custom device")?;
            report_sysname(device.device());
            pause();
            match spec.capabilities.key_codes().next() {
                Some(code) => device.button_press(code)?,
                None => tracing::warn!("Device declares no keys, nothing to press"),
            }
            device.close()?;
        }
    }

    Ok(())
}

fn report_sysname<N: vhid::DeviceNode>(device: &vhid::VirtualDevice<N>) {
    match device.syspath() {
        Ok(syspath) => tracing::info!("Device '{}' is at {}", device.name(), syspath.display()),
        Err(e) => tracing::warn!("Could not query sysfs path: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_parse_as_hex_or_decimal() {
        assert_eq!(parse_u16("0xdead"), Ok(0xdead));
        assert_eq!(parse_u16("4660"), Ok(4660));
        assert!(parse_u16("0x10000").is_err());
    }

    #[test]
    fn args_parse() {
        let args = Args::parse_from(["vhid-demo", "--name", "pad", "gamepad", "--vendor", "0xdead"]);
        assert_eq!(args.name, "pad");
        assert!(matches!(
            args.device,
            DeviceArg::Gamepad { vendor: 0xdead, product: 0x028e }
        ));
    }
}
