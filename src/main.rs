use log::{debug, info, warn};
use simplelog::{ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::path::Path;
use std::time::Duration;
use structopt::StructOpt;

const CONSOLE_DISPLAY_TYPE: &'static str = "console";
#[cfg(feature = "rpi-hw")]
const LCD16X2_DISPLAY_TYPE: &'static str = "lcd16x2";

const NONE_SWITCH_TYPE: &'static str = "none";
const HELD_SWITCH_TYPE: &'static str = "held";
#[cfg(feature = "rpi-hw")]
const GPIO_SWITCH_TYPE: &'static str = "gpio";

const CONSOLE_PORTAL_TYPE: &'static str = "console";

const AP_SSID: &'static str = "weather-display-setup";
const AP_PASSWORD: &'static str = "metoffice";

// BCM number of the pin the setup button pulls high at boot
#[cfg(feature = "rpi-hw")]
const SETUP_SWITCH_PIN: u8 = 12;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let log_config = ConfigBuilder::new().set_time_to_local(true).build();
    TermLogger::init(LevelFilter::Info, log_config, TerminalMode::Mixed)?;
    debug!("logger initialized");

    let args = Cli::from_args();

    let switch_type_str = args.setup_switch_type;
    let mut switch = match switch_type_str.as_str() {
        NONE_SWITCH_TYPE => {
            weather_display_setup::SwitchType::Fixed(weather_display_setup::FixedSwitch::new(false))
        }
        HELD_SWITCH_TYPE => {
            weather_display_setup::SwitchType::Fixed(weather_display_setup::FixedSwitch::new(true))
        }

        #[cfg(feature = "rpi-hw")]
        GPIO_SWITCH_TYPE => weather_display_setup::SwitchType::Gpio(
            weather_display_setup::GpioSwitch::new(SETUP_SWITCH_PIN)?,
        ),
        _ => {
            panic!("Unrecognized setup switch type: {}", switch_type_str)
        }
    };

    let displays = args
        .display_types
        .iter()
        .map(
            |d| -> Result<weather_display_setup::DisplayType, weather_display_setup::Error> {
                match d.as_str() {
                    CONSOLE_DISPLAY_TYPE => Ok(weather_display_setup::DisplayType::Console(
                        weather_display_setup::ConsoleDisplay::new(),
                    )),

                    #[cfg(feature = "rpi-hw")]
                    LCD16X2_DISPLAY_TYPE => Ok(weather_display_setup::DisplayType::LCD16x2(
                        weather_display_setup::LCD16x2Display::new()?,
                    )),
                    _ => {
                        panic!("Unrecognized display type: {}", d)
                    }
                }
            },
        )
        .collect::<Result<Vec<_>, _>>()?;

    let mut display = weather_display_setup::DisplayType::Composite(displays);

    let portal_type_str = args.portal_type;
    let mut portal = match portal_type_str.as_str() {
        CONSOLE_PORTAL_TYPE => {
            weather_display_setup::PortalType::Console(weather_display_setup::ConsolePortal::new())
        }
        _ => {
            panic!("Unrecognized portal type: {}", portal_type_str)
        }
    };

    let mut config = weather_display_setup::Config::default();

    let options = weather_display_setup::RunOptions {
        ap_ssid: AP_SSID.to_owned(),
        ap_password: AP_PASSWORD.to_owned(),
        portal_timeout: Duration::from_secs(args.timeout_secs),
        ..weather_display_setup::RunOptions::default()
    };

    info!("Initialization complete");

    let outcome = weather_display_setup::run(
        &options,
        Path::new(&args.config_dir),
        &mut config,
        &mut portal,
        &mut switch,
        &mut display,
    )?;

    match outcome {
        weather_display_setup::Outcome::Connected(address) => {
            info!("provisioning complete; local address {}", address);
        }
        weather_display_setup::Outcome::Restart => {
            // The service manager restarts the process; on the appliance that
            // unit is configured to reboot the device instead.
            warn!("provisioning timed out; exiting so the service can restart");
            std::process::exit(1);
        }
    }

    Ok(())
}
#[derive(StructOpt)]
struct Cli {
    #[structopt(long)]
    config_dir: String,

    #[structopt(long, default_value = "600")]
    timeout_secs: u64,

    #[structopt(long = "display-type", default_value=CONSOLE_DISPLAY_TYPE)]
    display_types: Vec<String>,

    #[structopt(long, default_value=NONE_SWITCH_TYPE)]
    setup_switch_type: String,

    #[structopt(long, default_value=CONSOLE_PORTAL_TYPE)]
    portal_type: String,
}
