mod error;

pub use error::Error;

#[cfg(feature = "rpi-hw")]
use rppal::gpio::{Gpio, InputPin, Level};

// To enable heterogenous abstractions
pub enum SwitchType {
    Fixed(FixedSwitch),

    #[cfg(feature = "rpi-hw")]
    Gpio(GpioSwitch),
}

impl SetupSwitch for SwitchType {
    fn is_asserted(&mut self) -> Result<bool, Error> {
        match &mut *self {
            Self::Fixed(switch) => switch.is_asserted(),

            #[cfg(feature = "rpi-hw")]
            Self::Gpio(switch) => switch.is_asserted(),
        }
    }
}

/// A boot-time input sampled once by the provisioning flow; asserted means
/// "open the setup portal even if stored credentials would work".
pub trait SetupSwitch {
    fn is_asserted(&mut self) -> Result<bool, Error>;
}

pub struct FixedSwitch {
    asserted: bool,
}

impl FixedSwitch {
    pub fn new(asserted: bool) -> FixedSwitch {
        FixedSwitch { asserted }
    }
}

impl SetupSwitch for FixedSwitch {
    fn is_asserted(&mut self) -> Result<bool, Error> {
        Ok(self.asserted)
    }
}

#[cfg(feature = "rpi-hw")]
pub struct GpioSwitch {
    pin: InputPin,
}

#[cfg(feature = "rpi-hw")]
impl GpioSwitch {
    /// `bcm_pin` is the BCM number of the pin the setup button pulls high.
    pub fn new(bcm_pin: u8) -> Result<GpioSwitch, Error> {
        let gpio = Gpio::new()?;
        let pin = gpio.get(bcm_pin)?.into_input_pulldown();

        Ok(GpioSwitch { pin })
    }
}

#[cfg(feature = "rpi-hw")]
impl SetupSwitch for GpioSwitch {
    fn is_asserted(&mut self) -> Result<bool, Error> {
        Ok(self.pin.read() == Level::High)
    }
}
