use std::fmt;

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

impl std::error::Error for Error {}

impl Error {
    /// Return the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

/// The kind of an error that can occur.
#[derive(Debug)]
pub enum ErrorKind {
    #[cfg(feature = "rpi-hw")]
    PWM(rppal::pwm::Error),

    #[cfg(feature = "rpi-hw")]
    GPIO(linux_embedded_hal::sysfs_gpio::Error),

    #[cfg(feature = "rpi-hw")]
    HD44780(hd44780_driver::error::Error),

    /// Hints that destructuring should not be exhaustive.
    ///
    /// This enum may grow additional variants, so this makes sure clients
    /// don't count on exhaustive matching. (Otherwise, adding a new variant
    /// could break existing code.)
    #[doc(hidden)]
    __Nonexhaustive,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            #[cfg(feature = "rpi-hw")]
            ErrorKind::PWM(ref err) => err.fmt(f),

            #[cfg(feature = "rpi-hw")]
            ErrorKind::GPIO(ref err) => err.fmt(f),

            #[cfg(feature = "rpi-hw")]
            ErrorKind::HD44780(ref err) => write!(f, "{:?}", err),

            ErrorKind::__Nonexhaustive => unreachable!(),
        }
    }
}

#[cfg(feature = "rpi-hw")]
impl From<rppal::pwm::Error> for Error {
    fn from(e: rppal::pwm::Error) -> Self {
        Error {
            kind: ErrorKind::PWM(e),
        }
    }
}

#[cfg(feature = "rpi-hw")]
impl From<linux_embedded_hal::sysfs_gpio::Error> for Error {
    fn from(e: linux_embedded_hal::sysfs_gpio::Error) -> Self {
        Error {
            kind: ErrorKind::GPIO(e),
        }
    }
}

#[cfg(feature = "rpi-hw")]
impl From<hd44780_driver::error::Error> for Error {
    fn from(e: hd44780_driver::error::Error) -> Self {
        Error {
            kind: ErrorKind::HD44780(e),
        }
    }
}
