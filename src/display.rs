mod error;

pub use error::Error;

#[cfg(feature = "rpi-hw")]
use hd44780_driver::{
    bus::FourBitBus, Cursor, CursorBlink, Display as HD44780DisplaySetting, DisplayMode, HD44780,
};
#[cfg(feature = "rpi-hw")]
use linux_embedded_hal::sysfs_gpio::Direction;
#[cfg(feature = "rpi-hw")]
use linux_embedded_hal::{Delay, Pin};
#[cfg(feature = "rpi-hw")]
use rppal::pwm::{Channel, Polarity, Pwm};

const LCD_COLS: usize = 16;

// To enable heterogenous abstractions over multiple display types
pub enum DisplayType {
    Console(ConsoleDisplay),

    #[cfg(feature = "rpi-hw")]
    LCD16x2(LCD16x2Display),

    Composite(Vec<DisplayType>),
}

impl Display for DisplayType {
    fn show(&mut self, line1: &str, line2: &str) -> Result<(), Error> {
        match &mut *self {
            Self::Console(display) => display.show(line1, line2),

            #[cfg(feature = "rpi-hw")]
            Self::LCD16x2(display) => display.show(line1, line2),

            Self::Composite(displays) => {
                for d in displays.iter_mut() {
                    d.show(line1, line2)?;
                }
                Ok(())
            }
        }
    }
}

/// A status surface. Every message in the provisioning flow is two short
/// lines, sized for a 16x2 character module.
pub trait Display {
    fn show(&mut self, line1: &str, line2: &str) -> Result<(), Error>;
}

pub struct ConsoleDisplay {}

impl ConsoleDisplay {
    pub fn new() -> ConsoleDisplay {
        ConsoleDisplay {}
    }
}

impl Default for ConsoleDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ConsoleDisplay {
    fn show(&mut self, line1: &str, line2: &str) -> Result<(), Error> {
        println!();
        println!("-{}-", "-".repeat(LCD_COLS));
        println!("|{}|", pad_row(line1, LCD_COLS));
        println!("|{}|", pad_row(line2, LCD_COLS));
        println!("-{}-", "-".repeat(LCD_COLS));

        Ok(())
    }
}

fn pad_row(s: &str, width: usize) -> String {
    let truncated: String = s.chars().take(width).collect();
    format!("{:<width$}", truncated, width = width)
}

#[cfg(feature = "rpi-hw")]
pub struct LCD16x2Display {
    lcd: HD44780<
        FourBitBus<
            linux_embedded_hal::Pin,
            linux_embedded_hal::Pin,
            linux_embedded_hal::Pin,
            linux_embedded_hal::Pin,
            linux_embedded_hal::Pin,
            linux_embedded_hal::Pin,
        >,
    >,

    _backlight_pwm: Pwm,
}

#[cfg(feature = "rpi-hw")]
impl LCD16x2Display {
    pub fn new() -> Result<Self, Error> {
        // Using BCM numbers
        // i.e. pin 0 corresponds to wiringpi 30 and physical 27

        let rs = Pin::new(21);
        let en = Pin::new(20);
        let db4 = Pin::new(26);
        let db5 = Pin::new(13);
        let db6 = Pin::new(6);
        let db7 = Pin::new(5);
        let r = Pin::new(17);
        let g = Pin::new(16);
        let b = Pin::new(19);

        // Backlight fixed at full brightness
        // pwm0 is pin 18
        let pwm0 = Pwm::with_frequency(Channel::Pwm0, 20000.0, 1.0, Polarity::Normal, false)?;

        pwm0.enable()?;

        rs.export()?;
        en.export()?;
        db4.export()?;
        db5.export()?;
        db6.export()?;
        db7.export()?;
        r.export()?;
        g.export()?;
        b.export()?;

        rs.set_direction(Direction::Low)?;
        en.set_direction(Direction::Low)?;
        db4.set_direction(Direction::Low)?;
        db5.set_direction(Direction::Low)?;
        db6.set_direction(Direction::Low)?;
        db7.set_direction(Direction::Low)?;
        r.set_direction(Direction::Low)?; // Default to red on; green and blue off
        g.set_direction(Direction::High)?;
        b.set_direction(Direction::High)?;

        let mut lcd = HD44780::new_4bit(rs, en, db4, db5, db6, db7, &mut Delay)?;

        lcd.reset(&mut Delay)?;
        lcd.clear(&mut Delay)?;

        lcd.set_display_mode(
            DisplayMode {
                display: HD44780DisplaySetting::On,
                cursor_visibility: Cursor::Invisible,
                cursor_blink: CursorBlink::Off,
            },
            &mut Delay,
        )?;

        Ok(LCD16x2Display {
            lcd,
            _backlight_pwm: pwm0,
        })
    }
}

#[cfg(feature = "rpi-hw")]
impl Display for LCD16x2Display {
    fn show(&mut self, line1: &str, line2: &str) -> Result<(), Error> {
        // Move to beginning of first row.
        self.lcd.reset(&mut Delay)?;

        self.lcd
            .write_bytes(pad_row(line1, LCD_COLS).as_bytes(), &mut Delay)?;

        // Move to line 2
        self.lcd.set_cursor_pos(0x40, &mut Delay)?;

        self.lcd
            .write_bytes(pad_row(line2, LCD_COLS).as_bytes(), &mut Delay)?;

        Ok(())
    }
}
