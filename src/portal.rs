mod error;

pub use error::Error;

use crate::config::truncate_chars;
use crate::display::Display;
use log::info;
use std::io::{self, BufRead, Write};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

/// One entry in the setup form, in display order.
pub enum FormItem {
    /// Static help text shown between fields.
    Text(&'static str),
    Field(FormField),
}

/// A user-editable field, seeded from the current config value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormField {
    pub key: &'static str,
    pub label: &'static str,
    pub value: String,
    pub max_len: usize,
}

impl FormField {
    pub fn new(key: &'static str, label: &'static str, value: &str, max_len: usize) -> FormField {
        FormField {
            key,
            label,
            value: truncate_chars(value, max_len),
            max_len,
        }
    }
}

/// Settings for one provisioning attempt.
#[derive(Clone, Debug)]
pub struct PortalSettings {
    pub ap_ssid: String,
    pub ap_password: String,
    pub timeout: Duration,
    /// Open the portal even if stored credentials would connect.
    pub force_portal: bool,
}

/// What the portal knew by the time it returned.
#[derive(Debug)]
pub struct PortalOutcome {
    pub address: IpAddr,
    pub fields: Vec<FormField>,
}

impl PortalOutcome {
    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.value.as_str())
    }
}

/// Result of one blocking portal attempt.
#[derive(Debug)]
pub enum PortalEvent {
    /// Joined a network without the user submitting the form.
    Connected(PortalOutcome),
    /// Joined a network after the user submitted the form.
    SavedAndConnected(PortalOutcome),
    /// Neither happened within the timeout.
    TimedOut,
}

/// The seam where the external WiFi/captive-portal component plugs in.
///
/// The component is expected to try stored credentials first and, on failure
/// or when forced, open an access point with the given SSID/password and
/// serve the form until the timeout. It announces setup mode on the display
/// it is handed.
pub trait ProvisioningPortal {
    fn run<D: Display>(
        &mut self,
        settings: &PortalSettings,
        form: Vec<FormItem>,
        display: &mut D,
    ) -> Result<PortalEvent, Error>;
}

// To enable heterogenous abstractions
pub enum PortalType {
    Console(ConsolePortal),
}

impl ProvisioningPortal for PortalType {
    fn run<D: Display>(
        &mut self,
        settings: &PortalSettings,
        form: Vec<FormItem>,
        display: &mut D,
    ) -> Result<PortalEvent, Error> {
        match self {
            Self::Console(portal) => portal.run(settings, form, display),
        }
    }
}

/// Development stand-in for the on-device provisioning component.
///
/// Off-device there are no stored credentials to try, so unless the portal is
/// forced it reports an immediate join on the host's own network with the
/// form untouched. When forced it serves the form on the terminal, honouring
/// the configured timeout.
pub struct ConsolePortal {}

impl ConsolePortal {
    pub fn new() -> ConsolePortal {
        ConsolePortal {}
    }
}

impl Default for ConsolePortal {
    fn default() -> Self {
        Self::new()
    }
}

impl ProvisioningPortal for ConsolePortal {
    fn run<D: Display>(
        &mut self,
        settings: &PortalSettings,
        mut form: Vec<FormItem>,
        display: &mut D,
    ) -> Result<PortalEvent, Error> {
        if !settings.force_portal {
            info!("using existing network connection");
            return Ok(PortalEvent::Connected(PortalOutcome {
                address: IpAddr::V4(Ipv4Addr::LOCALHOST),
                fields: collect_fields(form),
            }));
        }

        display.show(&settings.ap_ssid, &settings.ap_password)?;

        let deadline = Instant::now() + settings.timeout;
        let mut lines = StdinLines::spawn();

        println!();
        println!(
            "setup portal open as '{}' (password '{}')",
            settings.ap_ssid, settings.ap_password
        );
        println!("empty input keeps the current value");

        for item in form.iter_mut() {
            match item {
                FormItem::Text(text) => println!("{}", text),
                FormItem::Field(field) => {
                    print!("{} [{}]: ", field.label, field.value);
                    io::stdout().flush()?;

                    match lines.next_before(deadline) {
                        Some(line) => {
                            let line = line.trim();
                            if !line.is_empty() {
                                field.value = truncate_chars(line, field.max_len);
                            }
                        }
                        // Closed stdin counts as an abandoned portal.
                        None => return Ok(PortalEvent::TimedOut),
                    }
                }
            }
        }

        Ok(PortalEvent::SavedAndConnected(PortalOutcome {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            fields: collect_fields(form),
        }))
    }
}

fn collect_fields(form: Vec<FormItem>) -> Vec<FormField> {
    form.into_iter()
        .filter_map(|item| match item {
            FormItem::Field(field) => Some(field),
            FormItem::Text(_) => None,
        })
        .collect()
}

// Reader thread so form input can honour the portal deadline. On timeout the
// thread stays parked on stdin; the process is about to restart anyway.
struct StdinLines {
    rx: Receiver<String>,
}

impl StdinLines {
    fn spawn() -> StdinLines {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });

        StdinLines { rx }
    }

    fn next_before(&mut self, deadline: Instant) -> Option<String> {
        let remaining = deadline.saturating_duration_since(Instant::now());

        match self.rx.recv_timeout(remaining) {
            Ok(line) => Some(line),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}
