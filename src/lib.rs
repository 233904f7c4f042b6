mod config;
mod display;
mod input;
mod portal;

pub use config::{
    Config, Store, API_KEY_MAX_LEN, FORECAST_ID_MAX_LEN, OBSERVATION_ID_MAX_LEN,
};
#[cfg(feature = "rpi-hw")]
pub use display::LCD16x2Display;
pub use display::{ConsoleDisplay, Display, DisplayType};
#[cfg(feature = "rpi-hw")]
pub use input::GpioSwitch;
pub use input::{FixedSwitch, SetupSwitch, SwitchType};
pub use portal::{
    ConsolePortal, FormField, FormItem, PortalEvent, PortalOutcome, PortalSettings, PortalType,
    ProvisioningPortal,
};

use log::{info, warn};
use std::fmt;
use std::net::IpAddr;
use std::path::Path;
use std::thread;
use std::time::Duration;

const FORECAST_ID_KEY: &str = "forecast_id";
const OBSERVATION_ID_KEY: &str = "observation_id";
const API_KEY_KEY: &str = "api_key";

const METOFFICE_HEADER_TEXT: &str = "<h3>Met Office details</h3><b>Forecast ID</b>";
const FORECAST_HELP_TEXT: &str = "<br>To obtain a forecast site ID, call the following to return JSON of all sites: http://datapoint.metoffice.gov.uk/public/data/val/wxfcs/all/json/sitelist?key=YOUR_API_Key<br><br><b>Observation ID</b>";
const OBSERVATION_HELP_TEXT: &str = "<br>To obtain an observation site ID, call the following to return JSON of all sites: http://datapoint.metoffice.gov.uk/public/data/val/wxobs/all/json/sitelist?key=YOUR_API_Key<br><br><b>API Key</b>";
const API_KEY_HELP_TEXT: &str = "<br>Register for Met Office Datapoint here: <a href='http://www.metoffice.gov.uk/datapoint'>metoffice.gov.uk/datapoint</a>";

const DEFAULT_AP_SSID: &str = "weather-display-setup";
const DEFAULT_AP_PASSWORD: &str = "metoffice";
const DEFAULT_PORTAL_TIMEOUT_SECS: u64 = 600;
const DEFAULT_MESSAGE_DELAY_MILLIS: u64 = 100;
const DEFAULT_RESTART_DELAY_SECS: u64 = 3;

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
    Store(config::Error),
    Portal(portal::Error),
    Display(display::Error),
    Input(input::Error),
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
            ErrorKind::Store(ref err) => err.fmt(f),
            ErrorKind::Portal(ref err) => err.fmt(f),
            ErrorKind::Display(ref err) => err.fmt(f),
            ErrorKind::Input(ref err) => err.fmt(f),
            ErrorKind::__Nonexhaustive => unreachable!(),
        }
    }
}

impl From<config::Error> for Error {
    fn from(e: config::Error) -> Self {
        Error {
            kind: ErrorKind::Store(e),
        }
    }
}

impl From<portal::Error> for Error {
    fn from(e: portal::Error) -> Self {
        Error {
            kind: ErrorKind::Portal(e),
        }
    }
}

impl From<display::Error> for Error {
    fn from(e: display::Error) -> Self {
        Error {
            kind: ErrorKind::Display(e),
        }
    }
}

impl From<input::Error> for Error {
    fn from(e: input::Error) -> Self {
        Error {
            kind: ErrorKind::Input(e),
        }
    }
}

/// Knobs for one provisioning run.
pub struct RunOptions {
    pub ap_ssid: String,
    pub ap_password: String,
    pub portal_timeout: Duration,
    /// How long each status message stays up before the flow moves on.
    pub message_delay: Duration,
    /// Pause between reporting a timed-out portal and asking for a restart.
    pub restart_delay: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            ap_ssid: DEFAULT_AP_SSID.to_owned(),
            ap_password: DEFAULT_AP_PASSWORD.to_owned(),
            portal_timeout: Duration::from_secs(DEFAULT_PORTAL_TIMEOUT_SECS),
            message_delay: Duration::from_millis(DEFAULT_MESSAGE_DELAY_MILLIS),
            restart_delay: Duration::from_secs(DEFAULT_RESTART_DELAY_SECS),
        }
    }
}

/// Terminal state of a provisioning run.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Joined a network; carries the local address for observability.
    Connected(IpAddr),
    /// Provisioning timed out. The caller owns the actual device restart;
    /// the flow never reports a connection in this case.
    Restart,
}

/// Runs the whole provisioning flow: mount the store, load any persisted
/// config into `config`, hand the portal a form seeded from it, then copy
/// the resulting values back and persist them if the user saved.
pub fn run<P, S, D>(
    options: &RunOptions,
    config_dir: &Path,
    config: &mut Config,
    portal: &mut P,
    switch: &mut S,
    display: &mut D,
) -> Result<Outcome, Error>
where
    P: ProvisioningPortal,
    S: SetupSwitch,
    D: Display,
{
    report(display, options.message_delay, "1/4.", "mounting FS...");
    let store = match Store::open(config_dir) {
        Ok(store) => store,
        Err(e) => {
            report(display, options.message_delay, "failed to mount FS", "");
            return Err(e.into());
        }
    };
    report(display, options.message_delay, "2/4.", "mounted file system");

    report(display, options.message_delay, "3/4.", "reading config file");
    match store.load() {
        Ok(Some(loaded)) => {
            report(display, options.message_delay, "4/4.", "opened config file");
            *config = loaded;
        }
        Ok(None) => info!("no config file; continuing with defaults"),
        Err(e) => {
            report(display, options.message_delay, "failed to load", "json config");
            return Err(e.into());
        }
    }

    let form = build_form(config);

    let settings = PortalSettings {
        ap_ssid: options.ap_ssid.clone(),
        ap_password: options.ap_password.clone(),
        timeout: options.portal_timeout,
        force_portal: switch.is_asserted()?,
    };

    let (portal_outcome, should_save) = match portal.run(&settings, form, display)? {
        PortalEvent::TimedOut => {
            report(
                display,
                options.message_delay,
                "failed to connect",
                "and hit timeout",
            );
            thread::sleep(options.restart_delay);
            return Ok(Outcome::Restart);
        }
        PortalEvent::Connected(outcome) => (outcome, false),
        PortalEvent::SavedAndConnected(outcome) => (outcome, true),
    };

    report(display, options.message_delay, "connected.", "");

    apply_fields(config, &portal_outcome);

    if should_save {
        report(display, options.message_delay, "saving config.", "");
        if let Err(e) = store.save(config) {
            report(display, options.message_delay, "failed to write", "config file");
            warn!("config save failed: {}", e);
        }
    }

    let address = portal_outcome.address;
    report(display, options.message_delay, "local ip", &address.to_string());

    Ok(Outcome::Connected(address))
}

fn build_form(config: &Config) -> Vec<FormItem> {
    vec![
        FormItem::Text(METOFFICE_HEADER_TEXT),
        FormItem::Field(FormField::new(
            FORECAST_ID_KEY,
            "forecast id",
            config.forecast_id(),
            FORECAST_ID_MAX_LEN,
        )),
        FormItem::Text(FORECAST_HELP_TEXT),
        FormItem::Field(FormField::new(
            OBSERVATION_ID_KEY,
            "observation id",
            config.observation_id(),
            OBSERVATION_ID_MAX_LEN,
        )),
        FormItem::Text(OBSERVATION_HELP_TEXT),
        FormItem::Field(FormField::new(
            API_KEY_KEY,
            "api key",
            config.api_key(),
            API_KEY_MAX_LEN,
        )),
        FormItem::Text(API_KEY_HELP_TEXT),
    ]
}

fn apply_fields(config: &mut Config, outcome: &PortalOutcome) {
    if let Some(value) = outcome.value_of(FORECAST_ID_KEY) {
        config.set_forecast_id(value);
    }
    if let Some(value) = outcome.value_of(OBSERVATION_ID_KEY) {
        config.set_observation_id(value);
    }
    if let Some(value) = outcome.value_of(API_KEY_KEY) {
        config.set_api_key(value);
    }
}

fn report<D: Display>(display: &mut D, delay: Duration, line1: &str, line2: &str) {
    if let Err(e) = display.show(line1, line2) {
        warn!("display error: {}", e);
    }

    if line2.is_empty() {
        info!("{}", line1);
    } else {
        info!("{} {}", line1, line2);
    }

    thread::sleep(delay);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::net::Ipv4Addr;

    const TEST_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 4, 21));

    enum ScriptedResult {
        Connected,
        SavedAndConnected { edits: Vec<(&'static str, &'static str)> },
        TimedOut,
    }

    struct ScriptedPortal {
        result: ScriptedResult,
        invoked: bool,
        seen_settings: Option<PortalSettings>,
    }

    impl ScriptedPortal {
        fn new(result: ScriptedResult) -> ScriptedPortal {
            ScriptedPortal {
                result,
                invoked: false,
                seen_settings: None,
            }
        }
    }

    impl ProvisioningPortal for ScriptedPortal {
        fn run<D: Display>(
            &mut self,
            settings: &PortalSettings,
            form: Vec<FormItem>,
            _display: &mut D,
        ) -> Result<PortalEvent, portal::Error> {
            self.invoked = true;
            self.seen_settings = Some(settings.clone());

            let mut fields = form
                .into_iter()
                .filter_map(|item| match item {
                    FormItem::Field(field) => Some(field),
                    FormItem::Text(_) => None,
                })
                .collect::<Vec<_>>();

            Ok(match &self.result {
                ScriptedResult::TimedOut => PortalEvent::TimedOut,
                ScriptedResult::Connected => PortalEvent::Connected(PortalOutcome {
                    address: TEST_ADDRESS,
                    fields,
                }),
                ScriptedResult::SavedAndConnected { edits } => {
                    for (key, value) in edits {
                        if let Some(field) = fields.iter_mut().find(|f| f.key == *key) {
                            field.value = (*value).to_owned();
                        }
                    }
                    PortalEvent::SavedAndConnected(PortalOutcome {
                        address: TEST_ADDRESS,
                        fields,
                    })
                }
            })
        }
    }

    struct RecordingDisplay {
        messages: Vec<(String, String)>,
    }

    impl RecordingDisplay {
        fn new() -> RecordingDisplay {
            RecordingDisplay { messages: vec![] }
        }

        fn saw(&self, line1: &str) -> bool {
            self.messages.iter().any(|(l1, _)| l1 == line1)
        }
    }

    impl Display for RecordingDisplay {
        fn show(&mut self, line1: &str, line2: &str) -> Result<(), display::Error> {
            self.messages.push((line1.to_owned(), line2.to_owned()));
            Ok(())
        }
    }

    fn test_options() -> RunOptions {
        RunOptions {
            message_delay: Duration::from_millis(0),
            restart_delay: Duration::from_millis(0),
            ..RunOptions::default()
        }
    }

    #[test]
    fn test_run_mount_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("not-there");

        let mut config = Config::default();
        let mut portal = ScriptedPortal::new(ScriptedResult::Connected);
        let mut switch = FixedSwitch::new(false);
        let mut display = RecordingDisplay::new();

        let err = run(
            &test_options(),
            &missing,
            &mut config,
            &mut portal,
            &mut switch,
            &mut display,
        )
        .unwrap_err();

        assert!(matches!(err.kind(), ErrorKind::Store(_)));
        assert!(!portal.invoked);
        assert!(display.saw("failed to mount FS"));
    }

    #[test]
    fn test_run_parse_failure_skips_portal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.json"), "{not json").unwrap();

        let mut config = Config::default();
        let mut portal = ScriptedPortal::new(ScriptedResult::Connected);
        let mut switch = FixedSwitch::new(false);
        let mut display = RecordingDisplay::new();

        let err = run(
            &test_options(),
            dir.path(),
            &mut config,
            &mut portal,
            &mut switch,
            &mut display,
        )
        .unwrap_err();

        assert!(matches!(err.kind(), ErrorKind::Store(_)));
        assert!(!portal.invoked);
        assert!(display.saw("failed to load"));
    }

    #[test]
    fn test_run_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let mut config = Config::default();
        config.set_forecast_id("310069");
        let before = config.clone();

        let mut portal = ScriptedPortal::new(ScriptedResult::Connected);
        let mut switch = FixedSwitch::new(false);
        let mut display = RecordingDisplay::new();

        let outcome = run(
            &test_options(),
            dir.path(),
            &mut config,
            &mut portal,
            &mut switch,
            &mut display,
        )
        .unwrap();

        assert_eq!(outcome, Outcome::Connected(TEST_ADDRESS));
        assert_eq!(config, before);
        assert!(!dir.path().join("config.json").exists());
    }

    #[test]
    fn test_run_loads_persisted_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.json"),
            r#"{"forecast_id":"353773","observation_id":"3772","api_key":"stored-key"}"#,
        )
        .unwrap();

        let mut config = Config::default();
        let mut portal = ScriptedPortal::new(ScriptedResult::Connected);
        let mut switch = FixedSwitch::new(false);
        let mut display = RecordingDisplay::new();

        run(
            &test_options(),
            dir.path(),
            &mut config,
            &mut portal,
            &mut switch,
            &mut display,
        )
        .unwrap();

        assert_eq!(config.forecast_id(), "353773");
        assert_eq!(config.observation_id(), "3772");
        assert_eq!(config.api_key(), "stored-key");
    }

    #[test]
    fn test_run_saved_and_connected_persists() {
        let dir = tempfile::tempdir().unwrap();

        let mut config = Config::default();
        let mut portal = ScriptedPortal::new(ScriptedResult::SavedAndConnected {
            edits: vec![("forecast_id", "324251"), ("api_key", "fresh-key")],
        });
        let mut switch = FixedSwitch::new(true);
        let mut display = RecordingDisplay::new();

        let outcome = run(
            &test_options(),
            dir.path(),
            &mut config,
            &mut portal,
            &mut switch,
            &mut display,
        )
        .unwrap();

        assert_eq!(outcome, Outcome::Connected(TEST_ADDRESS));
        assert_eq!(config.forecast_id(), "324251");
        assert_eq!(config.api_key(), "fresh-key");

        let store = Store::open(dir.path()).unwrap();
        let reloaded = store.load().unwrap().unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_run_connected_without_save_leaves_file() {
        let dir = tempfile::tempdir().unwrap();
        let raw = r#"{"forecast_id":"310069","observation_id":"3772","api_key":"stored-key"}"#;
        fs::write(dir.path().join("config.json"), raw).unwrap();

        let mut config = Config::default();
        let mut portal = ScriptedPortal::new(ScriptedResult::Connected);
        let mut switch = FixedSwitch::new(false);
        let mut display = RecordingDisplay::new();

        run(
            &test_options(),
            dir.path(),
            &mut config,
            &mut portal,
            &mut switch,
            &mut display,
        )
        .unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("config.json")).unwrap(),
            raw
        );
    }

    #[test]
    fn test_run_switch_forces_portal() {
        let dir = tempfile::tempdir().unwrap();

        let mut config = Config::default();
        let mut portal = ScriptedPortal::new(ScriptedResult::Connected);
        let mut switch = FixedSwitch::new(true);
        let mut display = RecordingDisplay::new();

        run(
            &test_options(),
            dir.path(),
            &mut config,
            &mut portal,
            &mut switch,
            &mut display,
        )
        .unwrap();

        assert!(portal.seen_settings.unwrap().force_portal);
    }

    #[test]
    fn test_run_timeout_restarts() {
        let dir = tempfile::tempdir().unwrap();

        let mut config = Config::default();
        let mut portal = ScriptedPortal::new(ScriptedResult::TimedOut);
        let mut switch = FixedSwitch::new(false);
        let mut display = RecordingDisplay::new();

        let outcome = run(
            &test_options(),
            dir.path(),
            &mut config,
            &mut portal,
            &mut switch,
            &mut display,
        )
        .unwrap();

        assert_eq!(outcome, Outcome::Restart);
        assert!(display.saw("failed to connect"));
        assert!(!dir.path().join("config.json").exists());
    }

    #[test]
    fn test_build_form() {
        let mut config = Config::default();
        config.set_forecast_id("310069");

        let form = build_form(&config);
        assert_eq!(form.len(), 7);

        let fields = form
            .iter()
            .filter_map(|item| match item {
                FormItem::Field(field) => Some(field),
                FormItem::Text(_) => None,
            })
            .collect::<Vec<_>>();

        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].key, "forecast_id");
        assert_eq!(fields[0].value, "310069");
        assert_eq!(fields[0].max_len, FORECAST_ID_MAX_LEN);
        assert_eq!(fields[1].key, "observation_id");
        assert_eq!(fields[1].max_len, OBSERVATION_ID_MAX_LEN);
        assert_eq!(fields[2].key, "api_key");
        assert_eq!(fields[2].max_len, API_KEY_MAX_LEN);
    }
}
