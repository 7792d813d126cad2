//! Shared test support: a scripted command runner and preference
//! fixtures.

// Each test binary uses its own subset of these helpers.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use tether_core::config::Config;
use tether_core::runner::{Capture, CommandRunner, Invocation};
use tether_core::Result;

/// Scripted command runner.
///
/// Responses are looked up by the rendered command line and consumed in
/// order; the last scripted response repeats when the queue runs dry.
/// Commands with no script at all succeed with empty output. Every
/// invocation (including its stdin payload) is recorded for assertions.
#[derive(Default)]
pub struct FakeRunner {
    responses: Mutex<HashMap<String, VecDeque<Capture>>>,
    calls: Mutex<Vec<Invocation>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the given rendered command line.
    #[must_use]
    pub fn on(self, command: &str, capture: Capture) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(command.to_string())
            .or_default()
            .push_back(capture);
        self
    }

    /// Every invocation seen so far.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Rendered command lines of every invocation seen so far.
    pub fn commands(&self) -> Vec<String> {
        self.calls().iter().map(ToString::to_string).collect()
    }

    /// How often the given command line was invoked.
    pub fn count_of(&self, command: &str) -> usize {
        self.commands().iter().filter(|c| *c == command).count()
    }

    /// Index of the first invocation of the given command line.
    pub fn index_of(&self, command: &str) -> Option<usize> {
        self.commands().iter().position(|c| c == command)
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn invoke(&self, invocation: &Invocation) -> Result<Capture> {
        self.calls.lock().unwrap().push(invocation.clone());

        let key = invocation.to_string();
        let mut responses = self.responses.lock().unwrap();
        if let Some(queue) = responses.get_mut(&key) {
            if queue.len() > 1 {
                if let Some(front) = queue.pop_front() {
                    return Ok(front);
                }
            }
            if let Some(front) = queue.front() {
                return Ok(front.clone());
            }
        }
        Ok(ok(""))
    }
}

/// A successful capture with the given output.
pub fn ok(output: &str) -> Capture {
    Capture {
        exit_code: 0,
        output: output.to_string(),
    }
}

/// A failed capture with the given exit code and output.
pub fn fail(code: i32, output: &str) -> Capture {
    Capture {
        exit_code: code,
        output: output.to_string(),
    }
}

/// A config with deterministic paths for command-line assertions.
pub fn test_config(prefs_path: &Path) -> Config {
    let mut config = Config::default();
    config.bridge.program = PathBuf::from("adb");
    config.desktop.bundle = PathBuf::from("/Applications/Stream.app");
    config.desktop.executable = "/Applications/Stream.app/Contents/MacOS/Stream".to_string();
    config.headset.package = "stream.headset".to_string();
    config.headset.model = "Quest_Pro".to_string();
    config.prefs.path = prefs_path.to_path_buf();
    config
}

/// The desktop existence-probe command for [`test_config`].
pub const PGREP: &str = "pgrep -f /Applications/Stream.app/Contents/MacOS/Stream";

/// The headset existence-probe command for [`test_config`].
pub const PIDOF: &str = "adb shell pidof stream.headset";

/// A `devices -l` listing with one ready Quest_Pro.
pub const DEVICES: &str = "\
List of devices attached
230YC01X2Z0042         device usb:339738624X product:seacliff model:Quest_Pro device:seacliff transport_id:1
";

/// Write a binary preference fixture with unrelated keys and the given
/// forced-IP value.
pub fn write_prefs_fixture(path: &Path, forced_ip: &str) {
    let mut payload = serde_json::Map::new();
    payload.insert("AutoStart".to_string(), serde_json::Value::Bool(true));
    payload.insert("WindowScale".to_string(), serde_json::Value::from(1.5));
    payload.insert(
        "ForceIPAddress".to_string(),
        serde_json::Value::String(forced_ip.to_string()),
    );

    let mut bundle = plist::Dictionary::new();
    bundle.insert("SchemaVersion".to_string(), plist::Value::from(3));
    bundle.insert(
        "Data".to_string(),
        plist::Value::String(serde_json::to_string(&payload).unwrap()),
    );
    plist::Value::Dictionary(bundle)
        .to_file_binary(path)
        .expect("write prefs fixture");
}

/// Read the forced-IP value and the unrelated keys back out of a
/// preference file.
pub fn read_prefs_fixture(path: &Path) -> (String, serde_json::Map<String, serde_json::Value>) {
    let value = plist::Value::from_file(path).expect("read prefs fixture");
    let bundle = value.into_dictionary().expect("bundle dictionary");
    let data = bundle
        .get("Data")
        .and_then(plist::Value::as_string)
        .expect("Data key");
    let payload: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(data).expect("JSON payload");

    let forced_ip = payload
        .get("ForceIPAddress")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();
    (forced_ip, payload)
}
