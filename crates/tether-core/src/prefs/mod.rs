//! Forced-IP preference editing.
//!
//! The desktop app keeps its preferences in a binary property list whose
//! `Data` key holds one JSON-encoded object. The forced-IP field lives
//! inside that object; everything else in the bundle belongs to the app
//! and must survive a read-modify-write untouched.
//!
//! The app rewrites the file while running (and on exit), so edits
//! require the app to be stopped, and USB mode re-applies the filesystem
//! immutability flag after writing so the relaunched app cannot revert
//! the value. While locked, the app cannot persist any other preference
//! either; the lock is cleared again at the start of every edit.

use std::path::{Path, PathBuf};

use plist::{Dictionary, Value};
use serde_json::{Map, Value as Json};
use tracing::info;

use crate::apps::{AppSupervisor, AppTarget};
use crate::config::PrefsConfig;
use crate::connection::ConnectionMode;
use crate::error::{Error, Result};
use crate::runner::{Exec, Invocation};

/// Top-level plist key holding the JSON-encoded payload.
const DATA_KEY: &str = "Data";

/// Payload field holding the forced IP address; empty means "unforced".
const FORCE_IP_KEY: &str = "ForceIPAddress";

/// Read-modify-write editor for the forced-IP preference.
#[derive(Debug, Clone)]
pub struct PreferenceEditor {
    exec: Exec,
    apps: AppSupervisor,
    path: PathBuf,
}

impl PreferenceEditor {
    /// Create an editor for the configured preference file.
    #[must_use]
    pub fn new(exec: Exec, apps: AppSupervisor, config: &PrefsConfig) -> Self {
        Self {
            exec,
            apps,
            path: config.resolved_path(),
        }
    }

    /// Set the forced IP address for the given mode.
    ///
    /// Precondition: the desktop app must not be running — a live app
    /// would overwrite the edit or reject it.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::PreferencesInUse`] when the desktop app is
    /// running, and with format errors when the bundle does not have the
    /// expected shape.
    pub async fn set_forced_ip(&self, mode: ConnectionMode) -> Result<()> {
        if self.apps.is_running(AppTarget::Desktop).await? {
            return Err(Error::PreferencesInUse);
        }

        // A previous USB switch leaves the file locked; always clear the
        // flag before touching it.
        self.set_locked(false).await?;

        let (bundle, mut payload) = read_bundle(&self.path)?;
        payload.insert(
            FORCE_IP_KEY.to_string(),
            Json::String(mode.forced_ip().to_string()),
        );
        write_bundle(&self.path, bundle, &payload)?;
        info!(path = %self.path.display(), %mode, "forced IP preference written");

        if mode.is_usb() {
            self.set_locked(true).await?;
        }
        Ok(())
    }

    /// Read the current forced IP address; empty means "unforced".
    ///
    /// A missing field reads as unforced rather than an error, matching
    /// what the app itself does with an absent key.
    pub async fn forced_ip(&self) -> Result<String> {
        let (_, payload) = read_bundle(&self.path)?;
        Ok(payload
            .get(FORCE_IP_KEY)
            .and_then(Json::as_str)
            .unwrap_or_default()
            .to_string())
    }

    async fn set_locked(&self, locked: bool) -> Result<()> {
        let flag = if locked { "uchg" } else { "nouchg" };
        self.exec
            .run(Invocation::new(
                "chflags",
                [flag.to_string(), self.path.to_string_lossy().into_owned()],
            ))
            .await?;
        Ok(())
    }
}

/// Read the preference bundle and decode its JSON payload.
fn read_bundle(path: &Path) -> Result<(Dictionary, Map<String, Json>)> {
    let value = Value::from_file(path)?;
    let bundle = value
        .into_dictionary()
        .ok_or_else(|| Error::BundleFormat("root is not a dictionary".to_string()))?;

    let data = bundle
        .get(DATA_KEY)
        .and_then(Value::as_string)
        .ok_or_else(|| Error::BundleFormat(format!("missing string key {DATA_KEY:?}")))?;
    let payload = serde_json::from_str(data)?;

    Ok((bundle, payload))
}

/// Re-encode the payload and write the whole bundle back in binary form.
fn write_bundle(path: &Path, mut bundle: Dictionary, payload: &Map<String, Json>) -> Result<()> {
    bundle.insert(
        DATA_KEY.to_string(),
        Value::String(serde_json::to_string(payload)?),
    );
    Value::Dictionary(bundle).to_file_binary(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_fixture(path: &Path, forced_ip: Option<&str>) {
        let mut payload = Map::new();
        payload.insert("WindowScale".to_string(), Json::from(1.5));
        payload.insert("AutoStart".to_string(), Json::Bool(true));
        if let Some(ip) = forced_ip {
            payload.insert(FORCE_IP_KEY.to_string(), Json::String(ip.to_string()));
        }

        let mut bundle = Dictionary::new();
        bundle.insert("SchemaVersion".to_string(), Value::from(3));
        bundle.insert(
            DATA_KEY.to_string(),
            Value::String(serde_json::to_string(&payload).unwrap()),
        );
        Value::Dictionary(bundle)
            .to_file_binary(path)
            .expect("write fixture");
    }

    #[test]
    fn test_round_trip_preserves_unrelated_keys() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("prefs.plist");
        write_fixture(&path, Some(""));

        let (bundle, mut payload) = read_bundle(&path).expect("read");
        payload.insert(
            FORCE_IP_KEY.to_string(),
            Json::String("127.0.0.1".to_string()),
        );
        write_bundle(&path, bundle, &payload).expect("write");

        let (bundle, payload) = read_bundle(&path).expect("re-read");
        assert_eq!(
            bundle.get("SchemaVersion").and_then(Value::as_signed_integer),
            Some(3)
        );
        assert_eq!(payload.get("WindowScale"), Some(&Json::from(1.5)));
        assert_eq!(payload.get("AutoStart"), Some(&Json::Bool(true)));
        assert_eq!(
            payload.get(FORCE_IP_KEY),
            Some(&Json::String("127.0.0.1".to_string()))
        );
    }

    #[test]
    fn test_read_bundle_rejects_missing_data_key() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("prefs.plist");

        let mut bundle = Dictionary::new();
        bundle.insert("Other".to_string(), Value::from(1));
        Value::Dictionary(bundle).to_file_binary(&path).unwrap();

        assert!(matches!(read_bundle(&path), Err(Error::BundleFormat(_))));
    }

    #[test]
    fn test_read_bundle_rejects_bad_payload() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("prefs.plist");

        let mut bundle = Dictionary::new();
        bundle.insert(DATA_KEY.to_string(), Value::String("not json".to_string()));
        Value::Dictionary(bundle).to_file_binary(&path).unwrap();

        assert!(matches!(read_bundle(&path), Err(Error::Payload(_))));
    }

    #[test]
    fn test_missing_forced_ip_reads_as_unforced() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("prefs.plist");
        write_fixture(&path, None);

        let (_, payload) = read_bundle(&path).expect("read");
        assert_eq!(payload.get(FORCE_IP_KEY), None);
    }
}
