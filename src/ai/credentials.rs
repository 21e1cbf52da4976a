use base64::Engine;
use keyring::Entry;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const SERVICE_NAME: &str = "com.kebabcompass.app";

/// Credential manager using the OS keychain with a file fallback for development
pub struct CredentialManager;

impl CredentialManager {
    /// Get the fallback file path for storing credentials (dev mode only)
    #[cfg(debug_assertions)]
    fn get_fallback_path(provider: &str) -> Option<PathBuf> {
        dirs::config_dir().map(|dir| fallback_path_in(&dir.join("kebab-compass"), provider))
    }

    /// Store an API key in the keychain (with file fallback in dev mode)
    pub fn store_api_key(provider: &str, api_key: &str) -> Result<(), String> {
        match Entry::new(SERVICE_NAME, provider) {
            Ok(entry) => {
                if entry.set_password(api_key).is_ok() {
                    debug!(provider, "Stored API key in keychain");
                    return Ok(());
                }
            }
            Err(e) => {
                debug!(provider, error = %e, "Keychain unavailable");
            }
        }

        #[cfg(debug_assertions)]
        {
            if let Some(path) = Self::get_fallback_path(provider) {
                write_fallback(&path, api_key)?;
                debug!(provider, path = ?path, "DEV MODE: Stored API key in file");
                return Ok(());
            }
        }

        #[cfg(not(debug_assertions))]
        {
            return Err("Secure credential storage (Keychain) unavailable".to_string());
        }

        #[cfg(debug_assertions)]
        Err("Could not determine config directory".to_string())
    }

    /// Get an API key from the keychain (with file fallback in dev mode)
    pub fn get_api_key(provider: &str) -> Result<String, String> {
        if let Ok(entry) = Entry::new(SERVICE_NAME, provider) {
            if let Ok(password) = entry.get_password() {
                debug!(provider, "Retrieved API key from keychain");
                return Ok(password);
            }
        }

        #[cfg(debug_assertions)]
        {
            if let Some(path) = Self::get_fallback_path(provider) {
                if path.exists() {
                    let key = read_fallback(&path)?;
                    debug!(provider, path = ?path, "DEV MODE: Retrieved API key from file");
                    return Ok(key);
                }
            }
        }

        Err("API key not found".to_string())
    }

    /// Delete an API key from the keychain and file storage
    pub fn delete_api_key(provider: &str) -> Result<(), String> {
        if let Ok(entry) = Entry::new(SERVICE_NAME, provider) {
            let _ = entry.delete_credential();
            debug!(provider, "Deleted API key from keychain");
        }

        #[cfg(debug_assertions)]
        {
            if let Some(path) = Self::get_fallback_path(provider) {
                if path.exists() {
                    fs::remove_file(&path)
                        .map_err(|e| format!("Failed to delete API key file: {}", e))?;
                }
            }
        }

        Ok(())
    }

    /// Check if an API key is configured
    pub fn has_api_key(provider: &str) -> bool {
        Self::get_api_key(provider).is_ok()
    }

    /// Resolve the key for a provider. Priority: environment-supplied key > keychain
    pub fn resolve_api_key(provider: &str, from_env: Option<&str>) -> Option<String> {
        from_env
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .or_else(|| Self::get_api_key(provider).ok())
    }
}

#[cfg_attr(not(debug_assertions), allow(dead_code))]
fn fallback_path_in(dir: &Path, provider: &str) -> PathBuf {
    dir.join(format!("{}_key", provider))
}

// Base64 keeps the dev-mode file from being read at a glance; it is not protection
#[cfg_attr(not(debug_assertions), allow(dead_code))]
fn write_fallback(path: &Path, api_key: &str) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }

    let encoded = base64::engine::general_purpose::STANDARD.encode(api_key);
    fs::write(path, encoded).map_err(|e| format!("Failed to write API key: {}", e))
}

#[cfg_attr(not(debug_assertions), allow(dead_code))]
fn read_fallback(path: &Path) -> Result<String, String> {
    let encoded =
        fs::read_to_string(path).map_err(|e| format!("Failed to read API key: {}", e))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| format!("Invalid base64 in key file: {}", e))?;
    String::from_utf8(bytes).map_err(|e| format!("Invalid UTF-8: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_fallback_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = fallback_path_in(&dir.path().join("nested"), "gemini");

        write_fallback(&path, "AIza-secret-key").unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("AIza-secret-key"));
        assert_eq!(read_fallback(&path).unwrap(), "AIza-secret-key");
    }

    #[test]
    fn test_corrupt_fallback_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = fallback_path_in(dir.path(), "gemini");
        fs::write(&path, "!!! not base64 !!!").unwrap();

        assert!(read_fallback(&path).is_err());
    }

    fn unique_provider() -> String {
        format!("kebab-compass-test-{}", uuid::Uuid::new_v4())
    }

    #[test]
    fn test_stored_key_round_trips() {
        let provider = unique_provider();

        CredentialManager::store_api_key(&provider, "stored-secret").unwrap();
        assert!(CredentialManager::has_api_key(&provider));
        assert_eq!(
            CredentialManager::get_api_key(&provider).as_deref(),
            Ok("stored-secret")
        );
        assert_eq!(
            CredentialManager::resolve_api_key(&provider, None).as_deref(),
            Some("stored-secret")
        );

        CredentialManager::delete_api_key(&provider).unwrap();
        assert!(!CredentialManager::has_api_key(&provider));
        assert_eq!(CredentialManager::resolve_api_key(&provider, None), None);
    }

    #[test]
    fn test_environment_key_beats_stored_key() {
        let provider = unique_provider();
        CredentialManager::store_api_key(&provider, "stored-secret").unwrap();

        let key = CredentialManager::resolve_api_key(&provider, Some("env-secret"));
        assert_eq!(key.as_deref(), Some("env-secret"));

        // A blank environment value does not shadow the stored key
        let key = CredentialManager::resolve_api_key(&provider, Some("   "));
        assert_eq!(key.as_deref(), Some("stored-secret"));

        CredentialManager::delete_api_key(&provider).unwrap();
    }

    #[test]
    fn test_environment_key_wins() {
        let key = CredentialManager::resolve_api_key("kebab-compass-test-unused", Some("  env-key "));
        assert_eq!(key.as_deref(), Some("env-key"));
    }
}
