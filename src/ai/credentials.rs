// Secure credential storage for the agent API key
//
// Uses OS-native secure storage:
// - macOS: Keychain
// - Windows: Credential Manager
// - Linux: Secret Service (GNOME/KDE)

use crate::error::{PipelineError, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "com.moodmix.app";
const API_KEY_NAME: &str = "anthropic_api_key";
const MIN_KEY_LEN: usize = 20;

pub struct CredentialManager;

impl CredentialManager {
    /// Check the key format before it is stored (Claude keys start with "sk-ant-")
    pub fn validate_api_key(key: &str) -> Result<()> {
        let key = key.trim();
        if !key.starts_with("sk-ant-") {
            return Err(PipelineError::InvalidInput(
                "Invalid API key format. Claude API keys should start with 'sk-ant-'".to_string(),
            ));
        }
        if key.len() < MIN_KEY_LEN {
            return Err(PipelineError::InvalidInput(
                "API key appears too short. Please check and try again.".to_string(),
            ));
        }
        Ok(())
    }

    fn entry() -> Result<Entry> {
        Entry::new(SERVICE_NAME, API_KEY_NAME)
            .map_err(|e| PipelineError::Credentials(format!("Failed to access keychain: {}", e)))
    }

    /// Store the API key in the OS keychain
    pub fn store_api_key(key: &str) -> Result<()> {
        Self::validate_api_key(key)?;

        Self::entry()?
            .set_password(key.trim())
            .map_err(|e| PipelineError::Credentials(format!("Failed to store API key: {}", e)))?;

        tracing::info!("API key stored in keychain");
        Ok(())
    }

    /// Retrieve the API key from the OS keychain
    pub fn retrieve_api_key() -> Result<Option<String>> {
        match Self::entry()?.get_password() {
            Ok(key) => {
                tracing::debug!("API key retrieved from keychain (length: {})", key.len());
                Ok(Some(key))
            }
            Err(keyring::Error::NoEntry) => {
                tracing::debug!("No API key found in keychain");
                Ok(None)
            }
            Err(e) => Err(PipelineError::Credentials(format!(
                "Failed to retrieve API key: {}",
                e
            ))),
        }
    }

    /// Delete the API key from the OS keychain
    pub fn delete_api_key() -> Result<()> {
        Self::entry()?
            .delete_credential()
            .map_err(|e| PipelineError::Credentials(format!("Failed to delete API key: {}", e)))
    }

    /// Check if an API key is stored (without returning it)
    pub fn has_api_key() -> Result<bool> {
        Ok(Self::retrieve_api_key()?.is_some())
    }
}
