//! Pluggable credential status checks.
//!
//! A status method is registered under the `credentialStatus.type` it
//! understands. No method is registered by default.

use std::collections::HashMap;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::Value;
use thiserror::Error;

use super::VerificationResult;

pub static STATUS_METHODS: Lazy<StatusMethods> = Lazy::new(StatusMethods::new);

/// State of a credential according to its status entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    Active,
    Revoked,
    Suspended,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatusError {
    #[error("status list unavailable: {0}")]
    Unavailable(String),
    #[error("malformed status entry: {0}")]
    Malformed(String),
}

/// Checks one kind of `credentialStatus` entry.
#[async_trait]
pub trait StatusMethod: Send + Sync {
    /// The `credentialStatus.type` handled.
    fn status_type(&self) -> &'static str;

    async fn check(&self, credential: &Value, status: &Value) -> Result<CredentialState, StatusError>;
}

#[derive(Default)]
pub struct StatusMethods {
    methods: HashMap<&'static str, Box<dyn StatusMethod>>,
}

impl StatusMethods {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, method: Box<dyn StatusMethod>) {
        self.methods.insert(method.status_type(), method);
    }

    pub fn get(&self, status_type: &str) -> Option<&dyn StatusMethod> {
        self.methods.get(status_type).map(|method| method.as_ref())
    }

    /// Evaluates every status entry of a credential.
    ///
    /// Entries that cannot be evaluated are warnings, or errors when `strict`.
    pub(crate) async fn evaluate(&self, credential: &Value, strict: bool, result: &mut VerificationResult) {
        let entries = match credential.get("credentialStatus") {
            None | Some(Value::Null) => return,
            Some(Value::Array(entries)) => entries.iter().collect(),
            Some(entry) => vec![entry],
        };

        for status in entries {
            let status_type = match &status["type"] {
                Value::String(status_type) => Some(status_type.as_str()),
                Value::Array(types) => types.iter().find_map(Value::as_str),
                _ => None,
            };

            let outcome = match status_type {
                None => Err("credential status has no type".to_string()),
                Some(status_type) => match self.get(status_type) {
                    None => Err(format!("unsupported credential status type {status_type}")),
                    Some(method) => method.check(credential, status).await.map_err(|err| err.to_string()),
                },
            };

            match outcome {
                Ok(CredentialState::Active) => {}
                Ok(CredentialState::Revoked) => result.error("credential is revoked"),
                Ok(CredentialState::Suspended) => result.error("credential is suspended"),
                Err(message) if strict => result.error(message),
                Err(message) => result.warning(message),
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// Reads the state from the status entry itself.
    pub(crate) struct InlineStatus;

    #[async_trait]
    impl StatusMethod for InlineStatus {
        fn status_type(&self) -> &'static str {
            "InlineStatus"
        }

        async fn check(&self, _credential: &Value, status: &Value) -> Result<CredentialState, StatusError> {
            match status["state"].as_str() {
                Some("active") => Ok(CredentialState::Active),
                Some("revoked") => Ok(CredentialState::Revoked),
                Some("suspended") => Ok(CredentialState::Suspended),
                Some(other) => Err(StatusError::Unavailable(other.to_string())),
                None => Err(StatusError::Malformed("missing state".to_string())),
            }
        }
    }

    pub(crate) fn inline_status() -> StatusMethods {
        let mut methods = StatusMethods::new();
        methods.register(Box::new(InlineStatus));
        methods
    }

    fn credential(status: Value) -> Value {
        json!({"credentialStatus": status})
    }

    #[tokio::test]
    async fn test_unregistered_status_is_a_warning_unless_strict() {
        let credential = credential(json!({"id": "urn:status:1", "type": "StatusList2021Entry"}));

        let mut result = VerificationResult::default();
        STATUS_METHODS.evaluate(&credential, false, &mut result).await;
        assert!(result.errors.is_empty());
        assert_eq!(result.warnings, vec!["unsupported credential status type StatusList2021Entry"]);

        let mut result = VerificationResult::default();
        STATUS_METHODS.evaluate(&credential, true, &mut result).await;
        assert_eq!(result.errors, vec!["unsupported credential status type StatusList2021Entry"]);
    }

    #[tokio::test]
    async fn test_registered_status_outcomes() {
        let methods = inline_status();

        let cases = [
            ("active", vec![], vec![]),
            ("revoked", vec!["credential is revoked"], vec![]),
            ("suspended", vec!["credential is suspended"], vec![]),
            ("offline", vec![], vec!["status list unavailable: offline"]),
        ];

        for (state, errors, warnings) in cases {
            let mut result = VerificationResult::default();
            methods
                .evaluate(&credential(json!({"type": "InlineStatus", "state": state})), false, &mut result)
                .await;
            assert_eq!(result.errors, errors, "{state}");
            assert_eq!(result.warnings, warnings, "{state}");
        }
    }

    #[tokio::test]
    async fn test_credential_without_status() {
        let mut result = VerificationResult::default();
        inline_status().evaluate(&json!({}), true, &mut result).await;
        assert_eq!(result, VerificationResult::default());
    }
}
