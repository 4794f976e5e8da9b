use crate::utils::error::{Result, SyncError};

pub const API_TOKEN_VAR: &str = "CF_API_TOKEN";
pub const ACCOUNT_ID_VAR: &str = "CF_IDENTIFIER";

/// Gateway credentials, read from the environment.
#[derive(Clone)]
pub struct Credentials {
    pub api_token: String,
    pub account_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_token", &"<redacted>")
            .field("account_id", &self.account_id)
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Both variables must be present and non-empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| SyncError::MissingCredentialError {
                    var: name.to_string(),
                })
        };

        Ok(Self {
            api_token: read(API_TOKEN_VAR)?,
            account_id: read(ACCOUNT_ID_VAR)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_both_variables_present() {
        let creds = Credentials::from_lookup(lookup(&[
            (API_TOKEN_VAR, "token"),
            (ACCOUNT_ID_VAR, "account"),
        ]))
        .unwrap();
        assert_eq!(creds.api_token, "token");
        assert_eq!(creds.account_id, "account");
        assert!(!format!("{:?}", creds).contains("token\""));
    }

    #[test]
    fn test_missing_variable_is_reported_by_name() {
        let err = Credentials::from_lookup(lookup(&[(API_TOKEN_VAR, "token")])).unwrap_err();
        assert!(matches!(err, SyncError::MissingCredentialError { ref var } if var == ACCOUNT_ID_VAR));

        let err = Credentials::from_lookup(lookup(&[
            (API_TOKEN_VAR, " "),
            (ACCOUNT_ID_VAR, "account"),
        ]))
        .unwrap_err();
        assert!(matches!(err, SyncError::MissingCredentialError { ref var } if var == API_TOKEN_VAR));
    }
}
