use crate::error::{DynamicsError, Result};
use log::info;
use std::fmt;

pub const TENANT_ID_ENV: &str = "DYNAMICS_TENANT_ID";
pub const CLIENT_ID_ENV: &str = "DYNAMICS_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "DYNAMICS_CLIENT_SECRET";

/// App registration used to talk to Azure AD; loaded once per process
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Read from the process environment; the binary loads `.env` beforehand
    pub fn from_env() -> Result<Credentials> {
        info!("Importing credentials from environment variables");
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Credentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| {
                    DynamicsError::configuration(format!("{} environment variable not set", key))
                })
        };

        Ok(Credentials {
            tenant_id: require(TENANT_ID_ENV)?,
            client_id: require(CLIENT_ID_ENV)?,
            client_secret: require(CLIENT_SECRET_ENV)?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_all_present() {
        let creds = Credentials::from_lookup(lookup_from(&[
            (TENANT_ID_ENV, "tenant"),
            (CLIENT_ID_ENV, "client"),
            (CLIENT_SECRET_ENV, "secret"),
        ]))
        .unwrap();

        assert_eq!(creds, Credentials::new("tenant", "client", "secret"));
    }

    #[test]
    fn test_each_missing_variable_is_reported() {
        let all = [
            (TENANT_ID_ENV, "tenant"),
            (CLIENT_ID_ENV, "client"),
            (CLIENT_SECRET_ENV, "secret"),
        ];

        for skip in 0..all.len() {
            let pairs: Vec<_> = all
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, p)| *p)
                .collect();

            match Credentials::from_lookup(lookup_from(&pairs)) {
                Err(DynamicsError::Configuration(msg)) => assert!(msg.contains(all[skip].0)),
                other => panic!("expected configuration error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let result = Credentials::from_lookup(lookup_from(&[
            (TENANT_ID_ENV, "tenant"),
            (CLIENT_ID_ENV, "   "),
            (CLIENT_SECRET_ENV, "secret"),
        ]));
        assert!(matches!(result, Err(DynamicsError::Configuration(_))));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::new("tenant", "client", "hunter2");
        let printed = format!("{:?}", creds);
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("<redacted>"));
    }
}
