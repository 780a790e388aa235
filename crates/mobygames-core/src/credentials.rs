//! API key sources
//!
//! A missing key is an ordinary state, reported as `None`.

pub const API_KEY_ENV: &str = "MOBYGAMES_API_KEY";

/// Supplies the MobyGames API key
pub trait CredentialProvider: Send + Sync {
    /// Returns the key, or `None` when it is unset or blank
    fn api_key(&self) -> Option<String>;
}

/// Key fixed at construction, usually read from addon settings
#[derive(Debug, Clone, Default)]
pub struct StaticCredential(Option<String>);

impl StaticCredential {
    pub fn new(key: Option<String>) -> Self {
        Self(key)
    }
}

impl CredentialProvider for StaticCredential {
    fn api_key(&self) -> Option<String> {
        non_blank(self.0.clone())
    }
}

/// Key read from an environment variable, `MOBYGAMES_API_KEY` by default
#[derive(Debug, Clone, Copy)]
pub struct EnvCredential {
    var: &'static str,
}

impl EnvCredential {
    pub fn named(var: &'static str) -> Self {
        Self { var }
    }
}

impl Default for EnvCredential {
    fn default() -> Self {
        Self::named(API_KEY_ENV)
    }
}

impl CredentialProvider for EnvCredential {
    fn api_key(&self) -> Option<String> {
        non_blank(std::env::var(self.var).ok())
    }
}

fn non_blank(key: Option<String>) -> Option<String> {
    key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_credential() {
        assert_eq!(
            StaticCredential::new(Some("abc".to_string())).api_key(),
            Some("abc".to_string())
        );
        assert_eq!(StaticCredential::new(None).api_key(), None);
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        assert_eq!(StaticCredential::new(Some("   ".to_string())).api_key(), None);
        assert_eq!(StaticCredential::new(Some(String::new())).api_key(), None);
    }

    #[test]
    fn test_env_credential_reads_variable() {
        const VAR: &str = "MOBYGAMES_CORE_TEST_KEY";
        let credential = EnvCredential::named(VAR);
        // SAFETY: the variable name is unique to this test
        unsafe { std::env::remove_var(VAR) };
        assert_eq!(credential.api_key(), None);

        unsafe { std::env::set_var(VAR, " secret ") };
        assert_eq!(credential.api_key(), Some("secret".to_string()));

        unsafe { std::env::set_var(VAR, "") };
        assert_eq!(credential.api_key(), None);
        unsafe { std::env::remove_var(VAR) };
    }
}
