use crate::config::AppConfig;
use crate::store::CredentialStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CredentialStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn from_parts(store: Arc<dyn CredentialStore>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }
}

#[cfg(test)]
impl AppState {
    pub fn fake<S: CredentialStore + 'static>(store: S) -> Self {
        Self::fake_with_scheme(store, crate::config::PasswordScheme::Plaintext)
    }

    pub fn fake_with_scheme<S: CredentialStore + 'static>(
        store: S,
        scheme: crate::config::PasswordScheme,
    ) -> Self {
        Self::fake_shared(Arc::new(store), scheme)
    }

    pub fn fake_shared(
        store: Arc<dyn CredentialStore>,
        scheme: crate::config::PasswordScheme,
    ) -> Self {
        let mut config = AppConfig::from_lookup(|_| None).expect("default config");
        config.password_scheme = scheme;
        Self::from_parts(store, Arc::new(config))
    }
}
