use tracing::{info, warn};

use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo_types::User;
use crate::config::PasswordScheme;
use crate::state::AppState;

/// Accounts inserted by `SEED_DEMO_USERS`: (name, role, email, password).
const DEMO_USERS: &[(&str, &str, &str, &str)] = &[
    ("Kaival", "admin", "kaival@gmail.com", "123456"),
    ("Player", "user", "player@gmail.com", "player123"),
];

/// Checks `email`/`password` under the configured scheme.
pub async fn check_credentials(
    state: &AppState,
    email: &str,
    password: &str,
) -> anyhow::Result<Option<User>> {
    match state.config.password_scheme {
        PasswordScheme::Plaintext => {
            User::authenticate(state.store.as_ref(), email, password).await
        }
        PasswordScheme::Argon2 => {
            let candidates = User::credentials_by_email(state.store.as_ref(), email).await?;
            for (user, stored) in candidates {
                match verify_password(password, &stored) {
                    Ok(true) => return Ok(Some(user)),
                    Ok(false) => {}
                    Err(e) => warn!(
                        error = %e,
                        user_id = user.id,
                        "stored password is not an argon2 hash"
                    ),
                }
            }
            Ok(None)
        }
    }
}

pub async fn seed_demo_users(state: &AppState) -> anyhow::Result<()> {
    for (name, role, email, password) in DEMO_USERS {
        let stored = match state.config.password_scheme {
            PasswordScheme::Plaintext => password.to_string(),
            PasswordScheme::Argon2 => hash_password(password)?,
        };
        User::insert_if_absent(state.store.as_ref(), name, role, email, &stored).await?;
        info!(%email, %role, "demo user ensured");
    }
    Ok(())
}
