use anyhow::Context;
use serde_json::Value;

use crate::auth::repo_types::User;
use crate::store::{CredentialStore, Row};

const SELECT_BY_CREDENTIALS: &str = r#"
    SELECT id, name, role
    FROM users
    WHERE email = $1 AND password = $2
"#;

const SELECT_BY_EMAIL: &str = r#"
    SELECT id, name, role, password
    FROM users
    WHERE email = $1
"#;

const INSERT_IF_ABSENT: &str = r#"
    INSERT INTO users (name, role, email, password)
    SELECT $1, $2, $3, $4
    WHERE NOT EXISTS (SELECT 1 FROM users WHERE email = $3)
"#;

impl User {
    /// Find the user whose email and stored password both equal the inputs.
    /// Returns the first row when several match.
    pub async fn authenticate(
        store: &dyn CredentialStore,
        email: &str,
        password: &str,
    ) -> anyhow::Result<Option<User>> {
        let rows = store
            .query(SELECT_BY_CREDENTIALS, &[email, password])
            .await
            .context("select user by credentials")?;
        rows.into_iter().next().map(User::from_row).transpose()
    }

    /// All users registered under `email`, paired with the stored password value.
    pub async fn credentials_by_email(
        store: &dyn CredentialStore,
        email: &str,
    ) -> anyhow::Result<Vec<(User, String)>> {
        let rows = store
            .query(SELECT_BY_EMAIL, &[email])
            .await
            .context("select user by email")?;
        rows.into_iter()
            .map(|mut row| -> anyhow::Result<(User, String)> {
                let stored = match row.remove("password") {
                    Some(Value::String(s)) => s,
                    _ => anyhow::bail!("users.password is missing or not text"),
                };
                Ok((User::from_row(row)?, stored))
            })
            .collect()
    }

    /// Insert a user unless one with the same email exists.
    pub async fn insert_if_absent(
        store: &dyn CredentialStore,
        name: &str,
        role: &str,
        email: &str,
        stored_password: &str,
    ) -> anyhow::Result<()> {
        store
            .query(INSERT_IF_ABSENT, &[name, role, email, stored_password])
            .await
            .with_context(|| format!("insert user {email}"))?;
        Ok(())
    }

    fn from_row(row: Row) -> anyhow::Result<User> {
        serde_json::from_value(Value::Object(row)).context("decode user row")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{FailingStore, MemoryStore};

    #[tokio::test]
    async fn admin_login_from_store() {
        let store = MemoryStore::demo();
        let user = User::authenticate(&store, "kaival@gmail.com", "123456")
            .await
            .unwrap()
            .expect("admin should match");
        assert_eq!(user.role, "admin");
        assert_eq!(user.name, "Kaival");
        assert_eq!(user.id, 1);
    }

    #[tokio::test]
    async fn unknown_user_is_absent() {
        let store = MemoryStore::demo();
        let user = User::authenticate(&store, "fake@gmail.com", "0000").await.unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn wrong_password_is_absent() {
        let store = MemoryStore::demo();
        let user = User::authenticate(&store, "kaival@gmail.com", "1234567").await.unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn issues_one_parameterized_query() {
        let store = MemoryStore::demo();
        let hostile = "' OR '1'='1";
        let user = User::authenticate(&store, hostile, hostile).await.unwrap();
        assert!(user.is_none());

        let statements = store.statements.lock().unwrap();
        assert_eq!(statements.len(), 1);
        assert!(statements[0].contains("email = $1 AND password = $2"));
        assert!(!statements[0].contains(hostile));
    }

    #[tokio::test]
    async fn first_row_wins_on_duplicates() {
        let store = MemoryStore::new(vec![
            crate::store::memory::user_row(10, "First", "admin", "dup@x.io", "pw"),
            crate::store::memory::user_row(11, "Second", "user", "dup@x.io", "pw"),
        ]);
        let user = User::authenticate(&store, "dup@x.io", "pw").await.unwrap().unwrap();
        assert_eq!(user.id, 10);
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let err = User::authenticate(&FailingStore, "a@b.c", "x").await.unwrap_err();
        assert!(format!("{err:#}").contains("connection refused"));
    }

    #[tokio::test]
    async fn credentials_by_email_returns_stored_password() {
        let store = MemoryStore::demo();
        let found = User::credentials_by_email(&store, "player@gmail.com").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0.role, "user");
        assert_eq!(found[0].1, "player123");
    }

    mod live {
        use super::*;
        use crate::auth::services::seed_demo_users;
        use crate::config::AppConfig;
        use crate::state::AppState;
        use crate::store::PgStore;
        use std::sync::Arc;

        async fn seeded_store() -> PgStore {
            let mut cfg = AppConfig::from_env().expect("config");
            cfg.password_scheme = crate::config::PasswordScheme::Plaintext;
            let store = PgStore::connect(&cfg.db).await.expect("database reachable");
            sqlx::migrate!("./migrations")
                .run(store.pool())
                .await
                .expect("migrations apply");
            let state = AppState::from_parts(Arc::new(store.clone()), Arc::new(cfg));
            seed_demo_users(&state).await.expect("first seed");
            seed_demo_users(&state).await.expect("second seed");
            store
        }

        // One test so concurrent seeding cannot race the NOT EXISTS insert.
        #[tokio::test]
        #[ignore = "requires a running Postgres (DATABASE_URL or DB_*)"]
        async fn seeded_users_are_unique_and_authenticate() {
            let store = seeded_store().await;

            for email in ["kaival@gmail.com", "player@gmail.com"] {
                let rows = store
                    .query("SELECT count(*) AS n FROM users WHERE email = $1", &[email])
                    .await
                    .unwrap();
                assert_eq!(rows[0]["n"], 1, "{email}");
            }

            let admin = User::authenticate(&store, "kaival@gmail.com", "123456")
                .await
                .unwrap()
                .expect("seeded admin matches");
            assert_eq!(admin.role, "admin");
            assert_eq!(admin.name, "Kaival");

            let nobody = User::authenticate(&store, "fake@gmail.com", "0000").await.unwrap();
            assert!(nobody.is_none());

            let found = User::credentials_by_email(&store, "player@gmail.com").await.unwrap();
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].0.role, "user");
            store.close().await;
        }
    }
}
