//! Username/password authentication against the user store.

use tracing::{debug, instrument};

use crate::{
    auth::password::{self, Argon2Params},
    db::{handlers::UserStore, models::users::UserDBResponse},
    errors::Result,
    types::abbrev_uuid,
};

/// Check a username/password pair.
///
/// Returns `Ok(None)` for an unknown user, a wrong password, an account without a password, or an
/// inactive account. Callers must not tell these apart in their responses. An unknown username
/// still costs one Argon2 computation so timing doesn't leak whether the account exists.
#[instrument(skip_all)]
pub async fn authenticate(
    users: &dyn UserStore,
    username: &str,
    password: &str,
    params: Argon2Params,
) -> Result<Option<UserDBResponse>> {
    let Some(user) = users.get_by_username(username).await? else {
        password::hash_password_blocking(password.to_string(), params).await?;
        debug!("Credential check failed: unknown username");
        return Ok(None);
    };

    let Some(hash) = user.password_hash.clone() else {
        password::hash_password_blocking(password.to_string(), params).await?;
        debug!("Credential check failed: user {} has no password", abbrev_uuid(&user.id));
        return Ok(None);
    };

    if !password::verify_password_blocking(password.to_string(), hash).await? {
        debug!("Credential check failed: wrong password for user {}", abbrev_uuid(&user.id));
        return Ok(None);
    }

    if !user.is_active {
        debug!("Credential check failed: user {} is inactive", abbrev_uuid(&user.id));
        return Ok(None);
    }

    Ok(Some(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::in_memory::InMemoryUsers;
    use crate::db::models::users::UserCreateDBRequest;

    async fn store_with_user(username: &str, password: &str, is_active: bool) -> InMemoryUsers {
        let users = InMemoryUsers::new();
        let hash = password::hash_password(password, Argon2Params::insecure_for_tests()).unwrap();
        users
            .create(&UserCreateDBRequest {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                first_name: String::new(),
                last_name: String::new(),
                password_hash: Some(hash),
                is_active,
            })
            .await
            .unwrap();
        users
    }

    #[tokio::test]
    async fn test_valid_credentials() {
        let users = store_with_user("alice", "correct-horse", true).await;
        let user = authenticate(&users, "alice", "correct-horse", Argon2Params::insecure_for_tests())
            .await
            .unwrap();
        assert_eq!(user.map(|u| u.username), Some("alice".to_string()));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_the_same() {
        let users = store_with_user("alice", "correct-horse", true).await;
        let params = Argon2Params::insecure_for_tests();

        assert!(authenticate(&users, "alice", "wrong", params).await.unwrap().is_none());
        assert!(authenticate(&users, "nobody", "wrong", params).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_inactive_user_rejected() {
        let users = store_with_user("bob", "correct-horse", false).await;
        let user = authenticate(&users, "bob", "correct-horse", Argon2Params::insecure_for_tests())
            .await
            .unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_user_without_password_rejected() {
        let users = InMemoryUsers::new();
        users
            .create(&UserCreateDBRequest {
                username: "nopass".to_string(),
                email: String::new(),
                first_name: String::new(),
                last_name: String::new(),
                password_hash: None,
                is_active: true,
            })
            .await
            .unwrap();

        let user = authenticate(&users, "nopass", "", Argon2Params::insecure_for_tests()).await.unwrap();
        assert!(user.is_none());
    }
}
