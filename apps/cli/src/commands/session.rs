//! # Session Commands
//!
//! Who is at the counter. There are no passwords; the name is stamped on
//! sales, restocks and credit payments until someone else logs in.

use tracing::{debug, info};

use spares_core::validation::validate_operator_name;
use spares_core::Operator;

use crate::commands::Output;
use crate::error::ApiError;
use crate::state::DbState;

pub async fn login(db: &DbState, name: &str, role: &str) -> Result<Output, ApiError> {
    debug!(name = %name, role = %role, "login command");

    validate_operator_name(name)?;
    let operator = Operator {
        name: name.trim().to_string(),
        role: role.trim().to_lowercase(),
    };
    db.inner().storage().set_current_user(&operator).await?;

    info!(name = %operator.name, role = %operator.role, "Operator logged in");
    Output::json(&operator)
}

/// Forgets the current operator; the default one takes over.
pub async fn logout(db: &DbState) -> Result<Output, ApiError> {
    debug!("logout command");

    let previous = db.operator().await?;
    db.inner()
        .storage()
        .remove(spares_core::snapshot::KEY_CURRENT_USER)
        .await?;

    info!(name = %previous.name, "Operator logged out");
    Output::json(&Operator::default())
}

pub async fn whoami(db: &DbState) -> Result<Output, ApiError> {
    Output::json(&db.operator().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{json, test_state};
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_login_whoami_logout() {
        let (db, _) = test_state().await;

        let out = json(whoami(&db).await.unwrap());
        assert_eq!(out["name"], "Admin");

        login(&db, "  Neema ", "Cashier").await.unwrap();
        let out = json(whoami(&db).await.unwrap());
        assert_eq!(out["name"], "Neema");
        assert_eq!(out["role"], "cashier");

        logout(&db).await.unwrap();
        let out = json(whoami(&db).await.unwrap());
        assert_eq!(out["name"], "Admin");
    }

    #[tokio::test]
    async fn test_login_requires_name() {
        let (db, _) = test_state().await;

        let err = login(&db, "   ", "cashier").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
