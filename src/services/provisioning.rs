//! Profile resolution and lazy creation.
//!
//! One canonical policy shared by the auth gate and the login handler:
//! resolve the directory row for a verified identity, creating it on first
//! sight. Creation is lazy rather than registration-time so the identity
//! provider and the directory can drift without locking users out.

use crate::error::ApiError;
use crate::models::{NewUserRecord, Role, UserRecord};
use crate::supabase::{StoreError, UserDirectory, VerifiedIdentity};

/// Resolve the [`UserRecord`] for a verified identity.
///
/// Found rows get a best-effort verified-flag sync: if the provider has
/// confirmed the email but the stored flag is stale, the update is issued
/// and the returned record reflects the confirmed state even if the write
/// fails. Missing rows are created with `role = user`.
pub async fn resolve_profile(
    directory: &dyn UserDirectory,
    identity: &VerifiedIdentity,
) -> Result<UserRecord, ApiError> {
    match directory.find_by_id(&identity.id).await {
        Ok(Some(mut record)) => {
            if identity.email_confirmed && !record.verified {
                if let Err(err) = directory.set_verified(&identity.id, true).await {
                    tracing::warn!(user_id = %identity.id, %err, "verified-flag sync failed");
                }
                record.verified = true;
            }
            Ok(record)
        }
        Ok(None) => create_profile(directory, identity).await,
        Err(err) => {
            tracing::error!(user_id = %identity.id, %err, "user profile lookup failed");
            Err(ApiError::ProfileLookupFailed)
        }
    }
}

async fn create_profile(
    directory: &dyn UserDirectory,
    identity: &VerifiedIdentity,
) -> Result<UserRecord, ApiError> {
    let new_user = NewUserRecord {
        id: identity.id.clone(),
        name: identity.name.clone().unwrap_or_else(|| "User".to_string()),
        email: identity.email.clone(),
        role: Role::User,
        verified: identity.email_confirmed,
    };

    match directory.insert(&new_user).await {
        Ok(record) => {
            tracing::info!(user_id = %record.id, "created user profile on first authenticated request");
            Ok(record)
        }
        Err(StoreError::Conflict) => {
            // Lost a first-request race; the row exists now, so read it back.
            tracing::debug!(user_id = %identity.id, "profile insert conflicted, re-reading");
            match directory.find_by_id(&identity.id).await {
                Ok(Some(mut record)) => {
                    record.verified = record.verified || identity.email_confirmed;
                    Ok(record)
                }
                Ok(None) | Err(_) => Err(ApiError::ProfileSetupFailed),
            }
        }
        Err(err) => {
            tracing::error!(user_id = %identity.id, %err, "user profile creation failed");
            Err(ApiError::ProfileSetupFailed)
        }
    }
}
