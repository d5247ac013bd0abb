//! Counterparty records - Clients and distributors.
//!
//! Creation validates the identity fields and normalises them (trimmed name,
//! empty optional fields stored as `None`, lowercased email). Debt totals start
//! at zero and are only moved by the debt tracker.

use crate::{
    entities::{Client, Distributor, client, distributor},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::debug;

use super::{
    requests::{NewClient, NewDistributor},
    validation::{validate_new_client, validate_new_distributor},
};

fn normalized(field: Option<&str>) -> Option<String> {
    field
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

/// Creates a client, or returns the existing one when `request.id` was already used.
pub async fn create_client<C>(db: &C, request: &NewClient) -> Result<client::Model>
where
    C: ConnectionTrait,
{
    validate_new_client(request)?;
    if let Some(existing) = get_client(db, &request.id).await? {
        debug!("Client {} already exists; returning it", request.id);
        return Ok(existing);
    }

    let now = Utc::now();
    let model = client::ActiveModel {
        id: Set(request.id.clone()),
        name: Set(request.name.trim().to_string()),
        phone: Set(normalized(request.phone.as_deref())),
        email: Set(normalized(request.email.as_deref()).map(|email| email.to_lowercase())),
        credit_limit: Set(request.credit_limit),
        total_owed: Set(0),
        total_paid: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    };
    model.insert(db).await.map_err(Into::into)
}

/// Creates a distributor, or returns the existing one when `request.id` was already used.
pub async fn create_distributor<C>(db: &C, request: &NewDistributor) -> Result<distributor::Model>
where
    C: ConnectionTrait,
{
    validate_new_distributor(request)?;
    if let Some(existing) = get_distributor(db, &request.id).await? {
        debug!("Distributor {} already exists; returning it", request.id);
        return Ok(existing);
    }

    let now = Utc::now();
    let model = distributor::ActiveModel {
        id: Set(request.id.clone()),
        name: Set(request.name.trim().to_string()),
        company: Set(normalized(request.company.as_deref())),
        phone: Set(normalized(request.phone.as_deref())),
        email: Set(normalized(request.email.as_deref()).map(|email| email.to_lowercase())),
        total_owed: Set(0),
        total_paid: Set(0),
        total_ordered: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    };
    model.insert(db).await.map_err(Into::into)
}

/// Retrieves a client by id.
pub async fn get_client<C>(db: &C, client_id: &str) -> Result<Option<client::Model>>
where
    C: ConnectionTrait,
{
    Client::find_by_id(client_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a distributor by id.
pub async fn get_distributor<C>(db: &C, distributor_id: &str) -> Result<Option<distributor::Model>>
where
    C: ConnectionTrait,
{
    Distributor::find_by_id(distributor_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// All clients, alphabetically.
pub async fn get_all_clients<C>(db: &C) -> Result<Vec<client::Model>>
where
    C: ConnectionTrait,
{
    Client::find()
        .order_by_asc(client::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// All distributors, alphabetically.
pub async fn get_all_distributors<C>(db: &C) -> Result<Vec<distributor::Model>>
where
    C: ConnectionTrait,
{
    Distributor::find()
        .order_by_asc(distributor::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::errors::{Error, ErrorKind};
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_client_normalises_fields() -> Result<()> {
        let db = setup_test_db().await?;
        let mut request = NewClient::new("  Ana López ");
        request.phone = Some("   ".to_string());
        request.email = Some("Ana@Example.MX".to_string());

        let client = create_client(&db, &request).await?;
        assert_eq!(client.name, "Ana López");
        assert_eq!(client.phone, None);
        assert_eq!(client.email.as_deref(), Some("ana@example.mx"));
        assert_eq!(client.total_owed, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_client_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let request = NewClient::new("Ana");

        let first = create_client(&db, &request).await?;
        let second = create_client(&db, &request).await?;
        assert_eq!(first, second);
        assert_eq!(get_all_clients(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_client_is_not_stored() -> Result<()> {
        let db = setup_test_db().await?;
        let mut request = NewClient::new("A");
        request.email = Some("bad".to_string());

        let err = create_client(&db, &request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.messages().len(), 2);
        assert!(get_client(&db, &request.id).await?.is_none());
        assert!(matches!(err, Error::Validation(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_distributor() -> Result<()> {
        let db = setup_test_db().await?;
        let mut request = NewDistributor::new("Proveedor Norte");
        request.company = Some("Norte SA".to_string());

        let distributor = create_distributor(&db, &request).await?;
        assert_eq!(distributor.company.as_deref(), Some("Norte SA"));
        assert_eq!(
            get_distributor(&db, &distributor.id).await?.unwrap().name,
            "Proveedor Norte"
        );
        assert_eq!(get_all_distributors(&db).await?.len(), 1);
        Ok(())
    }
}
