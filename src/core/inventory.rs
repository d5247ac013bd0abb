//! Inventory business logic - Product lookups and stock deltas.
//!
//! Products are created by the first purchase order that names them. Purchase
//! orders add stock and sales remove it; both go through [`apply_stock_delta`],
//! which never lets the stock column drop below zero.

use crate::{
    entities::{Product, product},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{
    QueryOrder, Set,
    prelude::*,
    sea_query::{Expr, OnConflict},
};

/// Product to create, or to refresh the unit cost of, inside a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductUpsert {
    /// Existing id, or a fresh one for a first purchase
    pub id: String,
    /// Product name
    pub name: String,
    /// Latest unit cost
    pub unit_cost: i64,
}

/// Retrieves every product, ordered alphabetically by name.
pub async fn get_all_products<C>(db: &C) -> Result<Vec<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find()
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a product by its exact (trimmed) name.
pub async fn get_product_by_name<C>(db: &C, name: &str) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find()
        .filter(product::Column::Name.eq(name.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a product by id.
pub async fn get_product_by_id<C>(db: &C, product_id: &str) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Inserts the product with zero stock, or updates its unit cost when it exists.
pub async fn upsert_product<C>(db: &C, upsert: &ProductUpsert) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let model = product::ActiveModel {
        id: Set(upsert.id.clone()),
        name: Set(upsert.name.trim().to_string()),
        stock: Set(0),
        unit_cost: Set(upsert.unit_cost),
        created_at: Set(now),
        updated_at: Set(now),
    };

    Product::insert(model)
        .on_conflict(
            OnConflict::column(product::Column::Id)
                .update_columns([product::Column::UnitCost, product::Column::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Adds `delta` units to a product's stock.
///
/// Negative deltas carry `WHERE stock >= -delta`, so a sale can never take more
/// units than are on hand.
pub async fn apply_stock_delta<C>(db: &C, product_id: &str, delta: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let mut update = Product::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).add(delta),
        )
        .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(product::Column::Id.eq(product_id));
    if delta < 0 {
        update = update.filter(product::Column::Stock.gte(-delta));
    }

    let result = update.exec(db).await?;
    if result.rows_affected == 0 {
        if get_product_by_id(db, product_id).await?.is_none() {
            return Err(Error::not_found("product", product_id));
        }
        return Err(Error::InsufficientStock {
            product: product_id.to_string(),
            requested: -delta,
        });
    }
    Ok(())
}
