//! Product catalog and predefined measures

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use shared::{validate_sku, PredefinedMeasure, Product};

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

#[derive(Debug, Deserialize)]
pub struct ProductInput {
    pub sku: String,
    pub name: String,
    pub unit: Option<String>,
    pub quality: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMeasureInput {
    pub product_type: String,
    pub name: String,
    pub length: Decimal,
    pub width: Decimal,
    pub thickness: Option<Decimal>,
}

const PRODUCT_COLUMNS: &str = "id, sku, name, unit, quality, created_at";
const MEASURE_COLUMNS: &str =
    "id, seq, product_type, name, length, width, thickness, is_active, created_at";

/// Return the product for `sku`, creating it if it does not exist yet.
///
/// An existing product is returned untouched; the name, unit and quality
/// given here only apply on first creation.
pub async fn get_or_create_product(
    conn: &mut PgConnection,
    input: &ProductInput,
) -> AppResult<Product> {
    sqlx::query(
        r#"
        INSERT INTO products (sku, name, unit, quality)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (sku) DO NOTHING
        "#,
    )
    .bind(input.sku.trim())
    .bind(input.name.trim())
    .bind(&input.unit)
    .bind(&input.quality)
    .execute(&mut *conn)
    .await?;

    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {} FROM products WHERE sku = $1",
        PRODUCT_COLUMNS
    ))
    .bind(input.sku.trim())
    .fetch_one(&mut *conn)
    .await?;

    Ok(product)
}

impl CatalogService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get_or_create_product(&self, input: ProductInput) -> AppResult<Product> {
        validate_sku(&input.sku).map_err(|m| AppError::invalid("sku", m))?;
        if input.name.trim().is_empty() {
            return Err(AppError::invalid("name", "Product name is required"));
        }

        let mut conn = self.db.acquire().await?;
        get_or_create_product(&mut *conn, &input).await
    }

    pub async fn list_products(&self) -> AppResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products ORDER BY name, sku",
            PRODUCT_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    /// Active measures for a product type, in insertion order
    pub async fn list_measures(&self, product_type: &str) -> AppResult<Vec<PredefinedMeasure>> {
        let measures = sqlx::query_as::<_, PredefinedMeasure>(&format!(
            r#"
            SELECT {}
            FROM predefined_measures
            WHERE lower(product_type) = lower($1) AND is_active
            ORDER BY seq
            "#,
            MEASURE_COLUMNS
        ))
        .bind(product_type.trim())
        .fetch_all(&self.db)
        .await?;

        Ok(measures)
    }

    pub async fn create_measure(&self, input: CreateMeasureInput) -> AppResult<PredefinedMeasure> {
        if input.product_type.trim().is_empty() {
            return Err(AppError::invalid("product_type", "Product type is required"));
        }
        if input.name.trim().is_empty() {
            return Err(AppError::invalid("name", "Measure name is required"));
        }
        for (field, value) in [
            ("length", Some(input.length)),
            ("width", Some(input.width)),
            ("thickness", input.thickness),
        ] {
            if matches!(value, Some(v) if v <= Decimal::ZERO) {
                return Err(AppError::invalid(field, "Dimensions must be positive"));
            }
        }

        let measure = sqlx::query_as::<_, PredefinedMeasure>(&format!(
            r#"
            INSERT INTO predefined_measures (product_type, name, length, width, thickness)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            MEASURE_COLUMNS
        ))
        .bind(input.product_type.trim())
        .bind(input.name.trim())
        .bind(input.length)
        .bind(input.width)
        .bind(input.thickness)
        .fetch_one(&self.db)
        .await?;

        Ok(measure)
    }

    /// Deactivate a measure; the row is kept
    pub async fn retire_measure(&self, measure_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("UPDATE predefined_measures SET is_active = FALSE WHERE id = $1")
            .bind(measure_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Measure".to_string()));
        }

        Ok(())
    }
}
