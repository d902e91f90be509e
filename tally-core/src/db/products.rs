use rusqlite::{params, Row};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::convert::{decimal, uuid};
use super::Database;
use crate::error::{CrmError, CrmResult};
use crate::models::{CreateProductInput, Product};
use crate::money::checked_amount;

fn product_from_row(row: &Row) -> rusqlite::Result<Product> {
    Ok(Product {
        id: uuid(row, "id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        price: decimal(row, "price")?,
        active: row.get("active")?,
    })
}

impl Database {
    pub fn list_products(&self) -> CrmResult<Vec<Product>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, description, price, active FROM products
                 ORDER BY active DESC, name ASC",
            )?;
            let products = stmt
                .query_map([], product_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(products)
        })
    }

    pub fn create_product(&self, input: CreateProductInput) -> CrmResult<Product> {
        let name = match input.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(CrmError::validation("name is required")),
        };
        let price = checked_amount(input.price.unwrap_or(Decimal::ZERO), "price")?;
        let product = Product {
            id: Uuid::new_v4(),
            name,
            description: input.description,
            price,
            active: true,
        };
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO products (id, name, description, price, active)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    product.id.to_string(),
                    product.name,
                    product.description,
                    product.price.to_string(),
                    product.active,
                ],
            )?;
            Ok(())
        })?;
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support;
    use crate::models::CreateProductInput;
    use rust_decimal::Decimal;

    #[test]
    fn created_products_are_listed() {
        let db = test_support::db();
        let product = db
            .create_product(CreateProductInput {
                name: Some("Website care".into()),
                price: Some(Decimal::new(4999, 2)),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(db.list_products().unwrap(), vec![product]);
        assert!(db.create_product(CreateProductInput::default()).is_err());
    }

    #[test]
    fn product_price_is_bounded() {
        let db = test_support::db();
        let result = db.create_product(CreateProductInput {
            name: Some("Enterprise".into()),
            price: Some(Decimal::MAX),
            ..Default::default()
        });
        assert!(matches!(result, Err(crate::error::CrmError::Validation(_))));
    }
}
