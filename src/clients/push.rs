//! Theme and product pushes built on [`AdminClient`].

use serde_json::Value;

use crate::clients::{AdminClient, AdminError, ProductDraft, ThemeRole};

/// Name given to every theme created by [`push_theme`].
pub const THEME_NAME: &str = "DropifyHub AI Theme";

/// Asset key the stylesheet is uploaded to.
pub const CSS_ASSET_KEY: &str = "assets/ai.css";

/// Asset key the landing page template is uploaded to.
pub const INDEX_ASSET_KEY: &str = "templates/index.liquid";

/// Creates an unpublished theme and uploads `css` and `html` into it.
///
/// Returns the new theme's id. If an upload fails the theme is left in
/// place; the merchant can delete it from the admin.
///
/// # Errors
///
/// Returns the first [`AdminError`] encountered.
pub async fn push_theme(client: &AdminClient, html: &str, css: &str) -> Result<u64, AdminError> {
    let theme = client.create_theme(THEME_NAME, ThemeRole::Unpublished).await?;
    tracing::info!(shop = %client.shop(), theme_id = theme.id, "created theme");

    client.put_asset(theme.id, CSS_ASSET_KEY, css).await?;
    client.put_asset(theme.id, INDEX_ASSET_KEY, html).await?;
    tracing::info!(shop = %client.shop(), theme_id = theme.id, "uploaded theme assets");

    Ok(theme.id)
}

/// Creates each product in order, stopping at the first failure.
///
/// # Errors
///
/// Returns the first [`AdminError`]; products created before it remain.
pub async fn push_products(
    client: &AdminClient,
    products: &[ProductDraft],
) -> Result<Vec<Value>, AdminError> {
    let mut created = Vec::with_capacity(products.len());
    for draft in products {
        created.push(client.create_product(draft).await?);
    }
    tracing::info!(shop = %client.shop(), count = created.len(), "created products");
    Ok(created)
}
