use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use uuid::Uuid;

use crate::routes::auth::INTERNAL_API_KEY_HEADER;
use crate::routes::products::{ProductRequest, ReduceStockRequest};

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct ProductDoc {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i32,
    /// RFC 3339
    pub created_at: String,
    /// RFC 3339
    pub updated_at: String,
}

#[derive(ToSchema)]
pub struct MessageBodyDoc {
    pub message: String,
    /// Present on create only
    pub id: Option<Uuid>,
}

#[derive(ToSchema)]
pub struct ErrorBodyDoc { pub code: String, pub message: String }

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
            components.add_security_scheme(
                "internal_api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(INTERNAL_API_KEY_HEADER))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::products::list,
        crate::routes::products::get_by_id,
        crate::routes::products::create,
        crate::routes::products::update,
        crate::routes::products::delete,
        crate::routes::products::reduce_stock,
    ),
    components(
        schemas(
            HealthResponse,
            ProductDoc,
            MessageBodyDoc,
            ErrorBodyDoc,
            ProductRequest,
            ReduceStockRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health"),
        (name = "products")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for p in ["/health", "/list", "/create", "/{id}", "/reduce-stock/{id}"] {
            assert!(paths.contains(&p), "missing {p}");
        }
        let item = &doc.paths.paths["/{id}"];
        assert_eq!(item.operations.len(), 3);
    }
}
