pub mod types;
pub mod utils;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
        let v = serde_json::to_value(&h).unwrap();
        assert_eq!(v["status"], "ok");
    }

    #[test]
    fn error_body_shape() {
        let body = types::ErrorBody::new("PRODUCT_NOT_FOUND", "product not found");
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v, serde_json::json!({"code": "PRODUCT_NOT_FOUND", "message": "product not found"}));
    }

    #[test]
    fn message_body_skips_missing_id() {
        let v = serde_json::to_value(types::MessageBody::new("Product deleted successfully")).unwrap();
        assert_eq!(v, serde_json::json!({"message": "Product deleted successfully"}));
    }
}
