use super::*;

fn offline() -> CatalogClient {
    CatalogClient::new(None, 5, "zina-test/0.1").expect("client")
}

#[test]
fn blank_base_url_means_offline() {
    let client = CatalogClient::new(Some("   "), 5, "zina-test/0.1").expect("client");
    assert!(!client.is_configured());
    assert!(matches!(
        client.endpoint("products"),
        Err(CatalogError::NotConfigured)
    ));
}

#[test]
fn base_url_gains_trailing_slash_for_joins() {
    let client =
        CatalogClient::new(Some("https://api.example.com/api/v1"), 5, "ua").expect("client");
    let url = client.endpoint("products/7").expect("endpoint");
    assert_eq!(url.as_str(), "https://api.example.com/api/v1/products/7");
}

#[test]
fn non_http_base_url_is_rejected() {
    let err = CatalogClient::new(Some("ftp://example.com"), 5, "ua").expect_err("ftp");
    assert!(matches!(err, CatalogError::InvalidBaseUrl { .. }));
    let err = CatalogClient::new(Some("not a url"), 5, "ua").expect_err("garbage");
    assert!(matches!(err, CatalogError::InvalidBaseUrl { .. }));
}

#[test]
fn field_errors_win_over_message() {
    let body = r#"{"message": "The given data was invalid.", "errors": {"price": ["The price must be a number."]}}"#;
    match error_from_body(422, body) {
        CatalogError::Validation { field, message } => {
            assert_eq!(field, "price");
            assert_eq!(message, "The price must be a number.");
        }
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[test]
fn message_then_error_then_generic() {
    match error_from_body(403, r#"{"message": "Forbidden", "error": "nope"}"#) {
        CatalogError::Status { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "Forbidden");
        }
        other => panic!("unexpected {other:?}"),
    }
    match error_from_body(500, r#"{"error": "boom"}"#) {
        CatalogError::Status { message, .. } => assert_eq!(message, "boom"),
        other => panic!("unexpected {other:?}"),
    }
    match error_from_body(502, "<html>Bad Gateway</html>") {
        CatalogError::Status { message, .. } => {
            assert_eq!(message, "request failed with status 502");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn string_field_error_is_accepted() {
    let err = error_from_body(422, r#"{"errors": {"email": "taken"}}"#);
    assert!(matches!(err, CatalogError::Validation { ref field, ref message }
        if field == "email" && message == "taken"));
}

#[tokio::test]
async fn scoped_clients_do_not_share_tokens() {
    let client = offline();
    client.set_token(Some("shared".to_string())).await;
    let clone = client.clone();
    let scoped = client.scoped(Some("mine".to_string()));

    assert_eq!(clone.token().await.as_deref(), Some("shared"));
    assert_eq!(scoped.token().await.as_deref(), Some("mine"));

    scoped.set_token(None).await;
    assert_eq!(client.token().await.as_deref(), Some("shared"));
}

#[test]
fn debug_redacts_token() {
    let rendered = format!("{:?}", offline());
    assert!(rendered.contains("[redacted]"));
}

#[test]
fn transport_classification() {
    assert!(!CatalogError::NotConfigured.is_transport());
    assert_eq!(
        CatalogError::Status {
            status: 404,
            message: String::new()
        }
        .status(),
        Some(404)
    );
}
