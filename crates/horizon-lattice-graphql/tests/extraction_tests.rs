//! Integration tests for path extraction and custom scalars.

use std::str::FromStr;
use std::sync::Arc;

use horizon_lattice_graphql::{
    Coercing, CoercingError, ExtractError, FieldBinding, GraphQLClient, GraphQLResponse, Headers,
    HttpResult, Projection, ScalarRegistry, TransportError, TypeDescriptor,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Arbitrary-precision money amounts, sent as strings.
struct Money;

impl Coercing for Money {
    type Output = Decimal;

    fn serialize(&self, value: &Decimal) -> Result<Value, CoercingError> {
        Ok(Value::String(value.to_string()))
    }

    fn parse_value(&self, input: &Value) -> Result<Decimal, CoercingError> {
        let text = match input {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            other => return Err(CoercingError::new(format!("expected a decimal, found {other}"))),
        };
        Decimal::from_str(&text).map_err(|e| CoercingError::new(e.to_string()))
    }
}

fn review_response() -> GraphQLResponse {
    GraphQLResponse::parse(
        &json!({
            "data": {
                "submitReview": {
                    "edges": [
                        {"node": {"id": 7, "submittedBy": "a@x.com", "stars": 5, "comment": null}},
                        {"node": {"id": "r-8", "submittedBy": "b@x.com", "stars": 3, "comment": "ok"}}
                    ]
                }
            }
        })
        .to_string(),
        200,
        None,
    )
    .unwrap()
}

#[test]
fn test_single_value_by_index() {
    let response = review_response();

    let email: String = response
        .extract("submitReview.edges[0].node.submittedBy")
        .unwrap();
    assert_eq!(email, "a@x.com");

    let projected = response
        .extract_value(
            "submitReview.edges[0].node.submittedBy",
            &TypeDescriptor::string(),
        )
        .unwrap();
    assert_eq!(projected.as_str(), Some("a@x.com"));
}

#[test]
fn test_wildcard_collects_in_order() {
    let response = review_response();

    let emails = response
        .extract_value(
            "submitReview.edges[*].node.submittedBy",
            &TypeDescriptor::list_of(TypeDescriptor::string()),
        )
        .unwrap();
    assert_eq!(emails.into_strings().unwrap(), ["a@x.com", "b@x.com"]);

    let stars: Vec<i64> = response.extract("submitReview.edges[*].node.stars").unwrap();
    assert_eq!(stars, [5, 3]);
}

#[test]
fn test_wildcard_over_empty_list() {
    let response = GraphQLResponse::parse(r#"{"data": {"items": []}}"#, 200, None).unwrap();

    let names: Vec<String> = response.extract("items[*].name").unwrap();
    assert!(names.is_empty());
}

#[test]
fn test_record_projection() {
    let response = review_response();
    let shape = TypeDescriptor::list_of(TypeDescriptor::record([
        FieldBinding::new("id", TypeDescriptor::id()),
        FieldBinding::at("author", "submittedBy", TypeDescriptor::string()).unwrap(),
        FieldBinding::new("comment", TypeDescriptor::string().nullable()),
    ]));

    let reviews = response
        .extract_value("submitReview.edges[*].node", &shape)
        .unwrap();
    let reviews = reviews.as_list().unwrap();

    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0].field("id").and_then(Projection::as_str), Some("7"));
    assert_eq!(reviews[1].field("id").and_then(Projection::as_str), Some("r-8"));
    assert_eq!(
        reviews[1].field("author").and_then(Projection::as_str),
        Some("b@x.com")
    );
    assert!(reviews[0].field("comment").unwrap().is_null());
}

#[test]
fn test_serde_binding() {
    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Node {
        submitted_by: String,
        stars: u8,
        comment: Option<String>,
    }

    let response = review_response();
    let node: Node = response.extract("submitReview.edges[1].node").unwrap();
    assert_eq!(
        node,
        Node {
            submitted_by: "b@x.com".into(),
            stars: 3,
            comment: Some("ok".into()),
        }
    );
}

#[test]
fn test_field_not_found_names_location() {
    let response = review_response();

    let err = response
        .extract::<String>("submitReview.edges[1].node.missing")
        .unwrap_err();
    assert_eq!(
        err,
        ExtractError::FieldNotFound {
            path: "submitReview.edges[1].node.missing".into(),
            at: "submitReview.edges[1].node.missing".into(),
        }
    );

    let err = response
        .extract::<String>("submitReview.edges[5].node")
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_type_mismatch() {
    let response = review_response();

    let err = response
        .extract_value(
            "submitReview.edges[0].node.submittedBy",
            &TypeDescriptor::list_of(TypeDescriptor::string()),
        )
        .unwrap_err();
    assert!(err.is_type_mismatch());

    let err = response
        .extract_value("submitReview.edges[0].node.comment", &TypeDescriptor::string())
        .unwrap_err();
    assert!(err.is_type_mismatch());
}

#[test]
fn test_invalid_path() {
    let response = review_response();

    let err = response.extract::<Value>("submitReview.edges[x]").unwrap_err();
    assert!(matches!(err, ExtractError::InvalidPath { .. }));
}

#[test]
fn test_partial_success_still_extracts() {
    let response = GraphQLResponse::parse(
        &json!({
            "data": {"viewer": {"login": "octocat", "email": null}},
            "errors": [{"message": "email is private", "path": ["viewer", "email"]}]
        })
        .to_string(),
        200,
        None,
    )
    .unwrap();

    assert!(response.has_errors());
    let login: String = response.extract("viewer.login").unwrap();
    assert_eq!(login, "octocat");
    let email: Option<String> = response.extract("viewer.email").unwrap();
    assert_eq!(email, None);
}

#[test]
fn test_money_scalar_keeps_exact_digits() {
    let response = GraphQLResponse::parse(
        r#"{"data": {"order": {"total": "202000000", "lines": [{"price": "0.10"}, {"price": "19.99"}]}}}"#,
        200,
        None,
    )
    .unwrap()
    .with_scalars(Arc::new(ScalarRegistry::new().with("Money", Money)));

    let total: Decimal = response.extract_scalar("order.total", "Money").unwrap();
    assert_eq!(total, Decimal::from(202_000_000));
    assert_eq!(total.to_string(), "202000000");

    let prices = response
        .extract_value(
            "order.lines[*].price",
            &TypeDescriptor::list_of(TypeDescriptor::custom("Money")),
        )
        .unwrap();
    let prices: Vec<Decimal> = prices
        .as_list()
        .unwrap()
        .iter()
        .map(|p| *p.custom::<Decimal>().unwrap())
        .collect();
    assert_eq!(prices[0].to_string(), "0.10");
    assert_eq!(prices[1].to_string(), "19.99");
}

#[test]
fn test_money_scalar_rejects_garbage() {
    let response = GraphQLResponse::parse(r#"{"data": {"total": "lots"}}"#, 200, None)
        .unwrap()
        .with_scalars(Arc::new(ScalarRegistry::new().with("Money", Money)));

    let err = response
        .extract_scalar::<Decimal>("total", "Money")
        .unwrap_err();
    assert!(err.is_type_mismatch());

    let err = response
        .extract_scalar::<String>("total", "Money")
        .unwrap_err();
    assert!(err.is_type_mismatch());
}

#[test]
fn test_client_attaches_scalars() {
    let executor = |_: &str, _: &Headers, _: &str| {
        Ok::<_, TransportError>(HttpResult::new(
            200,
            r#"{"data": {"balance": "1234.5600"}}"#,
        ))
    };

    let client = GraphQLClient::builder("https://bank.example.com/graphql")
        .scalar("Money", Money)
        .build()
        .unwrap();
    let response = client
        .execute_query("{ balance }", Map::new(), None, &executor)
        .unwrap();

    let balance: Decimal = response.extract_scalar("balance", "Money").unwrap();
    assert_eq!(balance.to_string(), "1234.5600");
}

#[test]
fn test_headers_case_sensitive() {
    let result = HttpResult::new(200, r#"{"data": {"ok": true}}"#)
        .with_header("X-RateLimit-Remaining", "42")
        .with_header("x-ratelimit-remaining", "41");

    let response = GraphQLResponse::from_http_result(result).unwrap();

    assert_eq!(response.header("X-RateLimit-Remaining"), Some("42"));
    assert_eq!(response.header("x-ratelimit-remaining"), Some("41"));
    assert_eq!(response.header("X-RATELIMIT-REMAINING"), None);
    assert_eq!(response.headers().len(), 2);
}

#[test]
fn test_headers_absent() {
    let response = GraphQLResponse::parse(r#"{"data": {}}"#, 200, None).unwrap();
    assert!(response.headers().is_empty());
    assert_eq!(response.header("Content-Type"), None);
}
