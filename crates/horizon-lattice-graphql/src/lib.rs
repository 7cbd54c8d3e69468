//! GraphQL over HTTP for Horizon Lattice.
//!
//! This crate issues GraphQL operations through a pluggable transport and
//! interprets the JSON response envelope:
//!
//! - **Client**: builds `{query, operationName, variables}` payloads and hands
//!   them to a [`RequestExecutor`]
//! - **Response**: separates `data` from `errors`, keeps HTTP status and headers
//! - **Path extraction**: typed access into `data` with paths such as
//!   `viewer.repositories.edges[*].node.name`
//! - **Custom scalars**: named [`Coercing`] implementations consulted during
//!   extraction
//!
//! # Example
//!
//! ```no_run
//! use horizon_lattice_graphql::{GraphQLClient, GraphQLRequest, ReqwestExecutor, TypeDescriptor};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = ReqwestExecutor::new()?;
//! let client = GraphQLClient::builder("https://api.example.com/graphql")
//!     .bearer_auth("my-token")
//!     .build()?;
//!
//! let request = GraphQLRequest::query(
//!     "query Reviews($first: Int!) { reviews(first: $first) { edges { node { id stars } } } }",
//! )
//! .operation_name("Reviews")
//! .variable("first", 10);
//!
//! let response = client.execute(&request, &executor)?;
//! if response.has_errors() {
//!     eprintln!("partial result: {}", response.error_message().unwrap_or_default());
//! }
//!
//! let stars = response.extract_value(
//!     "reviews.edges[*].node.stars",
//!     &TypeDescriptor::list_of(TypeDescriptor::int()),
//! )?;
//! println!("{stars:?}");
//! # Ok(())
//! # }
//! ```
//!
//! # Errors
//!
//! Transport failures ([`TransportError`]) and malformed bodies fail the call.
//! GraphQL errors returned by the server do not: they are available through
//! [`GraphQLResponse::errors`], and [`GraphQLResponse::into_result`] turns them
//! into an [`Error::Execution`] on request.

mod client;
mod error;
pub mod executor;
pub mod path;
mod request;
mod response;
pub mod scalar;
pub mod shape;

pub use client::{GraphQLClient, GraphQLClientBuilder};
pub use error::{Error, ExtractError, Result, TransportError};
pub use executor::{Headers, HttpResult, RequestExecutor};
#[cfg(feature = "reqwest")]
pub use executor::{ReqwestExecutor, ReqwestExecutorBuilder, ReqwestExecutorConfig};
pub use path::{Path, PathStep};
pub use request::{GraphQLRequest, OperationType, INTROSPECTION_QUERY};
pub use response::{
    GraphQLError, GraphQLExecutionError, GraphQLLocation, GraphQLResponse, PathSegment,
};
pub use scalar::{Coercing, CoercingError, CustomValue, Literal, ScalarError, ScalarRegistry};
pub use shape::{FieldBinding, Projection, ScalarKind, TypeDescriptor};
