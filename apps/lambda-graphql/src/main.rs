//! lambda-graphql: AWS Lambda entrypoint for the party planner GraphQL API.
//!
//! Purpose
//! - Handle API Gateway HTTP API (v2) events for `POST /graphql` and its CORS
//!   preflight.
//! - Execute the request against the schema backed by `DynamoStore`.
//! - Initialize structured logging compatible with Lambda.
//!
//! Environment
//! - `AWS_REGION`, `DYNAMO_ENDPOINT`: DynamoDB client settings.
//! - `PROJECT_NAME`, `STAGE`, `TABLE_PARENTS`, `TABLE_PARTIES`, `TABLE_CHILDREN`:
//!   table names.
//! - `FIXTURES_PATH`: optional JSON replacing the default viewer and widgets.

use std::sync::Arc;

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use aws_dynamo::DynamoStore;
use domain::{Fixtures, PartyService, Tables};
use graphql_schema::{build_schema, PartySchema};
use http_common::lambda::{resp, resp_with_error, with_cors};

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let fixtures = match std::env::var("FIXTURES_PATH") {
        Ok(path) if !path.is_empty() => {
            let raw = std::fs::read_to_string(&path).map_err(|e| format!("fixtures {path}: {e}"))?;
            Fixtures::from_json(&raw).map_err(|e| format!("fixtures {path}: {e}"))?
        }
        _ => Fixtures::default(),
    };
    let tables = Tables::from_lookup(|k| std::env::var(k).ok());
    info!(parents = %tables.parents, parties = %tables.parties, children = %tables.children, "tables");

    let store = DynamoStore::from_env().await;
    let schema = build_schema(PartyService::new(Arc::new(store), tables, fixtures));

    let handler = service_fn(move |req: Request| {
        let schema = schema.clone();
        async move { route(schema, req).await }
    });
    run(handler).await?;
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stdout))
        .init();
}

async fn route(schema: PartySchema, req: Request) -> Result<Response<Body>, Error> {
    // API Gateway HTTP API includes the stage prefix in rawPath (e.g. /dev/graphql)
    if !req.uri().path().ends_with("/graphql") {
        return Ok(with_cors(resp(404, None, Some(http_common::json_err("not_found")))));
    }

    match req.method().as_str() {
        "OPTIONS" => Ok(with_cors(resp(204, None, None))),
        "POST" => execute(schema, req).await,
        _ => Ok(with_cors(resp(
            405,
            None,
            Some(http_common::json_err("method_not_allowed")),
        ))),
    }
}

async fn execute(schema: PartySchema, req: Request) -> Result<Response<Body>, Error> {
    let body = match req.body() {
        Body::Text(s) => s.as_bytes(),
        Body::Binary(b) => b.as_slice(),
        _ => {
            return Ok(with_cors(resp_with_error(
                400,
                "invalid_request",
                "missing body",
            )))
        }
    };

    let request: async_graphql::Request = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "rejecting malformed graphql request");
            return Ok(with_cors(resp_with_error(
                400,
                "invalid_request",
                "body must be a GraphQL request object",
            )));
        }
    };

    let res = schema.execute(request).await;
    if !res.errors.is_empty() {
        info!(errors = res.errors.len(), "graphql request finished with errors");
    }
    match serde_json::to_value(&res) {
        Ok(json) => Ok(with_cors(resp(200, None, Some(json)))),
        Err(e) => Ok(with_cors(resp_with_error(500, "internal", &e.to_string()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::adapters::memory_store::MemoryStore;
    use serde_json::{json, Value};

    fn schema() -> PartySchema {
        build_schema(PartyService::new(
            Arc::new(MemoryStore::new()),
            Tables::default(),
            Fixtures::default(),
        ))
    }

    fn request(method: &str, path: &str, body: Body) -> Request {
        lambda_http::http::Request::builder()
            .method(method)
            .uri(path)
            .body(body)
            .unwrap()
    }

    fn body_json(resp: &Response<Body>) -> Value {
        match resp.body() {
            Body::Text(s) => serde_json::from_str(s).unwrap(),
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[tokio::test]
    async fn executes_post_under_stage_prefix() {
        let schema = schema();
        let query = json!({
            "query": "mutation ($id: String!) { createChild(input: {id: $id, name: \"Max\"}) { child { name } } }",
            "variables": {"id": "c1"},
        });
        let resp = route(schema.clone(), request("POST", "/dev/graphql", Body::from(query.to_string())))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(
            body_json(&resp)["data"]["createChild"]["child"]["name"],
            "Max"
        );
        assert!(resp.headers().contains_key("access-control-allow-origin"));
    }

    #[tokio::test]
    async fn preflight_and_method_errors() {
        let resp = route(schema(), request("OPTIONS", "/graphql", Body::Empty))
            .await
            .unwrap();
        assert_eq!(resp.status(), 204);
        assert_eq!(
            resp.headers().get("access-control-allow-methods").unwrap(),
            "OPTIONS, GET, POST"
        );

        let resp = route(schema(), request("DELETE", "/graphql", Body::Empty))
            .await
            .unwrap();
        assert_eq!(resp.status(), 405);

        let resp = route(schema(), request("POST", "/elsewhere", Body::Empty))
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn rejects_bad_bodies() {
        let resp = route(schema(), request("POST", "/graphql", Body::Empty))
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);

        let resp = route(schema(), request("POST", "/graphql", Body::from("[1, 2]")))
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        assert_eq!(body_json(&resp)["error"]["code"], "invalid_request");
    }
}
