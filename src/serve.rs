//! Live HTTP view of the sample.
//!
//! Any path answers with the current snapshot. The body format is picked
//! from the query string:
//!
//! | query   | body                                          |
//! |---------|-----------------------------------------------|
//! | (none)  | JSON `{"lines", "lineNumbers", "seen"}`        |
//! | `t=1`   | `<lineNumber>\t<content>` per line            |
//! | `p=1`   | `<content>` per line                          |
//!
//! Every request takes a fresh snapshot; nothing is cached.

use std::collections::HashMap;
use std::io;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Router;
use rand::Rng;
use tokio::net::TcpListener;
use tracing::{debug, error};

use crate::reservoir::SharedReservoir;
use crate::snapshot::OutputFormat;
use crate::termination::Termination;
use crate::{Error, Result};

/// Build the router serving `reservoir`.
pub fn router<R>(reservoir: SharedReservoir<R>) -> Router
where
    R: Rng + Send + 'static,
{
    Router::new()
        .fallback(sample::<R>)
        .with_state(reservoir)
}

async fn sample<R>(
    State(reservoir): State<SharedReservoir<R>>,
    params: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Response
where
    R: Rng + Send + 'static,
{
    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => {
            debug!(%rejection, "ignoring malformed query string");
            HashMap::new()
        }
    };
    let format = OutputFormat::from_params(
        params.get("t").map(String::as_str),
        params.get("p").map(String::as_str),
    );

    let snapshot = reservoir.snapshot();
    match snapshot.render(format) {
        Ok(body) => ([(CONTENT_TYPE, format.content_type())], body).into_response(),
        Err(err) => {
            error!(%err, %format, "failed to render sample");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(CONTENT_TYPE, "text/plain")],
                format!("{format} err: {err}"),
            )
                .into_response()
        }
    }
}

/// Bind the listen address, reporting failure as a configuration error.
pub async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr).await.map_err(|source| Error::Bind {
        addr: addr.to_owned(),
        source,
    })
}

/// Serve the sample on `listener` until `termination` stops.
pub async fn serve<R>(
    listener: TcpListener,
    reservoir: SharedReservoir<R>,
    termination: Termination,
) -> io::Result<()>
where
    R: Rng + Send + 'static,
{
    axum::serve(listener, router(reservoir))
        .with_graceful_shutdown(async move {
            termination.stopped().await;
        })
        .await
}
