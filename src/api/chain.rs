use std::sync::Arc;

use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, warn};

use super::models::{AppState, AppendBody, CorruptBody};
use crate::dispatch::{DispatchError, Operation, Request, Response, WireRequest};

/// View basic chain status.
#[get("/status/")]
pub async fn get_status(state: web::Data<AppState>) -> impl Responder {
    run(state, WireRequest::new(Operation::Status)).await
}

/// Mine and append a block holding `payload`.
#[post("/blocks/")]
pub async fn append_block(
    state: web::Data<AppState>,
    body: web::Json<AppendBody>,
) -> impl Responder {
    let body = body.into_inner();
    let wire = WireRequest {
        difficulty: body.difficulty,
        data: body.payload,
        ..WireRequest::new(Operation::Append)
    };
    run(state, wire).await
}

/// Validate the whole chain.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    run(state, WireRequest::new(Operation::Validate)).await
}

/// Get the full chain as block records plus the chain hash.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    run(state, WireRequest::new(Operation::Dump)).await
}

/// Overwrite a block's payload without re-mining it.
#[post("/corrupt/")]
pub async fn corrupt_block(
    state: web::Data<AppState>,
    body: web::Json<CorruptBody>,
) -> impl Responder {
    let body = body.into_inner();
    let wire = WireRequest {
        index: body.index,
        data: body.payload,
        ..WireRequest::new(Operation::Corrupt)
    };
    run(state, wire).await
}

/// Re-link and re-mine every block.
#[post("/repair/")]
pub async fn repair_chain(state: web::Data<AppState>) -> impl Responder {
    run(state, WireRequest::new(Operation::Repair)).await
}

/// Accept a raw wire request, exactly as the session transport does.
#[post("/request/")]
pub async fn raw_request(state: web::Data<AppState>, body: String) -> impl Responder {
    match Request::decode(&body) {
        Ok(request) => dispatch(state, request).await,
        Err(err) => {
            warn!("rejected request {body:?}: {err}");
            respond(err.into())
        }
    }
}

/* -------------------- Helpers -------------------- */

async fn run(state: web::Data<AppState>, wire: WireRequest) -> HttpResponse {
    match Request::try_from(wire) {
        Ok(request) => dispatch(state, request).await,
        Err(err) => {
            warn!("rejected request: {err}");
            respond(err.into())
        }
    }
}

/// Run the request on the blocking pool; mining must not stall the worker.
async fn dispatch(state: web::Data<AppState>, request: Request) -> HttpResponse {
    debug!("API - {:?}", request.operation());
    let dispatcher = Arc::clone(&state.dispatcher);
    match web::block(move || dispatcher.handle(request)).await {
        Ok(reply) => respond(reply.into_response()),
        Err(err) => {
            warn!("blocking pool failed: {err}");
            respond(DispatchError::Unavailable.into())
        }
    }
}

fn respond(response: Response) -> HttpResponse {
    if response.success {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::BadRequest().json(response)
    }
}
