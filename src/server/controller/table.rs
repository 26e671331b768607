use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};

use crate::server::controller::error::ApiError;
use crate::server::gateway::Gateway;
use crate::server::model::table::{
    CreateTablesRequest, CreateTablesResponse, GetTablesResponse, PatchAvailabilityRequest,
    PatchPositionRequest, Position,
};
use crate::server::state::AppState;

#[get("/v1/restaurant/{id}/tables")]
/// full floor plan of one restaurant
pub(crate) async fn get_tables(
    id: web::Path<i64>,
    data: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let tables = data.gateway().list_tables(id.into_inner()).await?;
    Ok(web::Json(GetTablesResponse { tables }))
}

#[post("/v1/restaurant/{id}/tables")]
/// bulk-create tables from (capacity, count) pairs
pub(crate) async fn post_tables(
    id: web::Path<i64>,
    req: web::Json<CreateTablesRequest>,
    data: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    if req.specs.is_empty() || req.specs.iter().any(|s| s.capacity <= 0 || s.count <= 0) {
        return Err(ApiError::BadRequest);
    }
    let created = data
        .gateway()
        .create_tables(id.into_inner(), req.created_by, &req.specs)
        .await?;
    Ok(web::Json(CreateTablesResponse { created }))
}

#[patch("/v1/table/{id}/position")]
/// persist a dragged position
pub(crate) async fn patch_position(
    id: web::Path<i64>,
    req: web::Json<PatchPositionRequest>,
    data: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    if !req.x.is_finite() || !req.y.is_finite() {
        return Err(ApiError::BadRequest);
    }
    data.gateway()
        .update_position(id.into_inner(), Position { x: req.x, y: req.y })
        .await?;
    Ok(HttpResponse::Ok())
}

#[patch("/v1/table/{id}/availability")]
/// open or close a table, independent of bookings
pub(crate) async fn patch_availability(
    id: web::Path<i64>,
    req: web::Json<PatchAvailabilityRequest>,
    data: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    data.gateway()
        .update_availability(id.into_inner(), req.is_available)
        .await?;
    Ok(HttpResponse::Ok())
}

#[delete("/v1/table/{id}")]
/// remove a table from the floor plan
pub(crate) async fn delete_table(
    id: web::Path<i64>,
    data: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let affected = data.gateway().delete_table(id.into_inner()).await?;
    if affected == 0 {
        return Err(ApiError::ResourceNotFound);
    }
    Ok(HttpResponse::Ok())
}
