use actix_web::{get, patch, post, web, HttpRequest, HttpResponse, Responder};
use chrono::Duration;

use crate::server::controller::error::ApiError;
use crate::server::floorplan::rules::{self, Verdict};
use crate::server::floorplan::HOLD_WINDOW_MINUTES;
use crate::server::gateway::Gateway;
use crate::server::model::booking::{
    BookingView, CreateBookingRequest, CreateBookingResponse, GetBookingsResponse, NewBooking,
    PatchBookingRequest,
};
use crate::server::model::CommonRequestParams;
use crate::server::state::AppState;
use crate::server::util::time;

#[post("/v1/table/{id}/bookings")]
/// book a table for a party
pub(crate) async fn post_booking(
    id: web::Path<i64>,
    req: web::Json<CreateBookingRequest>,
    data: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    if req.party_size <= 0 {
        return Err(ApiError::BadRequest);
    }
    let table_id = id.into_inner();
    let table = data
        .gateway()
        .fetch_table(table_id)
        .await?
        .ok_or(ApiError::ResourceNotFound)?;

    // the client ran this check already; repeat it against the stored record
    if let Verdict::Reject(reason) = rules::evaluate(&table, req.party_size) {
        return Ok(web::Json(CreateBookingResponse {
            booking_id: None,
            hold_minutes: None,
            message: reason.to_string(),
        }));
    }

    let booked_at = time::helper::get_utc_now();
    let booking = NewBooking {
        user_id: req.user_id,
        restaurant_id: req.restaurant_id,
        table_id,
        party_size: req.party_size,
        booked_at,
        expires_at: booked_at + Duration::minutes(HOLD_WINDOW_MINUTES),
    };
    match data.gateway().create_booking(&booking).await? {
        Some(created) => Ok(web::Json(CreateBookingResponse {
            booking_id: Some(created.id),
            hold_minutes: Some(HOLD_WINDOW_MINUTES),
            message: format!("table held for {} minutes", HOLD_WINDOW_MINUTES),
        })),
        None => Err(ApiError::TableTaken),
    }
}

#[get("/v1/restaurant/{id}/bookings")]
/// bookings of one restaurant, newest first
pub(crate) async fn get_bookings(
    id: web::Path<i64>,
    req: HttpRequest,
    data: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let queries = web::Query::<CommonRequestParams>::from_query(req.query_string())
        .map_err(|_| ApiError::BadRequest)?;
    let CommonRequestParams { page, page_size } = queries.into_inner();
    let (page, page_size) = (page.unwrap_or(0) as i64, page_size.unwrap_or(20) as i64);

    let bookings = data
        .gateway()
        .list_bookings(id.into_inner(), page * page_size, page_size)
        .await?;
    Ok(web::Json(GetBookingsResponse {
        bookings: bookings.iter().map(BookingView::from).collect(),
    }))
}

#[patch("/v1/booking/{id}")]
/// owner accepts or turns down a booking request
pub(crate) async fn patch_booking(
    id: web::Path<i64>,
    req: web::Json<PatchBookingRequest>,
    data: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let affected = data
        .gateway()
        .set_booking_approval(id.into_inner(), req.approve)
        .await?;
    if affected == 0 {
        return Err(ApiError::ResourceNotFound);
    }
    Ok(HttpResponse::Ok())
}
