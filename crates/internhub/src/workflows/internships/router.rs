use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    ApplicationId, ApplicationRequest, Caller, InternshipId, InternshipUpdate, NewInternship,
    ProfileUpdate,
};
use super::repository::{InternshipRepository, ProfileRepository};
use super::service::ApplicationService;
use crate::http::envelope;

type SharedService<R, P> = State<Arc<ApplicationService<R, P>>>;

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

/// Router exposing the posting, application, and student profile endpoints.
pub fn internship_router<R, P>(service: Arc<ApplicationService<R, P>>) -> Router
where
    R: InternshipRepository + 'static,
    P: ProfileRepository + 'static,
{
    Router::new()
        .route(
            "/internships",
            get(list_postings_handler::<R, P>).post(create_posting_handler::<R, P>),
        )
        .route(
            "/internships/:internship_id",
            get(get_posting_handler::<R, P>)
                .put(update_posting_handler::<R, P>)
                .delete(deactivate_posting_handler::<R, P>),
        )
        .route(
            "/internships/:internship_id/apply",
            post(apply_handler::<R, P>),
        )
        .route(
            "/internships/:internship_id/applications",
            get(list_applications_handler::<R, P>),
        )
        .route(
            "/internships/:internship_id/applications/:application_id/status",
            patch(update_status_handler::<R, P>),
        )
        .route(
            "/internships/:internship_id/applications/:application_id/status/force",
            patch(force_status_handler::<R, P>),
        )
        .route(
            "/students/me/profile",
            get(my_profile_handler::<R, P>).put(upsert_profile_handler::<R, P>),
        )
        .route(
            "/students/me/applications",
            get(my_applications_handler::<R, P>),
        )
        .route(
            "/students/me/bookmarks/:internship_id",
            post(toggle_bookmark_handler::<R, P>),
        )
        .with_state(service)
}

fn bad_body(rejection: JsonRejection) -> Response {
    envelope::failure(StatusCode::BAD_REQUEST, rejection.body_text())
}

pub(crate) async fn apply_handler<R, P>(
    State(service): SharedService<R, P>,
    caller: Caller,
    Path(internship_id): Path<String>,
    payload: Option<Json<ApplicationRequest>>,
) -> Response
where
    R: InternshipRepository + 'static,
    P: ProfileRepository + 'static,
{
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    match service.apply(&caller, &InternshipId(internship_id), request) {
        Ok(receipt) => envelope::created("Application submitted successfully", receipt),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn list_applications_handler<R, P>(
    State(service): SharedService<R, P>,
    caller: Caller,
    Path(internship_id): Path<String>,
) -> Response
where
    R: InternshipRepository + 'static,
    P: ProfileRepository + 'static,
{
    match service.list_applications(&caller, &InternshipId(internship_id)) {
        Ok(applications) => envelope::ok(applications),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn update_status_handler<R, P>(
    State(service): SharedService<R, P>,
    caller: Caller,
    Path((internship_id, application_id)): Path<(String, String)>,
    payload: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Response
where
    R: InternshipRepository + 'static,
    P: ProfileRepository + 'static,
{
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_body(rejection),
    };

    match service.update_status(
        &caller,
        &InternshipId(internship_id),
        &ApplicationId(application_id),
        &request.status,
    ) {
        Ok(view) => envelope::ok_with_message("Application status updated", view),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn force_status_handler<R, P>(
    State(service): SharedService<R, P>,
    caller: Caller,
    Path((internship_id, application_id)): Path<(String, String)>,
    payload: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Response
where
    R: InternshipRepository + 'static,
    P: ProfileRepository + 'static,
{
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_body(rejection),
    };

    match service.force_status(
        &caller,
        &InternshipId(internship_id),
        &ApplicationId(application_id),
        &request.status,
    ) {
        Ok(view) => envelope::ok_with_message("Application status overridden", view),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn list_postings_handler<R, P>(
    State(service): SharedService<R, P>,
    query: Option<Query<PageQuery>>,
) -> Response
where
    R: InternshipRepository + 'static,
    P: ProfileRepository + 'static,
{
    let Query(query) = query.unwrap_or_default();
    match service.list_internships(query.page, query.limit) {
        Ok(page) => envelope::ok(page),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn create_posting_handler<R, P>(
    State(service): SharedService<R, P>,
    caller: Caller,
    payload: Result<Json<NewInternship>, JsonRejection>,
) -> Response
where
    R: InternshipRepository + 'static,
    P: ProfileRepository + 'static,
{
    let Json(posting) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_body(rejection),
    };

    match service.create_internship(&caller, posting) {
        Ok(view) => envelope::created("Internship created", view),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn get_posting_handler<R, P>(
    State(service): SharedService<R, P>,
    Path(internship_id): Path<String>,
) -> Response
where
    R: InternshipRepository + 'static,
    P: ProfileRepository + 'static,
{
    match service.get_internship(&InternshipId(internship_id)) {
        Ok(view) => envelope::ok(view),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn update_posting_handler<R, P>(
    State(service): SharedService<R, P>,
    caller: Caller,
    Path(internship_id): Path<String>,
    payload: Result<Json<InternshipUpdate>, JsonRejection>,
) -> Response
where
    R: InternshipRepository + 'static,
    P: ProfileRepository + 'static,
{
    let Json(update) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_body(rejection),
    };

    match service.update_internship(&caller, &InternshipId(internship_id), update) {
        Ok(view) => envelope::ok_with_message("Internship updated", view),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn deactivate_posting_handler<R, P>(
    State(service): SharedService<R, P>,
    caller: Caller,
    Path(internship_id): Path<String>,
) -> Response
where
    R: InternshipRepository + 'static,
    P: ProfileRepository + 'static,
{
    match service.deactivate_internship(&caller, &InternshipId(internship_id)) {
        Ok(view) => envelope::ok_with_message("Internship deactivated", view),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn my_profile_handler<R, P>(
    State(service): SharedService<R, P>,
    caller: Caller,
) -> Response
where
    R: InternshipRepository + 'static,
    P: ProfileRepository + 'static,
{
    match service.my_profile(&caller) {
        Ok(profile) => envelope::ok(profile),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn upsert_profile_handler<R, P>(
    State(service): SharedService<R, P>,
    caller: Caller,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Response
where
    R: InternshipRepository + 'static,
    P: ProfileRepository + 'static,
{
    let Json(update) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_body(rejection),
    };

    match service.upsert_profile(&caller, update) {
        Ok(profile) => envelope::ok_with_message("Profile saved", profile),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn my_applications_handler<R, P>(
    State(service): SharedService<R, P>,
    caller: Caller,
) -> Response
where
    R: InternshipRepository + 'static,
    P: ProfileRepository + 'static,
{
    match service.my_applications(&caller) {
        Ok(applications) => envelope::ok(applications),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn toggle_bookmark_handler<R, P>(
    State(service): SharedService<R, P>,
    caller: Caller,
    Path(internship_id): Path<String>,
) -> Response
where
    R: InternshipRepository + 'static,
    P: ProfileRepository + 'static,
{
    match service.toggle_bookmark(&caller, &InternshipId(internship_id)) {
        Ok(bookmarked) => envelope::ok(json!({ "bookmarked": bookmarked })),
        Err(err) => err.into_response(),
    }
}
