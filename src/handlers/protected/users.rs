use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{parse_id, ListParams};
use crate::app::AppState;
use crate::domain::Paginated;
use crate::middleware::{ApiResponse, ApiResult, RequestContext};
use crate::modules::users::{CreateUser, DeleteUser, GetUser, ListUsers, UpdateUser, User, UserChanges};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub roles: Option<Vec<String>>,
}

/// POST /api/users
pub async fn create(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<User> {
    let scope = ctx.scope()?;
    let Json(body) = payload?;

    let user = state
        .mediator
        .send(CreateUser {
            tenant_id: scope.tenant_id,
            email: body.email,
            password: body.password,
            first_name: body.first_name,
            last_name: body.last_name,
            roles: body.roles,
        })
        .await?;

    Ok(ApiResponse::created(user))
}

/// GET /api/users?page&limit&search
pub async fn list(
    State(state): State<AppState>,
    ctx: RequestContext,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Paginated<User>> {
    let scope = ctx.scope()?;
    let Query(params) = params?;

    let page = state
        .mediator
        .ask(ListUsers {
            tenant_id: scope.tenant_id,
            page: params.page(),
            search: params.search,
        })
        .await?;

    Ok(ApiResponse::success(page))
}

/// GET /api/users/:id
pub async fn get(State(state): State<AppState>, ctx: RequestContext, Path(id): Path<String>) -> ApiResult<User> {
    let scope = ctx.scope()?;
    let id = parse_id(&id)?;

    let user = state
        .mediator
        .ask(GetUser {
            tenant_id: scope.tenant_id,
            id,
        })
        .await?;

    Ok(ApiResponse::success(user))
}

/// PATCH /api/users/:id
pub async fn update(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    payload: Result<Json<UserChanges>, JsonRejection>,
) -> ApiResult<User> {
    let scope = ctx.scope()?;
    let id = parse_id(&id)?;
    let Json(changes) = payload?;

    let user = state
        .mediator
        .send(UpdateUser {
            tenant_id: scope.tenant_id,
            id,
            changes,
        })
        .await?;

    Ok(ApiResponse::success(user))
}

/// DELETE /api/users/:id - admin only
pub async fn delete(State(state): State<AppState>, ctx: RequestContext, Path(id): Path<String>) -> ApiResult<()> {
    let scope = ctx.scope()?;
    let id = parse_id(&id)?;

    state
        .mediator
        .send(DeleteUser {
            tenant_id: scope.tenant_id,
            id,
        })
        .await?;

    Ok(ApiResponse::no_content())
}
