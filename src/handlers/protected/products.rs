use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{parse_id, ListParams};
use crate::app::AppState;
use crate::domain::Paginated;
use crate::middleware::{ApiResponse, ApiResult, RequestContext};
use crate::modules::products::{
    CreateProduct, DeleteProduct, GetProduct, ListProducts, Product, ProductChanges, ProductFilter, UpdateProduct,
};

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// POST /api/products
pub async fn create(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> ApiResult<Product> {
    let scope = ctx.scope()?;
    let Json(body) = payload?;

    let product = state
        .mediator
        .send(CreateProduct {
            tenant_id: scope.tenant_id,
            user_id: scope.user_id,
            name: body.name,
            description: body.description,
            tags: body.tags,
        })
        .await?;

    Ok(ApiResponse::created(product))
}

/// GET /api/products?page&limit&search&isActive
pub async fn list(
    State(state): State<AppState>,
    ctx: RequestContext,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Paginated<Product>> {
    let scope = ctx.scope()?;
    let Query(params) = params?;

    let page = state
        .mediator
        .ask(ListProducts {
            tenant_id: scope.tenant_id,
            page: params.page(),
            filter: ProductFilter {
                search: params.search,
                is_active: params.is_active,
            },
        })
        .await?;

    Ok(ApiResponse::success(page))
}

/// GET /api/products/:id
pub async fn get(State(state): State<AppState>, ctx: RequestContext, Path(id): Path<String>) -> ApiResult<Product> {
    let scope = ctx.scope()?;
    let id = parse_id(&id)?;

    let product = state
        .mediator
        .ask(GetProduct {
            tenant_id: scope.tenant_id,
            id,
        })
        .await?;

    Ok(ApiResponse::success(product))
}

/// PATCH /api/products/:id
pub async fn update(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    payload: Result<Json<ProductChanges>, JsonRejection>,
) -> ApiResult<Product> {
    let scope = ctx.scope()?;
    let id = parse_id(&id)?;
    let Json(changes) = payload?;

    let product = state
        .mediator
        .send(UpdateProduct {
            tenant_id: scope.tenant_id,
            user_id: scope.user_id,
            id,
            changes,
        })
        .await?;

    Ok(ApiResponse::success(product))
}

/// DELETE /api/products/:id - admin only
pub async fn delete(State(state): State<AppState>, ctx: RequestContext, Path(id): Path<String>) -> ApiResult<()> {
    let scope = ctx.scope()?;
    let id = parse_id(&id)?;

    state
        .mediator
        .send(DeleteProduct {
            tenant_id: scope.tenant_id,
            user_id: scope.user_id,
            id,
        })
        .await?;

    Ok(ApiResponse::no_content())
}
