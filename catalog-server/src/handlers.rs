use actix_web::error::{InternalError, QueryPayloadError};
use actix_web::{web, HttpRequest, HttpResponse};
use catalog::query::{DEFAULT_LIMIT, DEFAULT_PAGE};
use catalog::{
    ensure_csv_upload, CatalogError, CatalogStore, IngestionPipeline, IngestionResult,
    QueryEngine, SearchParams,
};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Configure all API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(query_error))
        .route("/", web::get().to(health))
        .route("/upload", web::post().to(upload))
        .route("/products", web::get().to(list_products))
        .route("/products/search", web::get().to(search_products))
        .route("/products/{sku}", web::get().to(get_product));
}

// ── Helpers ─────────────────────────────────────────────────────────

fn ok_json<T: Serialize>(value: &T) -> HttpResponse {
    HttpResponse::Ok().json(value)
}

fn err_response(e: CatalogError) -> HttpResponse {
    match e {
        CatalogError::FileFormat(message) | CatalogError::QueryParameter(message) => {
            HttpResponse::BadRequest().json(serde_json::json!({ "error": message }))
        }
        CatalogError::NotFound { .. } => HttpResponse::NotFound().json(serde_json::json!({
            "error": e.to_string()
        })),
        _ => {
            log::error!("Internal error: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal server error"
            }))
        }
    }
}

/// Malformed query strings get the same JSON body as other parameter errors.
fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = err_response(CatalogError::QueryParameter(err.to_string()));
    InternalError::from_response(err, response).into()
}

// ── Health ──────────────────────────────────────────────────────────

async fn health() -> HttpResponse {
    ok_json(&serde_json::json!({
        "status": "healthy",
        "message": "Product Catalog API is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ── Upload ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct UploadQuery {
    filename: Option<String>,
}

#[derive(Serialize)]
struct UploadResponse {
    message: String,
    #[serde(flatten)]
    result: IngestionResult,
}

async fn upload(
    state: web::Data<AppState>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> HttpResponse {
    let filename = query.into_inner().filename.unwrap_or_default();
    if let Err(e) = ensure_csv_upload(&filename) {
        return err_response(e);
    }

    log::info!("Ingesting {filename} ({} bytes)", body.len());
    let ingested =
        web::block(move || IngestionPipeline::new(&state.catalog).ingest(&body)).await;

    match ingested {
        Ok(Ok(result)) => ok_json(&UploadResponse {
            message: result.summary(),
            result,
        }),
        Ok(Err(e)) => err_response(e),
        Err(e) => {
            log::error!("Ingestion worker failed: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal server error"
            }))
        }
    }
}

// ── Products ────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct PageQuery {
    page: Option<i64>,
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct SearchQuery {
    brand: Option<String>,
    color: Option<String>,
    #[serde(rename = "minPrice")]
    min_price: Option<f64>,
    #[serde(rename = "maxPrice")]
    max_price: Option<f64>,
    page: Option<i64>,
    limit: Option<i64>,
}

async fn list_products(state: web::Data<AppState>, query: web::Query<PageQuery>) -> HttpResponse {
    let page = query.page.unwrap_or(DEFAULT_PAGE);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    match QueryEngine::new(&state.catalog).list_page(page, limit) {
        Ok(v) => ok_json(&v),
        Err(e) => err_response(e),
    }
}

async fn search_products(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> HttpResponse {
    let query = query.into_inner();
    let params = SearchParams {
        brand: query.brand,
        color: query.color,
        min_price: query.min_price,
        max_price: query.max_price,
    };
    let page = query.page.unwrap_or(DEFAULT_PAGE);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    match QueryEngine::new(&state.catalog).search_page(&params, page, limit) {
        Ok(v) => ok_json(&v),
        Err(e) => err_response(e),
    }
}

async fn get_product(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let sku = path.into_inner();
    match state.catalog.get(&sku) {
        Ok(Some(product)) => ok_json(&product),
        Ok(None) => err_response(CatalogError::NotFound { sku }),
        Err(e) => err_response(e),
    }
}
