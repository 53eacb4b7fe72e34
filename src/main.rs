pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod orders;
pub mod purchases;
pub mod query;
pub mod reports;
pub mod validation;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use validator::Validate;

use auth::middleware::AuthenticatedShop;
use error::ApiError;
use models::{Category, CreateCategory, CreateProduct, Product, UpdateProduct};
use query::{QueryParams, QueryValidator, SQLQueryBuilder};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        create_product,
        get_product_by_id,
        update_product,
        delete_product,
    ),
    components(
        schemas(Product, CreateProduct, UpdateProduct, Category, CreateCategory)
    ),
    tags(
        (name = "products", description = "Product and stock management endpoints"),
        (name = "categories", description = "Category management endpoints")
    ),
    info(
        title = "Storefront API",
        version = "1.0.0",
        description = "RESTful API for small-business retail management"
    )
)]
struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub auth_service: auth::AuthService,
    pub order_service: orders::OrderService,
    pub purchase_service: purchases::PurchaseService,
    pub reports_repo: reports::ReportsRepository,
}

/// Handler for POST /api/products
/// Creates a new product in the authenticated shop
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProduct,
    responses(
        (status = 201, description = "Product created successfully", body = Product),
        (status = 400, description = "Invalid input data"),
        (status = 409, description = "Product name already exists in this shop"),
        (status = 500, description = "Internal server error")
    ),
    tag = "products"
)]
async fn create_product(
    State(state): State<AppState>,
    shop: AuthenticatedShop,
    Json(payload): Json<CreateProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    tracing::debug!("Creating new product: {}", payload.name);

    payload.validate()?;

    if db::check_duplicate_product(&state.db, shop.shop_id, &payload.name).await? {
        tracing::warn!("Attempt to create duplicate product: {}", payload.name);
        return Err(ApiError::Conflict {
            message: format!("Product with name '{}' already exists", payload.name),
        });
    }

    // Initial stock counts as received: total_stock starts equal
    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products
            (shop_id, category_id, name, cost_price, sell_price, floor_price,
             current_stock, total_stock, stock_threshold)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $8)
        RETURNING *
        "#,
    )
    .bind(shop.shop_id)
    .bind(payload.category_id)
    .bind(&payload.name)
    .bind(payload.cost_price)
    .bind(payload.sell_price)
    .bind(payload.floor_price)
    .bind(payload.current_stock)
    .bind(payload.stock_threshold)
    .fetch_one(&state.db)
    .await?;

    tracing::info!("Successfully created product with id: {}", product.id);
    Ok((StatusCode::CREATED, Json(product)))
}

/// Handler for GET /api/products
/// Supports search, category and price filtering, low-stock listing,
/// sorting, and pagination
async fn get_products_with_query(
    Query(params): Query<QueryParams>,
    State(state): State<AppState>,
    shop: AuthenticatedShop,
) -> Result<Json<Vec<Product>>, ApiError> {
    tracing::debug!("Fetching products with query parameters: {:?}", params);

    let validated =
        QueryValidator::validate(params).map_err(|e| ApiError::BadRequest(e.message))?;

    let mut builder = SQLQueryBuilder::new();
    builder.add_shop_filter(shop.shop_id);

    if let Some(search) = validated.search {
        builder.add_search_filter(&search);
    }
    if let Some(category_id) = validated.category_id {
        builder.add_category_filter(category_id);
    }
    builder.add_price_range(validated.min_price, validated.max_price);
    if validated.low_stock {
        builder.add_low_stock_filter();
    }

    if let Some(sort_field) = validated.sort_field {
        builder.set_sort(sort_field, validated.sort_order);
    }

    builder.set_pagination(validated.page, validated.limit);

    let (query_str, params) = builder.build();

    let mut query = sqlx::query_as::<_, Product>(&query_str);
    for param in params {
        query = query.bind(param);
    }

    let products = query.fetch_all(&state.db).await?;

    tracing::debug!("Query returned {} products", products.len());
    Ok(Json(products))
}

/// Handler for GET /api/products/:id
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product found", body = Product),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "products"
)]
async fn get_product_by_id(
    State(state): State<AppState>,
    shop: AuthenticatedShop,
    Path(id): Path<i32>,
) -> Result<Json<Product>, ApiError> {
    tracing::debug!("Fetching product with id: {}", id);

    let product =
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 AND shop_id = $2")
            .bind(id)
            .bind(shop.shop_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| ApiError::NotFound {
                resource: "Product".to_string(),
                id: id.to_string(),
            })?;

    Ok(Json(product))
}

/// Handler for PUT /api/products/:id
/// Updates an existing product; omitted fields keep their current values
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    request_body = UpdateProduct,
    responses(
        (status = 200, description = "Product updated successfully", body = Product),
        (status = 400, description = "Invalid input data"),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Product name already exists in this shop"),
        (status = 500, description = "Internal server error")
    ),
    tag = "products"
)]
async fn update_product(
    State(state): State<AppState>,
    shop: AuthenticatedShop,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProduct>,
) -> Result<Json<Product>, ApiError> {
    tracing::debug!("Updating product with id: {}", id);

    payload.validate()?;

    // The multi-step update (existence check, duplicate check, write) runs in
    // one transaction so no step observes another request's partial state
    let mut tx = state.db.begin().await?;

    let existing =
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 AND shop_id = $2")
            .bind(id)
            .bind(shop.shop_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::NotFound {
                resource: "Product".to_string(),
                id: id.to_string(),
            })?;

    if let Some(ref new_name) = payload.name {
        if new_name != &existing.name {
            let duplicate_exists: Option<bool> = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM products WHERE shop_id = $1 AND name = $2 AND id != $3)",
            )
            .bind(shop.shop_id)
            .bind(new_name)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

            if duplicate_exists.unwrap_or(false) {
                tracing::warn!("Attempt to rename product {} to duplicate name: {}", id, new_name);
                return Err(ApiError::Conflict {
                    message: format!("Product with name '{}' already exists", new_name),
                });
            }
        }
    }

    let new_floor = payload.floor_price.unwrap_or(existing.floor_price);
    let new_sell = payload.sell_price.unwrap_or(existing.sell_price);
    if new_floor > new_sell {
        return Err(ApiError::BadRequest(
            "Floor price must not exceed sell price".to_string(),
        ));
    }

    let updated_product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET category_id = $1,
            name = $2,
            cost_price = $3,
            sell_price = $4,
            floor_price = $5,
            current_stock = $6,
            stock_threshold = $7,
            updated_at = NOW()
        WHERE id = $8
        RETURNING *
        "#,
    )
    .bind(payload.category_id.or(existing.category_id))
    .bind(payload.name.unwrap_or(existing.name))
    .bind(payload.cost_price.unwrap_or(existing.cost_price))
    .bind(new_sell)
    .bind(new_floor)
    .bind(payload.current_stock.unwrap_or(existing.current_stock))
    .bind(payload.stock_threshold.unwrap_or(existing.stock_threshold))
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!("Successfully updated product with id: {}", id);
    Ok(Json(updated_product))
}

/// Handler for DELETE /api/products/:id
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted successfully"),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "products"
)]
async fn delete_product(
    State(state): State<AppState>,
    shop: AuthenticatedShop,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    tracing::debug!("Deleting product with id: {}", id);

    let result = sqlx::query("DELETE FROM products WHERE id = $1 AND shop_id = $2")
        .bind(id)
        .bind(shop.shop_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound {
            resource: "Product".to_string(),
            id: id.to_string(),
        });
    }

    tracing::info!("Successfully deleted product with id: {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Request body for the stocktake endpoint
#[derive(Debug, Deserialize, Validate)]
struct StocktakeRequest {
    #[validate(range(min = 0, message = "Stock must not be negative"))]
    current_stock: i32,
}

/// Handler for PUT /api/products/:id/stock
/// Stocktake escape hatch: overwrites current stock with a counted value
async fn set_product_stock(
    State(state): State<AppState>,
    shop: AuthenticatedShop,
    Path(id): Path<i32>,
    Json(payload): Json<StocktakeRequest>,
) -> Result<StatusCode, ApiError> {
    payload.validate()?;

    db::set_stock_level(&state.db, shop.shop_id, id, payload.current_stock).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /api/categories
async fn get_categories(
    State(state): State<AppState>,
    shop: AuthenticatedShop,
) -> Result<Json<Vec<Category>>, ApiError> {
    let categories =
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE shop_id = $1 ORDER BY name")
            .bind(shop.shop_id)
            .fetch_all(&state.db)
            .await?;

    Ok(Json(categories))
}

/// Handler for POST /api/categories
async fn create_category(
    State(state): State<AppState>,
    shop: AuthenticatedShop,
    Json(payload): Json<CreateCategory>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    payload.validate()?;

    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (shop_id, name) VALUES ($1, $2) RETURNING *",
    )
    .bind(shop.shop_id)
    .bind(&payload.name)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return ApiError::Conflict {
                    message: format!("Category with name '{}' already exists", payload.name),
                };
            }
        }
        ApiError::DatabaseError(e)
    })?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// Handler for DELETE /api/categories/:id
/// Products referencing the category fall back to uncategorized
async fn delete_category(
    State(state): State<AppState>,
    shop: AuthenticatedShop,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND shop_id = $2")
        .bind(id)
        .bind(shop.shop_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound {
            resource: "Category".to_string(),
            id: id.to_string(),
        });
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Creates and configures the application router
/// Wires all repositories and services, maps endpoints, adds CORS
pub fn create_router(db: PgPool, jwt_secret: String) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    let token_service = Arc::new(auth::TokenService::new(jwt_secret));
    let auth_service = auth::AuthService::new(
        auth::ShopRepository::new(db.clone()),
        auth::TokenRepository::new(db.clone()),
        token_service,
    );

    let order_service = orders::OrderService::new(
        orders::OrdersRepository::new(db.clone()),
        orders::OrderItemsRepository::new(db.clone()),
        orders::ProductRepository::new(db.clone()),
    );

    let purchase_service =
        purchases::PurchaseService::new(purchases::PurchasesRepository::new(db.clone()));

    let reports_repo = reports::ReportsRepository::new(db.clone());

    let state = AppState {
        db,
        auth_service,
        order_service,
        purchase_service,
        reports_repo,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Auth
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/refresh", post(auth::refresh_handler))
        .route("/api/auth/me", get(auth::me_handler))
        // Products
        .route("/api/products", post(create_product))
        .route("/api/products", get(get_products_with_query))
        .route("/api/products/:id", get(get_product_by_id))
        .route("/api/products/:id", put(update_product))
        .route("/api/products/:id", delete(delete_product))
        .route("/api/products/:id/stock", put(set_product_stock))
        // Categories
        .route("/api/categories", get(get_categories))
        .route("/api/categories", post(create_category))
        .route("/api/categories/:id", delete(delete_category))
        // Orders
        .route("/api/orders", post(orders::create_order_handler))
        .route("/api/orders", get(orders::get_order_history_handler))
        .route("/api/orders/preview", post(orders::preview_cart_handler))
        .route("/api/orders/:order_id", get(orders::get_order_by_id_handler))
        .route("/api/orders/:order_id", put(orders::edit_order_handler))
        .route("/api/orders/:order_id", delete(orders::delete_order_handler))
        // Purchase orders
        .route(
            "/api/purchase-orders",
            post(purchases::create_purchase_order_handler),
        )
        .route(
            "/api/purchase-orders",
            get(purchases::get_purchase_orders_handler),
        )
        .route(
            "/api/purchase-orders/:purchase_order_id",
            get(purchases::get_purchase_order_by_id_handler),
        )
        .route(
            "/api/purchase-orders/:purchase_order_id",
            delete(purchases::delete_purchase_order_handler),
        )
        // Reports
        .route("/api/reports/sales", get(reports::sales_summary_handler))
        .route(
            "/api/reports/top-products",
            get(reports::top_products_handler),
        )
        .route(
            "/api/reports/purchases",
            get(reports::purchase_summary_handler),
        )
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Storefront API - Starting...");

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");
    let jwt_secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in environment");
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&database_url)
        .await
        .expect("Failed to create database pool");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    let app = create_router(db_pool, jwt_secret);

    let addr = format!("{}:{}", host, port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Storefront API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await.expect("Server error");
}

#[cfg(test)]
mod tests;
