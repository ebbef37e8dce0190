use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use bar_optimizer::planner::{DEFAULT_MIN_RESIDUE, Planner};
use bar_optimizer::types::SavedLine;
use serde::{Deserialize, Serialize};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Deserialize, Serialize)]
struct PlanRequest {
    stock: f64,
    pieces: Vec<PieceRequest>,
    #[serde(default = "default_min_residue")]
    min_residue: f64,
}

#[derive(Deserialize, Serialize)]
struct PieceRequest {
    length: f64,
    #[serde(default = "default_qty")]
    qty: u32,
}

fn default_min_residue() -> f64 {
    DEFAULT_MIN_RESIDUE
}

fn default_qty() -> u32 {
    1
}

#[derive(Serialize)]
struct PlanResponse {
    lines: Vec<SavedLine>,
    bar_count: usize,
    waste_percent: f64,
    unplaced: Vec<f64>,
}

async fn plan(Json(req): Json<PlanRequest>) -> Result<Json<PlanResponse>, (StatusCode, String)> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /plan"
    );

    if req.stock <= 0.0 || !req.stock.is_finite() {
        return Err((
            StatusCode::BAD_REQUEST,
            "stock length must be positive".to_string(),
        ));
    }
    if req.min_residue < 0.0 || !req.min_residue.is_finite() {
        return Err((
            StatusCode::BAD_REQUEST,
            "min_residue must be non-negative".to_string(),
        ));
    }
    for p in &req.pieces {
        if p.length <= 0.0 || !p.length.is_finite() {
            return Err((
                StatusCode::BAD_REQUEST,
                "piece length must be positive".to_string(),
            ));
        }
        if p.qty == 0 {
            return Err((
                StatusCode::BAD_REQUEST,
                "piece quantity must be non-zero".to_string(),
            ));
        }
        if p.length > req.stock {
            return Err((
                StatusCode::BAD_REQUEST,
                format!(
                    "piece {} m does not fit in stock {} m",
                    p.length, req.stock
                ),
            ));
        }
    }

    let mut planner = Planner::new(req.min_residue);
    for p in &req.pieces {
        planner
            .add_pieces(p.length, p.qty)
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    }

    loop {
        let first = match planner.best_first_piece(req.stock) {
            Some(p) => p.id,
            None => break,
        };
        planner
            .start(req.stock, first)
            .and_then(|_| planner.auto_plan())
            .and_then(|_| planner.save_line())
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    }

    let unplaced: Vec<f64> = planner
        .inventory()
        .candidates_at_most(f64::INFINITY)
        .map(|p| p.length)
        .collect();

    let response = PlanResponse {
        lines: planner.saved_lines().to_vec(),
        bar_count: planner.saved_lines().len(),
        waste_percent: planner.total_waste_percent(),
        unplaced,
    };

    Ok(Json(response))
}

#[tokio::main]
async fn main() {
    let _sentry = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
        .expect("failed to open development.log");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let app = Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/plan", post(plan))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    eprintln!("Listening on {addr}");
    axum::serve(listener, app).await.unwrap();
}
