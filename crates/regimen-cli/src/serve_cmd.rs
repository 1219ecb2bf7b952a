use std::collections::HashMap;
use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use regimen_core::definition::get_plan_with_slots;
use regimen_core::progress::{MyPlan, PlanTotals, SlotRequest, resolve_my_plan};
use regimen_core::workout::{WorkoutActionError, complete_workout, start_workout};
use regimen_db::models::{Plan, PlanWorkout};
use regimen_db::queries::{plan_workouts, plans as plan_db};

/// Header carrying the caller's user ID.
pub const USER_ID_HEADER: &str = "x-user-id";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: msg.into(),
        }
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: msg.into(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        tracing::error!(error = %format!("{err:#}"), "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
        }
    }
}

impl From<WorkoutActionError> for AppError {
    fn from(err: WorkoutActionError) -> Self {
        match err {
            WorkoutActionError::SlotNotFound { .. } => Self::not_found(err.to_string()),
            WorkoutActionError::NotAssigned { .. } => Self::forbidden(err.to_string()),
            WorkoutActionError::RestDay { .. } => Self::conflict(err.to_string()),
            WorkoutActionError::InvalidTransition { .. } => Self::conflict(err.to_string()),
            WorkoutActionError::Database(e) => Self::internal(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct PlanSummaryResponse {
    #[serde(flatten)]
    pub plan: Plan,
    pub totals: PlanTotals,
}

#[derive(Debug, Serialize)]
pub struct PlanDetailResponse {
    #[serde(flatten)]
    pub plan: Plan,
    pub totals: PlanTotals,
    pub slots: Vec<PlanWorkout>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(pool: PgPool) -> Router {
    Router::new()
        .route("/api/customer/plans/my-plan", get(my_plan))
        .route(
            "/api/customer/plans/{plan_id}/workouts/{plan_workout_id}/start",
            post(start_plan_workout),
        )
        .route(
            "/api/customer/plans/{plan_id}/workouts/{plan_workout_id}/complete",
            post(complete_plan_workout),
        )
        .route("/api/plans", get(list_plans))
        .route("/api/plans/{id}", get(get_plan_detail))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(pool)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(pool: PgPool, bind: &str, port: u16) -> Result<()> {
    let app = build_router(pool);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("regimen serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("regimen serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Read the caller's user ID from the `x-user-id` header.
fn caller_id(headers: &HeaderMap) -> Result<Uuid, AppError> {
    let raw = headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| AppError::unauthorized(format!("missing {USER_ID_HEADER} header")))?;
    raw.to_str()
        .ok()
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .ok_or_else(|| AppError::unauthorized(format!("invalid {USER_ID_HEADER} header")))
}

async fn my_plan(
    State(pool): State<PgPool>,
    headers: HeaderMap,
    query: Result<Query<SlotRequest>, QueryRejection>,
) -> Result<axum::response::Response, AppError> {
    let user_id = caller_id(&headers)?;
    let Query(request) = query.map_err(|e| AppError::bad_request(e.body_text()))?;

    let today = Utc::now().date_naive();
    let result = resolve_my_plan(&pool, user_id, today, request)
        .await
        .map_err(AppError::internal)?;

    match result {
        MyPlan::NoPlanAssigned => Ok(Json(serde_json::json!({
            "message": "no plan assigned",
            "plan": null,
        }))
        .into_response()),
        MyPlan::Assigned(view) => Ok(Json(*view).into_response()),
    }
}

async fn start_plan_workout(
    State(pool): State<PgPool>,
    headers: HeaderMap,
    Path((plan_id, plan_workout_id)): Path<(Uuid, Uuid)>,
) -> Result<axum::response::Response, AppError> {
    let user_id = caller_id(&headers)?;
    let row = start_workout(&pool, user_id, plan_id, plan_workout_id, Utc::now()).await?;
    Ok(Json(row).into_response())
}

async fn complete_plan_workout(
    State(pool): State<PgPool>,
    headers: HeaderMap,
    Path((plan_id, plan_workout_id)): Path<(Uuid, Uuid)>,
) -> Result<axum::response::Response, AppError> {
    let user_id = caller_id(&headers)?;
    let row = complete_workout(&pool, user_id, plan_id, plan_workout_id, Utc::now()).await?;
    Ok(Json(row).into_response())
}

async fn list_plans(State(pool): State<PgPool>) -> Result<axum::response::Response, AppError> {
    let plans = plan_db::list_plans(&pool)
        .await
        .map_err(AppError::internal)?;

    let ids: Vec<Uuid> = plans.iter().map(|p| p.id).collect();
    let mut slots_by_plan: HashMap<Uuid, Vec<PlanWorkout>> = HashMap::new();
    for slot in plan_workouts::list_workouts_for_plans(&pool, &ids)
        .await
        .map_err(AppError::internal)?
    {
        slots_by_plan.entry(slot.plan_id).or_default().push(slot);
    }

    let results: Vec<PlanSummaryResponse> = plans
        .into_iter()
        .map(|plan| {
            let slots = slots_by_plan.remove(&plan.id).unwrap_or_default();
            PlanSummaryResponse {
                totals: PlanTotals::from_slots(plan.id, &slots),
                plan,
            }
        })
        .collect();

    Ok(Json(results).into_response())
}

async fn get_plan_detail(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    plan_db::get_plan(&pool, id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("plan {id} not found")))?;

    let (plan, slots) = get_plan_with_slots(&pool, id)
        .await
        .map_err(AppError::internal)?;

    Ok(Json(PlanDetailResponse {
        totals: PlanTotals::from_slots(plan.id, &slots),
        plan,
        slots,
    })
    .into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
