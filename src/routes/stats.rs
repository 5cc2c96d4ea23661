use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::repo::stats::{collect_statistics, Statistics};
use crate::state::AppState;

pub async fn get_statistics(State(state): State<AppState>) -> AppResult<Json<Statistics>> {
    let mut conn = state.db()?;
    let stats = collect_statistics(&mut conn)?;
    Ok(Json(stats))
}
