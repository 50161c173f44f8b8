use axum::{
    extract::{Path, State},
    response::Html,
};
use minijinja::context;

use super::parse_document_id;
use crate::errors::Result;
use crate::state::AppState;

/// GET /
pub async fn index(State(state): State<AppState>) -> Result<Html<String>> {
    state.views.render(
        "index.html",
        context! { max_upload_size_mb => state.config.server.max_upload_size_mb },
    )
}

/// GET /chat/:doc_id
pub async fn chat_page(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Result<Html<String>> {
    let doc_id = parse_document_id(&doc_id)?;
    state
        .views
        .render("chat.html", context! { doc_id => doc_id.to_string() })
}
