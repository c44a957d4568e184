use actix_web::{HttpRequest, HttpResponse, web};
use gateway_core::services::ActionKind;
use gateway_shared::dto::{CreatePostRequest, PostResponse};

use crate::middleware::auth::{BearerToken, RequestCaller, identify};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/posts
pub async fn create_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    token: BearerToken,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let RequestCaller { subject, caller } = identify(&state, &token, &req).await;
    state.guard.enforce(ActionKind::CreatePost, &subject).await?;

    let post = state.posts.submit(caller, &body.content).await?;

    tracing::info!(post_id = %post.id, author_id = %post.author_id, "Post created");

    Ok(HttpResponse::Created().json(PostResponse {
        id: post.id,
        author_id: post.author_id,
        content: post.content,
        created_at: post.created_at.to_rfc3339(),
    }))
}
