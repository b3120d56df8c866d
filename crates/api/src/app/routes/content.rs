use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    routing::{get, post},
};
use chrono::Utc;
use uuid::Uuid;

use sitegate_auth::permissions::content;
use sitegate_core::{DomainError, Failure};

use crate::app::dto::{CreatePostRequest, JsonBody, PostView};
use crate::app::errors::ApiResponse;
use crate::app::routes::parse_id;
use crate::app::services::AppServices;
use crate::authz::authorize;
use crate::context::RequestSession;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_published).post(create_post))
        .route("/:id", get(get_published))
        .route("/:id/publish", post(publish_post))
}

/// Published posts, newest id first. Public.
pub async fn list_published(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResponse<Vec<PostView>> {
    services
        .content
        .list()
        .map(|posts| {
            let mut posts: Vec<_> = posts.into_iter().filter(|p| p.published).collect();
            posts.reverse();
            posts
        })
        .into()
}

/// Drafts are indistinguishable from missing posts here.
pub async fn get_published(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResponse<PostView> {
    let result = parse_id(&id, "post").and_then(|id| {
        services
            .content
            .get(&id)?
            .filter(|post| post.published)
            .ok_or_else(|| DomainError::not_found("Post not found").into())
    });
    result.into()
}

pub async fn create_post(
    Extension(services): Extension<Arc<AppServices>>,
    session: RequestSession,
    body: JsonBody<CreatePostRequest>,
) -> ApiResponse<PostView> {
    let result = (|| {
        let author = authorize(&services.gate, &session, &content::WRITE)?.user_id();
        let req = body.validated()?;

        let post = PostView {
            id: Uuid::now_v7(),
            title: req.title.trim().to_string(),
            body: req.body,
            author,
            published: false,
            created_at: Utc::now(),
            published_at: None,
        };
        services.content.insert(post.id, post.clone())?;
        tracing::info!(post_id = %post.id, author = %author, "post drafted");
        Ok::<_, Failure>(post)
    })();
    ApiResponse::from(result).created()
}

/// Publishing an already published post is a `CONFLICT`.
pub async fn publish_post(
    Extension(services): Extension<Arc<AppServices>>,
    session: RequestSession,
    Path(id): Path<String>,
) -> ApiResponse<PostView> {
    let result = (|| {
        authorize(&services.gate, &session, &content::PUBLISH)?;
        let id = parse_id(&id, "post")?;

        services
            .content
            .update(&id, |post| {
                if post.published {
                    return Err(DomainError::conflict("Post is already published").into());
                }
                post.published = true;
                post.published_at = Some(Utc::now());
                Ok(post.clone())
            })?
            .ok_or_else(|| Failure::from(DomainError::not_found("Post not found")))
    })();
    result.into()
}
