use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    routing::{delete, post},
};
use chrono::Utc;
use uuid::Uuid;

use sitegate_auth::permissions::media;
use sitegate_core::{DomainError, Failure};

use crate::app::dto::{JsonBody, MediaView, UploadMediaRequest};
use crate::app::errors::ApiResponse;
use crate::app::routes::parse_id;
use crate::app::services::AppServices;
use crate::authz::authorize;
use crate::context::RequestSession;

pub fn router() -> Router {
    Router::new()
        .route("/", post(upload_media))
        .route("/:id", delete(delete_media))
}

/// Register an uploaded asset. The bytes themselves go to object storage;
/// this records the validated metadata.
pub async fn upload_media(
    Extension(services): Extension<Arc<AppServices>>,
    session: RequestSession,
    body: JsonBody<UploadMediaRequest>,
) -> ApiResponse<MediaView> {
    let result = (|| {
        let uploader = authorize(&services.gate, &session, &media::UPLOAD)?.user_id();
        let req = body.validated()?;

        let asset = MediaView {
            id: Uuid::now_v7(),
            file_name: req.file_name,
            content_type: req.content_type,
            size_bytes: req.size_bytes,
            uploaded_by: uploader,
            uploaded_at: Utc::now(),
        };
        services.media.insert(asset.id, asset.clone())?;
        Ok::<_, Failure>(asset)
    })();
    ApiResponse::from(result).created()
}

pub async fn delete_media(
    Extension(services): Extension<Arc<AppServices>>,
    session: RequestSession,
    Path(id): Path<String>,
) -> ApiResponse<MediaView> {
    let result = (|| {
        let actor = authorize(&services.gate, &session, &media::DELETE)?.user_id();
        let id = parse_id(&id, "media")?;

        let removed = services
            .media
            .remove(&id)?
            .ok_or_else(|| DomainError::not_found("Media not found"))?;
        tracing::info!(media_id = %id, actor = %actor, "media deleted");
        Ok::<_, Failure>(removed)
    })();
    result.into()
}
