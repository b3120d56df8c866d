use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    routing::{get, put},
};
use chrono::Utc;

use sitegate_auth::permissions::users;
use sitegate_core::{Failure, UserId};

use crate::app::dto::{ChangeRoleRequest, CreateUserRequest, JsonBody, UserView};
use crate::app::errors::ApiResponse;
use crate::app::services::AppServices;
use crate::authz::authorize;
use crate::context::RequestSession;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id/role", put(change_role))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    session: RequestSession,
) -> ApiResponse<Vec<UserView>> {
    authorize(&services.gate, &session, &users::READ)
        .and_then(|_| services.users.list())
        .into()
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    session: RequestSession,
    body: JsonBody<CreateUserRequest>,
) -> ApiResponse<UserView> {
    let result = (|| {
        authorize(&services.gate, &session, &users::MANAGE)?;
        let req = body.validated()?;
        services
            .users
            .create(&req.email, &req.display_name, req.role, Utc::now())
    })();
    ApiResponse::from(result).created()
}

/// Role changes never apply to the caller's own account.
pub async fn change_role(
    Extension(services): Extension<Arc<AppServices>>,
    session: RequestSession,
    Path(id): Path<String>,
    body: JsonBody<ChangeRoleRequest>,
) -> ApiResponse<UserView> {
    let result = (|| {
        let actor = authorize(&services.gate, &session, &users::MANAGE)?.user_id();
        let id: UserId = id.trim().parse()?;
        let req = body.into_inner()?;

        let user = services.users.change_role(actor, id, req.role)?;
        tracing::info!(user_id = %id, role = %req.role, actor = %actor, "role changed");
        Ok::<_, Failure>(user)
    })();
    result.into()
}
