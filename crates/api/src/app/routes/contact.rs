//! Public contact form.

use std::sync::Arc;

use axum::{Router, extract::Extension, http::HeaderMap, routing::post};
use chrono::Utc;
use uuid::Uuid;

use sitegate_auth::permissions::contact;
use sitegate_core::{Failure, Validate};

use crate::app::dto::{ContactRequest, ContactView, JsonBody};
use crate::app::errors::ApiResponse;
use crate::app::services::AppServices;
use crate::authz::authorize;
use crate::context::RequestSession;
use crate::keys::build_scoped_key;
use crate::limiter::enforce;
use crate::mailer::EmailMessage;

pub const CONTACT_SCOPE: &str = "contact";

pub fn router() -> Router {
    Router::new().route("/", post(submit).get(list_submissions))
}

/// Accept a submission from anyone.
///
/// Rate limited per client and submitter email before validation runs. A
/// stored submission is accepted even when forwarding it by mail fails.
pub async fn submit(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    body: JsonBody<ContactRequest>,
) -> ApiResponse<ContactView> {
    let result = async {
        let req = body.into_inner()?;
        let key = build_scoped_key(
            &services.rate_limit_namespace,
            CONTACT_SCOPE,
            &headers,
            [req.email.trim().to_ascii_lowercase()],
        );
        enforce(services.limiter.as_ref(), &key).await?;
        req.validate()?;

        let submission = ContactView {
            id: Uuid::now_v7(),
            name: req.name.trim().to_string(),
            email: req.email.trim().to_string(),
            message: req.message,
            received_at: Utc::now(),
        };
        services.inbox.insert(submission.id, submission.clone())?;

        let notification = EmailMessage {
            to: services.contact_inbox.clone(),
            subject: format!("Contact form: {}", submission.name),
            body: submission.message.clone(),
            reply_to: Some(submission.email.clone()),
        };
        if let Err(e) = services.mailer.send(notification).await {
            tracing::warn!(
                error = %e,
                submission = %submission.id,
                "contact notification not delivered"
            );
        }
        Ok::<_, Failure>(submission)
    }
    .await;
    ApiResponse::from(result).created()
}

pub async fn list_submissions(
    Extension(services): Extension<Arc<AppServices>>,
    session: RequestSession,
) -> ApiResponse<Vec<ContactView>> {
    authorize(&services.gate, &session, &contact::READ)
        .and_then(|_| services.inbox.list())
        .into()
}
