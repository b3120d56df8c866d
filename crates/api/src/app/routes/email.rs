use std::sync::Arc;

use axum::{Router, extract::Extension, routing::post};

use sitegate_auth::permissions::email;
use sitegate_core::{DomainError, Failure};

use crate::app::dto::{JsonBody, SendEmailRequest};
use crate::app::errors::ApiResponse;
use crate::app::services::AppServices;
use crate::authz::authorize;
use crate::context::RequestSession;
use crate::mailer::{EmailMessage, EmailReceipt, MailError};

pub fn router() -> Router {
    Router::new().route("/", post(send_email))
}

/// Send an email on behalf of the signed-in admin. Replies go to the
/// sender's address when the session carries one.
pub async fn send_email(
    Extension(services): Extension<Arc<AppServices>>,
    session: RequestSession,
    body: JsonBody<SendEmailRequest>,
) -> ApiResponse<EmailReceipt> {
    let result = async {
        let sender = authorize(&services.gate, &session, &email::SEND)?;
        let req = body.validated()?;

        let message = EmailMessage {
            to: req.to.trim().to_string(),
            subject: req.subject,
            body: req.body,
            reply_to: sender.email().map(str::to_string),
        };
        let receipt = services.mailer.send(message).await.map_err(mail_failure)?;
        tracing::info!(receipt = %receipt.id, sender = %sender.user_id(), "email sent");
        Ok::<_, Failure>(receipt)
    }
    .await;
    result.into()
}

pub(crate) fn mail_failure(err: MailError) -> Failure {
    match err {
        MailError::Rejected(reason) => {
            tracing::info!(reason = %reason, "mail provider rejected message");
            DomainError::bad_request("The email could not be sent").into()
        }
        unavailable @ MailError::Unavailable(_) => Failure::internal(unavailable),
    }
}
