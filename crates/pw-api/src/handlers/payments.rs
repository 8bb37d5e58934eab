use actix_web::{web, HttpResponse};
use chrono::Utc;
use pw_core::error::AppError;
use pw_core::mail;
use pw_core::models::{Payment, PaymentNotification, PaymentOrder, PaymentStatus};
use pw_core::pro;
use pw_core::traits::PaymentRepo;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extractors::AuthUser;
use crate::response::{created, ok, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    /// Plan length: 1, 3 or 12
    pub months: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub order_id: String,
    pub amount: i64,
    pub months: u32,
    pub pay_url: String,
    pub deeplink: Option<String>,
}

/// Opens a MoMo checkout for a Pro plan.
pub async fn create_momo_payment(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    body: web::Json<CreatePaymentRequest>,
) -> ApiResult {
    let months = body.months;
    let amount = pro::plan_amount(months, state.config.pro_monthly_price)?;

    // 1. Ask the gateway first; nothing is stored if it refuses
    let order = PaymentOrder {
        order_id: format!("PAWSTER-{}", Uuid::now_v7()),
        request_id: Uuid::now_v7().to_string(),
        amount,
        order_info: format!("PawSter Pro {months} month(s) for @{}", user.username),
        extra_data: String::new(),
    };
    let link = state.payments.create_payment(order.clone()).await?;

    // 2. Track it until the IPN arrives
    state
        .repo
        .create_payment(Payment {
            id: Uuid::now_v7(),
            user_id: user.id,
            order_id: order.order_id.clone(),
            request_id: order.request_id,
            amount,
            plan_months: months,
            status: PaymentStatus::Pending,
            trans_id: None,
            created_at: Utc::now(),
            paid_at: None,
        })
        .await?;
    log::info!("@{} opened order {} ({amount} VND)", user.username, order.order_id);

    Ok(created(CreatePaymentResponse {
        order_id: order.order_id,
        amount,
        months,
        pay_url: link.pay_url,
        deeplink: link.deeplink,
    }))
}

/// Gateway callback. Unauthenticated; trusted only through its signature.
pub async fn momo_ipn(
    state: web::Data<AppState>,
    body: web::Json<PaymentNotification>,
) -> ApiResult {
    let notification = body.into_inner();

    // 1. Authenticity
    if !state.payments.verify_notification(&notification) {
        log::warn!("rejected IPN for {} with a bad signature", notification.order_id);
        return Err(AppError::validation("invalid signature").into());
    }

    // 2. Known order?
    let payment = state
        .repo
        .get_payment(&notification.order_id)
        .await?
        .ok_or_else(|| AppError::not_found("Payment", &notification.order_id))?;

    // 3. Settle
    if notification.result_code == 0 && notification.amount == payment.amount {
        let completed = state
            .repo
            .complete_payment(&payment.order_id, notification.trans_id, Utc::now())
            .await?;
        match completed {
            Some(user) => {
                if let Some(expiry) = user.pro_expiry {
                    let receipt = mail::pro_receipt(&user, &payment, expiry);
                    if let Err(e) = state.mailer.send(receipt).await {
                        log::warn!("receipt mail to {} failed: {e}", user.email);
                    }
                }
            }
            None => log::info!("IPN replay for {} ignored", payment.order_id),
        }
    } else {
        log::warn!(
            "order {} failed: resultCode {} ({}), amount {} of {}",
            payment.order_id,
            notification.result_code,
            notification.message,
            notification.amount,
            payment.amount
        );
        state
            .repo
            .fail_payment(&payment.order_id, notification.trans_id)
            .await?;
    }

    Ok(HttpResponse::NoContent().finish())
}

/// Lets the buyer (or an admin) poll an order.
pub async fn get_payment(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<String>,
) -> ApiResult {
    let order_id = path.into_inner();
    let payment = state
        .repo
        .get_payment(&order_id)
        .await?
        .ok_or_else(|| AppError::not_found("Payment", &order_id))?;
    if payment.user_id != user.id && !user.is_admin {
        return Err(AppError::Forbidden("not your payment".into()).into());
    }
    Ok(ok(payment))
}
