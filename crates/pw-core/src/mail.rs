//! Notification emails.

use chrono::{DateTime, Utc};
use html_escape::encode_text;

use crate::models::{Payment, User};

/// A single outbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub to_address: String,
    pub to_name: String,
    pub subject: String,
    pub html: String,
}

impl Email {
    fn to(user: &User, subject: impl Into<String>, html: String) -> Self {
        Self {
            to_address: user.email.clone(),
            to_name: display_name(user).to_string(),
            subject: subject.into(),
            html,
        }
    }
}

fn display_name(user: &User) -> &str {
    user.display_name.as_deref().unwrap_or(&user.username)
}

pub fn welcome(user: &User) -> Email {
    Email::to(
        user,
        "Welcome to PawSter!",
        format!(
            "<h1>Hi {}!</h1><p>Your account <b>@{}</b> is ready. Start sharing threads with your pack.</p>",
            encode_text(display_name(user)),
            encode_text(&user.username),
        ),
    )
}

/// Tells `requester` that `accepter` accepted their friend request.
pub fn friend_request_accepted(requester: &User, accepter: &User) -> Email {
    Email::to(
        requester,
        format!("{} accepted your friend request", accepter.username),
        format!(
            "<p>Hi {},</p><p><b>@{}</b> accepted your friend request. You are now friends on PawSter.</p>",
            encode_text(display_name(requester)),
            encode_text(&accepter.username),
        ),
    )
}

pub fn pro_receipt(user: &User, payment: &Payment, expiry: DateTime<Utc>) -> Email {
    Email::to(
        user,
        "Your PawSter Pro receipt",
        format!(
            "<p>Hi {},</p><p>We received {} VND for order <code>{}</code> ({} month(s) of Pro).</p>\
             <p>Your Pro membership is active until {}.</p>",
            encode_text(display_name(user)),
            payment.amount,
            encode_text(&payment.order_id),
            payment.plan_months,
            expiry.format("%Y-%m-%d %H:%M UTC"),
        ),
    )
}
