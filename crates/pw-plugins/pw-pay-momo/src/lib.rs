//! # pw-pay-momo
//!
//! MoMo e-wallet implementation of `PaymentGateway`.
//!
//! Both directions are authenticated the same way: the fields are joined as
//! `key=value` pairs in alphabetical key order with `&`, and the string is
//! signed with HMAC-SHA256 under the partner's secret key (lower-case hex).

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use pw_core::error::{AppError, Result};
use pw_core::models::{PaymentLink, PaymentNotification, PaymentOrder};
use pw_core::traits::PaymentGateway;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Partner credentials and callback URLs.
#[derive(Debug)]
pub struct MomoConfig {
    /// e.g. `https://test-payment.momo.vn/v2/gateway/api/create`
    pub endpoint: String,
    pub partner_code: String,
    pub access_key: String,
    pub secret_key: SecretString,
    /// Where the buyer lands after paying
    pub redirect_url: String,
    /// Where MoMo posts the IPN
    pub ipn_url: String,
    pub request_type: String,
    pub lang: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePaymentRequest<'a> {
    partner_code: &'a str,
    request_id: &'a str,
    amount: i64,
    order_id: &'a str,
    order_info: &'a str,
    redirect_url: &'a str,
    ipn_url: &'a str,
    lang: &'a str,
    request_type: &'a str,
    extra_data: &'a str,
    signature: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePaymentResponse {
    result_code: i32,
    message: String,
    pay_url: Option<String>,
    deeplink: Option<String>,
}

pub struct MomoGateway {
    config: MomoConfig,
    client: reqwest::Client,
}

impl MomoGateway {
    pub fn new(config: MomoConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn sign(&self, raw: &str) -> String {
        sign(self.config.secret_key.expose_secret().as_bytes(), raw)
    }

    /// Canonical string for the create-payment request.
    fn create_signature_payload(&self, order: &PaymentOrder) -> String {
        format!(
            "accessKey={}&amount={}&extraData={}&ipnUrl={}&orderId={}&orderInfo={}&partnerCode={}&redirectUrl={}&requestId={}&requestType={}",
            self.config.access_key,
            order.amount,
            order.extra_data,
            self.config.ipn_url,
            order.order_id,
            order.order_info,
            self.config.partner_code,
            self.config.redirect_url,
            order.request_id,
            self.config.request_type,
        )
    }

    /// Canonical string for an incoming notification.
    fn notification_signature_payload(&self, n: &PaymentNotification) -> String {
        format!(
            "accessKey={}&amount={}&extraData={}&message={}&orderId={}&orderInfo={}&orderType={}&partnerCode={}&payType={}&requestId={}&responseTime={}&resultCode={}&transId={}",
            self.config.access_key,
            n.amount,
            n.extra_data,
            n.message,
            n.order_id,
            n.order_info,
            n.order_type,
            n.partner_code,
            n.pay_type,
            n.request_id,
            n.response_time,
            n.result_code,
            n.trans_id,
        )
    }
}

/// HMAC-SHA256 of `raw` under `key`, lower-case hex.
pub fn sign(key: &[u8], raw: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(raw.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time check of a hex signature.
pub fn verify(key: &[u8], raw: &str, signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(raw.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

#[async_trait]
impl PaymentGateway for MomoGateway {
    async fn create_payment(&self, order: PaymentOrder) -> Result<PaymentLink> {
        let signature = self.sign(&self.create_signature_payload(&order));
        let body = CreatePaymentRequest {
            partner_code: &self.config.partner_code,
            request_id: &order.request_id,
            amount: order.amount,
            order_id: &order.order_id,
            order_info: &order.order_info,
            redirect_url: &self.config.redirect_url,
            ipn_url: &self.config.ipn_url,
            lang: &self.config.lang,
            request_type: &self.config.request_type,
            extra_data: &order.extra_data,
            signature,
        };

        let response: CreatePaymentResponse = self
            .client
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                log::error!("momo create request for {} failed: {e}", order.order_id);
                AppError::Gateway("payment gateway unreachable".into())
            })?
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("unexpected gateway response: {e}")))?;

        if response.result_code != 0 {
            log::warn!(
                "momo rejected order {} (resultCode {}): {}",
                order.order_id,
                response.result_code,
                response.message
            );
            return Err(AppError::Gateway(response.message));
        }

        let pay_url = response
            .pay_url
            .ok_or_else(|| AppError::Gateway("gateway returned no payUrl".into()))?;
        Ok(PaymentLink {
            pay_url,
            deeplink: response.deeplink,
        })
    }

    fn verify_notification(&self, notification: &PaymentNotification) -> bool {
        if notification.partner_code != self.config.partner_code {
            return false;
        }
        verify(
            self.config.secret_key.expose_secret().as_bytes(),
            &self.notification_signature_payload(notification),
            &notification.signature,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> MomoGateway {
        MomoGateway::new(MomoConfig {
            endpoint: "http://127.0.0.1:9/create".into(),
            partner_code: "MOMO".into(),
            access_key: "F8BBA842ECF85".into(),
            secret_key: SecretString::from("K951B6PE1waDMi640xX08PD3vg6EkVlz".to_string()),
            redirect_url: "https://pawster.local/pro/done".into(),
            ipn_url: "https://pawster.local/api/payments/momo/ipn".into(),
            request_type: "captureWallet".into(),
            lang: "vi".into(),
        })
    }

    fn notification(gw: &MomoGateway) -> PaymentNotification {
        let mut n = PaymentNotification {
            partner_code: "MOMO".into(),
            order_id: "PAWSTER-1".into(),
            request_id: "req-1".into(),
            amount: 49_000,
            order_info: "PawSter Pro".into(),
            order_type: "momo_wallet".into(),
            trans_id: 4_088_878_653,
            result_code: 0,
            message: "Successful.".into(),
            pay_type: "qr".into(),
            response_time: 1_721_720_663_942,
            extra_data: String::new(),
            signature: String::new(),
        };
        n.signature = gw.sign(&gw.notification_signature_payload(&n));
        n
    }

    #[test]
    fn hmac_matches_rfc4231_vector() {
        assert_eq!(
            sign(b"Jefe", "what do ya want for nothing?"),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn create_payload_is_alphabetical() {
        let gw = gateway();
        let payload = gw.create_signature_payload(&PaymentOrder {
            order_id: "PAWSTER-1".into(),
            request_id: "req-1".into(),
            amount: 49_000,
            order_info: "PawSter Pro".into(),
            extra_data: String::new(),
        });
        assert_eq!(
            payload,
            "accessKey=F8BBA842ECF85&amount=49000&extraData=&ipnUrl=https://pawster.local/api/payments/momo/ipn\
             &orderId=PAWSTER-1&orderInfo=PawSter Pro&partnerCode=MOMO&redirectUrl=https://pawster.local/pro/done\
             &requestId=req-1&requestType=captureWallet"
        );
    }

    #[test]
    fn signed_notification_verifies() {
        let gw = gateway();
        assert!(gw.verify_notification(&notification(&gw)));
    }

    #[test]
    fn tampered_notification_is_rejected() {
        let gw = gateway();
        let mut n = notification(&gw);
        n.amount = 1;
        assert!(!gw.verify_notification(&n));

        let mut n = notification(&gw);
        n.signature = "zz-not-hex".into();
        assert!(!gw.verify_notification(&n));

        let mut n = notification(&gw);
        n.partner_code = "OTHER".into();
        assert!(!gw.verify_notification(&n));
    }

    #[tokio::test]
    async fn unreachable_gateway_is_a_gateway_error() {
        let err = gateway()
            .create_payment(PaymentOrder {
                order_id: "PAWSTER-2".into(),
                request_id: "req-2".into(),
                amount: 49_000,
                order_info: "PawSter Pro".into(),
                extra_data: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Gateway(_)));
    }
}
