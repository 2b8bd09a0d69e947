use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::config::Config;

const GATEWAY_TIMEOUT_SECS: u64 = 10;

/// Response of `POST /epayment/initiate/`. The caller is redirected to
/// `payment_url`; `pidx` is the gateway's correlation id for the lookup call.
#[derive(Debug, Serialize, Deserialize)]
pub struct KhaltiInitiateResponse {
    pub pidx: String,
    pub payment_url: String,
    pub expires_at: Option<String>,
}

/// Response of `POST /epayment/lookup/`. `total_amount` is in paisa.
#[derive(Debug, Serialize, Deserialize)]
pub struct KhaltiLookupResponse {
    pub pidx: String,
    pub total_amount: i64,
    pub status: String,
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub refunded: bool,
}

pub struct KhaltiService;

impl KhaltiService {
    fn secret_key() -> Result<String, String> {
        Config::khalti_secret_key().ok_or_else(|| "Khalti secret key not configured".to_string())
    }

    fn client() -> Result<Client, String> {
        Client::builder()
            .timeout(Duration::from_secs(GATEWAY_TIMEOUT_SECS))
            .build()
            .map_err(|e| e.to_string())
    }

    /// Creates a hosted-payment session. `amount` is in rupees; Khalti expects paisa.
    pub async fn initiate(
        amount: i64,
        purchase_order_id: &str,
        purchase_order_name: &str,
        customer_name: &str,
        customer_email: &str,
        customer_phone: &str,
    ) -> Result<KhaltiInitiateResponse, String> {
        let client = Self::client()?;
        let return_url = format!("{}/payment/verify", Config::frontend_url());

        let res = client
            .post(format!("{}/epayment/initiate/", Config::khalti_base_url()))
            .header("Authorization", format!("Key {}", Self::secret_key()?))
            .json(&json!({
                "return_url": return_url,
                "website_url": Config::frontend_url(),
                "amount": amount * 100,
                "purchase_order_id": purchase_order_id,
                "purchase_order_name": purchase_order_name,
                "customer_info": {
                    "name": customer_name,
                    "email": customer_email,
                    "phone": customer_phone
                }
            }))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("Khalti initiate failed ({}): {}", status, body));
        }

        res.json().await.map_err(|e| e.to_string())
    }

    /// Looks up the final state of a transaction by `pidx`.
    pub async fn lookup(pidx: &str) -> Result<KhaltiLookupResponse, String> {
        let client = Self::client()?;

        let res = client
            .post(format!("{}/epayment/lookup/", Config::khalti_base_url()))
            .header("Authorization", format!("Key {}", Self::secret_key()?))
            .json(&json!({ "pidx": pidx }))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("Khalti lookup failed ({}): {}", status, body));
        }

        res.json().await.map_err(|e| e.to_string())
    }
}
