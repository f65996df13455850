//! Webhook integration tests.

#[cfg(test)]
mod tests {
    use crate::{client, stripe_signature, url};

    const EVENT: &[u8] = br#"{"id":"evt_integration","type":"checkout.session.completed"}"#;

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_accept_signed_delivery() {
        let resp = client()
            .post(url("/api/stripe/webhook"))
            .header("stripe-signature", stripe_signature(EVENT))
            .body(EVENT)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["received"], true);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_altered_body() {
        let header = stripe_signature(EVENT);
        let resp = client()
            .post(url("/api/stripe/webhook"))
            .header("stripe-signature", header)
            .body(&br#"{"id":"evt_integration","type":"invoice.paid"}"#[..])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_missing_signature() {
        let resp = client()
            .post(url("/api/stripe/webhook"))
            .body(EVENT)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_stale_delivery() {
        let stale = chrono::Utc::now().timestamp() - 3600;
        let header =
            edgehub_auth::webhook::signature_header(stale, EVENT, &crate::stripe_secret())
                .unwrap();
        let resp = client()
            .post(url("/api/stripe/webhook"))
            .header("stripe-signature", header)
            .body(EVENT)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
    }
}
