//! Storage presign integration tests.
//!
//! The signing tests accept either a presigned URL (storage configured) or
//! a 500 (storage not configured); everything else is a failure.

#[cfg(test)]
mod tests {
    use edgehub_auth::session::Role;

    use crate::{client, session_token, test_object_key, url};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_require_session_to_sign() {
        let resp = client()
            .post(url("/api/storage/sign"))
            .json(&serde_json::json!({ "key": "a.txt" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_presign_upload() {
        let key = test_object_key("upload");
        let resp = client()
            .post(url("/api/storage/sign"))
            .bearer_auth(session_token("carol@example.com", Role::User))
            .json(&serde_json::json!({ "key": key, "contentType": "text/plain" }))
            .send()
            .await
            .unwrap();

        if resp.status() == 500 {
            return;
        }
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["key"], key);
        assert_eq!(body["headers"]["content-type"], "text/plain");

        let signed = body["url"].as_str().unwrap();
        assert!(signed.contains("X-Amz-Algorithm=AWS4-HMAC-SHA256"));
        assert!(
            signed.contains("X-Amz-SignedHeaders=host%3Bx-amz-content-sha256%3Bx-amz-date")
        );
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_presign_download() {
        let key = test_object_key("download");
        let resp = client()
            .post(url("/api/storage/sign-get"))
            .bearer_auth(session_token("carol@example.com", Role::User))
            .json(&serde_json::json!({ "key": key }))
            .send()
            .await
            .unwrap();

        if resp.status() == 500 {
            return;
        }
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(body.get("headers").is_none());
        assert!(body["url"].as_str().unwrap().contains("X-Amz-Expires=300"));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_require_key_to_sign_download() {
        let resp = client()
            .post(url("/api/storage/sign-get"))
            .bearer_auth(session_token("carol@example.com", Role::User))
            .json(&serde_json::json!({}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    }
}
