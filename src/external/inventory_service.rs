use super::{ServiceError, json, send, with_bearer};
use serde::Deserialize;
use uuid::Uuid;

const SERVICE: &str = "inventory";

/// Client for the inventory service, used to count a technician's work orders.
#[derive(Clone)]
pub struct InventoryServiceClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct WorkOrderCount {
    count: u64,
}

impl InventoryServiceClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `GET /api/workorders/location/{location_id}?userId=...`
    pub async fn count_work_orders(
        &self,
        location_id: Uuid,
        technician_id: &str,
        bearer: Option<&str>,
    ) -> Result<u64, ServiceError> {
        let request = with_bearer(
            self.http
                .get(format!("{}/api/workorders/location/{location_id}", self.base_url))
                .query(&[("userId", technician_id)]),
            bearer,
        );
        let response = send(SERVICE, request).await?;
        Ok(json::<WorkOrderCount>(SERVICE, response).await?.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_count_work_orders() {
        let mut server = Server::new_async().await;
        let location_id = Uuid::new_v4();
        let mock = server
            .mock("GET", format!("/api/workorders/location/{location_id}").as_str())
            .match_query(Matcher::UrlEncoded("userId".into(), "tech-1".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":true,"count":7,"data":[]}"#)
            .create_async()
            .await;

        let client = InventoryServiceClient::new(reqwest::Client::new(), &server.url());
        let count = client
            .count_work_orders(location_id, "tech-1", None)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(count, 7);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_error() {
        let client = InventoryServiceClient::new(reqwest::Client::new(), "http://127.0.0.1:9");
        let err = client
            .count_work_orders(Uuid::new_v4(), "tech-1", None)
            .await
            .unwrap_err();
        assert_eq!(err.service(), "inventory");
    }
}
