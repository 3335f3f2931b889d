use super::*;

/// Statuses the crediting endpoint uses to acknowledge a credit, fresh or pre-existing.
pub const ACCEPTED_STATUSES: [&str; 2] = ["ok", "credited"];

/// Body of the `POST` sent to the crediting endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct ReportRequest {
    pub video_id: VideoId,
    pub watched_seconds: u64,
    pub video_duration: u64,
}

/// What the crediting endpoint answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct ReportResponse {
    pub status: String,
    #[serde(default)]
    #[new(default)]
    pub message: Option<String>,
}

impl ReportResponse {
    pub fn is_accepted(&self) -> bool {
        ACCEPTED_STATUSES.contains(&self.status.as_str())
    }

    /// Server explanation for the answer, falling back to the raw status.
    pub fn reason(&self) -> &str {
        self.message
            .as_deref()
            .filter(|message| !message.is_empty())
            .unwrap_or(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_uses_wire_field_names() {
        let request = ReportRequest::new("abc".parse().unwrap(), 80, 100);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            json!({ "video_id": "abc", "watched_seconds": 80, "video_duration": 100 })
        );
    }

    #[test]
    fn extra_response_fields_are_ignored() {
        let response: ReportResponse =
            serde_json::from_value(json!({ "status": "ok", "credited": 0.01 })).unwrap();

        assert!(response.is_accepted());
        assert_eq!(response.message, None);
    }

    #[test]
    fn response_without_status_is_malformed() {
        let result = serde_json::from_value::<ReportResponse>(json!({ "message": "hi" }));
        assert!(result.is_err());
    }

    #[test]
    fn reason_prefers_message_over_status() {
        let response: ReportResponse = serde_json::from_value(
            json!({ "status": "ignored", "message": "already credited recently" }),
        )
        .unwrap();

        assert!(!response.is_accepted());
        assert_eq!(response.reason(), "already credited recently");
    }

    #[test]
    fn empty_or_null_message_falls_back_to_status() {
        let empty: ReportResponse =
            serde_json::from_value(json!({ "status": "pending", "message": "" })).unwrap();
        let null: ReportResponse =
            serde_json::from_value(json!({ "status": "pending", "message": null })).unwrap();

        assert_eq!(empty.reason(), "pending");
        assert_eq!(null.reason(), "pending");
    }
}
