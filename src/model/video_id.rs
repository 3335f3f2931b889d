use snafu::Snafu;

use super::*;

/// Identifier of the video being watched.
///
/// The id is opaque to the tracker and is sent to the crediting endpoint exactly as it was given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VideoId(String);

impl TryFrom<String> for VideoId {
    type Error = ParseVideoId;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        if text.is_empty() {
            return Err(ParseVideoId::new(text));
        }

        Ok(VideoId(text))
    }
}

impl From<VideoId> for String {
    fn from(id: VideoId) -> Self {
        id.0
    }
}

impl std::str::FromStr for VideoId {
    type Err = ParseVideoId;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        VideoId::try_from(input.to_string())
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::convert::AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Snafu, new)]
#[snafu(display("Failed to parse video id: `{}`", text))]
pub struct ParseVideoId {
    pub text: String,
}

/// Display value of the credit awarded for this video, e.g. `0.01`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
#[serde(transparent)]
pub struct CreditLabel(String);

impl Default for CreditLabel {
    fn default() -> Self {
        Self("0.01".to_string())
    }
}

impl std::fmt::Display for CreditLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_id_is_kept_verbatim() {
        let id: VideoId = " dQw4w9WgXcQ ".parse().unwrap();
        assert_eq!(id.as_ref(), " dQw4w9WgXcQ ");
    }

    #[test]
    fn empty_video_id_is_rejected() {
        let result = "".parse::<VideoId>();
        assert_eq!(result, Err(ParseVideoId::new(String::new())));
    }

    #[test]
    fn deserialized_video_id_must_not_be_empty() {
        let id: VideoId = serde_json::from_str("\"fDiJSE0CrZ0\"").unwrap();
        assert_eq!(id.as_ref(), "fDiJSE0CrZ0");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"fDiJSE0CrZ0\"");

        let error = serde_json::from_str::<VideoId>("\"\"").unwrap_err();
        assert!(error.to_string().contains("Failed to parse video id"));
    }
}
