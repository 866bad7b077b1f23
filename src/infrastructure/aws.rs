//! Shared AWS SDK plumbing

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use chrono::{DateTime, Utc};

use crate::api::ApiError;
use crate::waiter::EventRecord;

/// Loads SDK configuration from the default provider chain
///
/// `region` and `profile` override what the environment provides.
pub async fn load_sdk_config(region: Option<&str>, profile: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }
    loader.load().await
}

/// Converts an SDK timestamp, dropping values chrono cannot represent
pub(crate) fn to_utc(value: &aws_smithy_types::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}

/// Converts to an SDK timestamp with whole-second precision
pub(crate) fn from_utc(value: DateTime<Utc>) -> aws_smithy_types::DateTime {
    aws_smithy_types::DateTime::from_secs(value.timestamp())
}

/// Accumulates newest-first event pages
///
/// With a `since` bound, pages are read until one reaches back to it, so no
/// event newer than the bound is lost between pages. Without one, only the
/// first page is kept.
#[derive(Debug)]
pub(crate) struct EventPages {
    since: Option<DateTime<Utc>>,
    events: Vec<EventRecord>,
}

impl EventPages {
    pub(crate) fn since(since: Option<DateTime<Utc>>) -> Self {
        Self {
            since,
            events: Vec::new(),
        }
    }

    /// Adds a page and returns whether the next page is still needed
    pub(crate) fn push(&mut self, page: impl IntoIterator<Item = EventRecord>) -> bool {
        let before = self.events.len();
        self.events.extend(page);
        let page = &self.events[before..];
        match self.since {
            Some(since) => !page.is_empty() && page.iter().all(|e| e.timestamp > since),
            None => false,
        }
    }

    pub(crate) fn into_events(self) -> Vec<EventRecord> {
        self.events
    }
}

/// Maps an SDK error to an [`ApiError`], keeping the service error code
pub(crate) fn api_error<E>(service: &'static str, operation: &'static str, err: &E) -> ApiError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    let message = match err.message() {
        Some(message) => message.to_string(),
        None => DisplayErrorContext(err).to_string(),
    };
    ApiError::new(service, operation, err.code().map(str::to_string), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_smithy_types::error::ErrorMetadata;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_conversion() {
        let sdk = aws_smithy_types::DateTime::from_secs(1_714_564_800);
        let utc = to_utc(&sdk).unwrap();
        assert_eq!(utc, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        assert_eq!(from_utc(utc), sdk);
    }

    fn event(secs: i64) -> EventRecord {
        EventRecord::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + chrono::Duration::seconds(secs),
            "INFO",
            format!("event {secs}"),
        )
    }

    #[test]
    fn test_event_pages_follow_until_the_bound() {
        let mut pages = EventPages::since(Some(event(10).timestamp));

        assert!(pages.push([event(40), event(30)]));
        assert!(pages.push([event(20), event(15)]));
        assert!(!pages.push([event(12), event(10), event(5)]));

        let messages: Vec<String> = pages.into_events().into_iter().map(|e| e.message).collect();
        assert_eq!(
            messages,
            vec!["event 40", "event 30", "event 20", "event 15", "event 12", "event 10", "event 5"]
        );
    }

    #[test]
    fn test_event_pages_stop_on_empty_page() {
        let mut pages = EventPages::since(Some(event(0).timestamp));
        assert!(pages.push([event(3)]));
        assert!(!pages.push(Vec::new()));
        assert_eq!(pages.into_events().len(), 1);
    }

    #[test]
    fn test_event_pages_without_bound_read_one_page() {
        let mut pages = EventPages::since(None);
        assert!(!pages.push([event(9), event(8)]));
        assert_eq!(pages.into_events().len(), 2);
    }

    #[test]
    fn test_api_error_keeps_code_and_message() {
        let meta = ErrorMetadata::builder()
            .code("ValidationError")
            .message("No updates are to be performed.")
            .build();

        let err = api_error("CloudFormation", "UpdateStack", &meta);

        assert_eq!(err.code(), "ValidationError");
        assert_eq!(err.message, "No updates are to be performed.");
        assert!(!err.not_found);
    }
}
