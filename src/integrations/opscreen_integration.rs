use chrono::{DateTime, Utc};
use errors::NetworkError;
use integrations::feed_parser::{summarize_entries, summarize_legacy_page, FeedSummary};
use integrations::opscreen_response::OpScreenEntry;
use integrations::remote_integration::StatusSource;
use network::{get_last_modified, get_url_response, get_url_text};
use remote_status::StatusRecord;
use station::{FeedFormat, PollerConfig};
use std::time::Duration;

/// Fetches station status from the LWA OpScreen pages.
pub struct OpScreenIntegration {
    status_url: String,
    aux_image_url: String,
    feed_format: FeedFormat,
    recorder_count: usize,
    aux_feed_max_age: Duration,
}

impl OpScreenIntegration {
    pub fn new(config: &PollerConfig) -> OpScreenIntegration {
        OpScreenIntegration {
            status_url: config.station.status_url(&config.base_url),
            aux_image_url: config.station.aux_image_url(&config.base_url),
            feed_format: config.station.feed_format,
            recorder_count: config.recorder_count(),
            aux_feed_max_age: config.aux_feed_max_age,
        }
    }

    fn get_summary(&self) -> Result<FeedSummary, NetworkError> {
        match self.feed_format {
            FeedFormat::Json => {
                let entries: Vec<OpScreenEntry> = get_url_response(&self.status_url)?;
                Ok(summarize_entries(&entries, self.recorder_count))
            }
            FeedFormat::LegacyHtml => {
                let page = get_url_text(&self.status_url)?;
                Ok(summarize_legacy_page(&page, self.recorder_count))
            }
        }
    }
}

impl StatusSource for OpScreenIntegration {
    fn fetch_status(&self) -> Result<StatusRecord, NetworkError> {
        let started = Utc::now();

        let summary = self.get_summary()?;
        let last_modified = get_last_modified(&self.aux_image_url)?;
        let aux_feed_active = aux_feed_active(last_modified, Utc::now(), self.aux_feed_max_age);

        debug!(
            "--OpScreen--: {:?}, recorders {:?}, aux image age {}s.",
            summary.system_status,
            summary.op_types,
            (Utc::now() - last_modified).num_seconds()
        );

        Ok(StatusRecord {
            timestamp: started,
            system_status: summary.system_status,
            op_types: summary.op_types,
            aux_feed_active: aux_feed_active,
        })
    }
}

/// Freshness heuristic for the auxiliary feed: the preview image is only
/// rewritten while the feed runs, so a recent `Last-Modified` means it is
/// live. A stalled upstream reads as "not running" for up to one image
/// refresh interval.
pub fn aux_feed_active(last_modified: DateTime<Utc>, now: DateTime<Utc>, max_age: Duration) -> bool {
    let age = now.signed_duration_since(last_modified).num_seconds();
    age < max_age.as_secs() as i64
}
