pub mod adoption;
pub mod code_hosting;
pub mod composite;
pub mod confidence;
pub mod forum;
pub mod jobs;
pub mod link_aggregator;
pub mod qa;
pub mod trend;
pub mod verdict;
pub mod video;

use crate::models::config::EngineConfig;
use crate::models::metrics::{RawSourceMetrics, SourceId};
use crate::models::snapshot::SourceReading;

/// Run the normalizer that owns `source`. Malformed fields only drop out of
/// their own rules; `None` means no field in the payload was usable.
pub fn normalize(
    source: SourceId,
    raw: &RawSourceMetrics,
    config: &EngineConfig,
) -> Option<SourceReading> {
    match source {
        SourceId::CodeHosting => code_hosting::score_code_hosting(raw, &config.code_hosting),
        SourceId::JobMarket => jobs::score_jobs(raw, &config.jobs),
        SourceId::CommunityForum => forum::score_forum(raw, &config.forum),
        SourceId::AdoptionDirectory => adoption::score_adoption(raw, &config.adoption),
        SourceId::VideoPlatform => video::score_video(raw, &config.video),
        SourceId::Qa => qa::score_qa(raw, &config.qa),
        SourceId::LinkAggregator => {
            link_aggregator::score_link_aggregator(raw, &config.link_aggregator)
        }
    }
}
