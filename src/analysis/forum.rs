use crate::analysis::trend;
use crate::models::config::{ForumConfig, ForumTrendConfig, Ladder};
use crate::models::metrics::RawSourceMetrics;
use crate::models::snapshot::{clamp_score, SourceReading};

/// Score community-forum health (0 = thriving, 10 = dead).
///
/// Activity blends subscriber, post-volume, engagement and trend tiers.
/// Sentiment lifts the alive score and migration talk drags it down. The
/// alive score is then mapped through [`alive_to_deaditude`], a steep post
/// decline adds a penalty, and fast-growing communities are capped.
/// Missing or malformed fields drop out of their own tier; `None` means no
/// field was usable.
pub fn score_forum(raw: &RawSourceMetrics, config: &ForumConfig) -> Option<SourceReading> {
    let posts = raw.count("post_count");
    let subscribers = raw.count("subscribers");
    let engagement = raw.count("avg_post_score");
    let growth = trend::growth_rate(raw);
    let sentiment = raw.bounded("avg_sentiment", -1.0, 1.0);
    let migration = raw.count("migration_mentions");

    let observed = [posts, subscribers, engagement, growth, sentiment, migration]
        .iter()
        .any(Option::is_some);
    if !observed {
        return None;
    }

    let sustained = raw.flag("sustained_growth").unwrap_or(false);
    let trend_tier = trend_tier(growth, sustained, &config.trend);
    let tier = |ladder: &Ladder, value: Option<f64>| {
        value.map(|v| ladder.value(v)).unwrap_or(0.0)
    };
    let activity = tier_points(
        tier(&config.subscribers, subscribers),
        config.subscribers_max,
        config.subscriber_weight,
    ) + tier_points(tier(&config.posts, posts), config.posts_max, config.post_weight)
        + tier_points(
            tier(&config.engagement, engagement),
            config.engagement_max,
            config.engagement_weight,
        )
        + tier_points(trend_tier, config.trend.scale, config.trend_weight);

    let sentiment_score = sentiment
        .map(|s| clamp_score((s + 1.0) * 5.0))
        .unwrap_or(config.neutral_sentiment);
    let migration = migration.unwrap_or(0.0).min(config.migration_cap);

    let alive = clamp_score(
        activity * config.activity_blend + sentiment_score * config.sentiment_blend
            - migration * config.migration_blend,
    );
    let decline = growth
        .map(|g| trend::decline_penalty(g, &config.decline))
        .unwrap_or(0.0);
    let mut deaditude = alive_to_deaditude(alive, config) + decline;
    let capped =
        growth.is_some_and(|g| g > config.growth_cap_rate) && deaditude > config.growth_cap;
    if capped {
        deaditude = config.growth_cap;
    }

    let mut details = vec![format!(
        "activity {activity:.2}, sentiment {sentiment_score:.1}, alive {alive:.2}"
    )];
    if let Some(subscribers) = subscribers {
        details.push(format!("{subscribers} subscribers"));
    }
    if let Some(posts) = posts {
        details.push(format!("{posts} posts"));
    }
    if let Some(g) = growth {
        details.push(format!("post growth {:+.0}%", g * 100.0));
    }
    if migration > 0.0 {
        details.push(format!("{migration} migration mentions"));
    }
    if decline > 0.0 {
        details.push(format!("decline penalty +{decline:.2}"));
    }
    if capped {
        details.push(format!("growing fast, capped at {}", config.growth_cap));
    }

    log::debug!("forum: alive {alive:.2}, decline {decline:.2}");
    Some(SourceReading::new(deaditude, posts.unwrap_or(0.0), details))
}

/// Map the alive score onto deaditude. At or below `alive_knee` each alive
/// point counts `low_alive_multiplier` times. Above the knee the result
/// never exceeds the value reached at the knee.
pub fn alive_to_deaditude(alive: f64, config: &ForumConfig) -> f64 {
    if alive <= config.alive_knee {
        10.0 - config.low_alive_multiplier * alive
    } else {
        (10.0 - alive).min(10.0 - config.low_alive_multiplier * config.alive_knee)
    }
}

fn tier_points(tier: f64, max: f64, weight: f64) -> f64 {
    tier / max * 10.0 * weight
}

fn trend_tier(growth: Option<f64>, sustained: bool, config: &ForumTrendConfig) -> f64 {
    let base = match growth {
        _ if sustained => config.sustained_base,
        Some(g) if g < config.declining_below => config.declining_base,
        _ => config.stable_base,
    };
    let adjustment = growth.map(|g| config.growth.value(g)).unwrap_or(0.0);
    (base + adjustment).clamp(0.0, config.max)
}
