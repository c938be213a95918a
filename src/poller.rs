use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{error, info, instrument};

use crate::discord::ChannelSink;
use crate::github::ReleaseFeed;
use crate::model::{Release, RepoRef};
use crate::render;

/// Polls the release feed and relays anything newer than the watermark
/// into the announcement channel. Owns the watermark; nothing else
/// touches it.
pub struct ReleasePoller {
    repo: RepoRef,
    channel_id: String,
    interval: Duration,
    watermark: DateTime<Utc>,
}

impl ReleasePoller {
    /// The watermark starts at construction time: anything published
    /// before the process came up is treated as already announced.
    pub fn new(repo: RepoRef, channel_id: String, interval: Duration) -> Self {
        Self {
            repo,
            channel_id,
            interval,
            watermark: Utc::now(),
        }
    }

    /// Timestamp below which every release counts as already announced.
    pub fn watermark(&self) -> DateTime<Utc> {
        self.watermark
    }

    /// List the feed and keep only releases published strictly after the
    /// watermark. Returned unordered; feed errors propagate.
    pub async fn fetch_new_releases(&self, feed: &dyn ReleaseFeed) -> Result<Vec<Release>> {
        let fetched_at = Utc::now();
        let raw = feed.list_releases(&self.repo).await?;
        Ok(raw
            .into_iter()
            .map(|entry| Release::from_raw(entry, fetched_at))
            .filter(|release| release.published_at > self.watermark)
            .collect())
    }

    /// Announce one release. Every failure here is local: an unresolvable
    /// or non-text channel and a failed send are logged and the release is
    /// dropped, never retried.
    pub async fn dispatch(&self, sink: &dyn ChannelSink, release: &Release) {
        let channel = match sink.resolve_channel(&self.channel_id).await {
            Ok(channel) => channel,
            Err(err) => {
                error!(?err, channel_id = %self.channel_id, "failed to resolve announcement channel");
                return;
            }
        };
        if !channel.is_text_capable() {
            error!(
                channel_id = %self.channel_id,
                kind = channel.kind,
                "announcement channel is not text-capable"
            );
            return;
        }

        let announcement = render::render(release, &self.repo);
        if let Err(err) = sink.send_announcement(&self.channel_id, &announcement).await {
            error!(?err, release = %release.name, "failed to send announcement");
        }
    }

    /// One poll cycle: fetch, sort ascending by publish time, announce
    /// sequentially, then advance the watermark. Sends are awaited one at
    /// a time so channel order matches release chronology.
    #[instrument(skip_all)]
    pub async fn run_cycle(
        &mut self,
        feed: &dyn ReleaseFeed,
        sink: &dyn ChannelSink,
    ) -> Result<()> {
        let mut releases = self.fetch_new_releases(feed).await?;
        releases.sort_by_key(|release| release.published_at);

        if !releases.is_empty() {
            info!(count = releases.len(), "announcing new releases");
        }
        for release in &releases {
            self.dispatch(sink, release).await;
        }

        self.watermark = Utc::now();
        Ok(())
    }

    /// Run one cycle immediately, then keep polling every `interval`.
    /// The next cycle is scheduled only after the previous one settles,
    /// so cycles never overlap. A failed cycle leaves the watermark
    /// untouched and is retried on the next tick.
    pub async fn run(mut self, feed: &dyn ReleaseFeed, sink: &dyn ChannelSink) {
        info!(
            repo = %self.repo,
            channel_id = %self.channel_id,
            interval_ms = self.interval.as_millis() as u64,
            "release poller started"
        );
        loop {
            if let Err(err) = self.run_cycle(feed, sink).await {
                error!(?err, "poll cycle failed");
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}
