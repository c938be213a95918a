use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::model::{Release, RepoRef};

/// Embed accent for stable releases.
pub const RELEASE_COLOR: u32 = 0x2ECC71;
/// Embed accent for canary builds.
pub const PRERELEASE_COLOR: u32 = 0xF1C40F;

static ISSUE_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#(\d+)").expect("valid issue reference pattern"));

/// A rendered announcement: one content line and one rich embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub content: String,
    pub title: String,
    pub url: String,
    pub description: String,
    pub color: u32,
}

/// Render a release into the message posted to the channel.
pub fn render(release: &Release, repo: &RepoRef) -> Announcement {
    let kind = if release.prerelease {
        "canary release"
    } else {
        "release"
    };
    Announcement {
        content: format!("New {} of {} published!", kind, repo.full_name()),
        title: release.name.clone(),
        url: release.html_url.clone(),
        description: link_issue_refs(&release.body, repo),
        color: if release.prerelease {
            PRERELEASE_COLOR
        } else {
            RELEASE_COLOR
        },
    }
}

/// Rewrite every `#123` in the body into a markdown link against the
/// watched repository, keeping the original reference as link text.
pub fn link_issue_refs(body: &str, repo: &RepoRef) -> String {
    ISSUE_REF
        .replace_all(body, |caps: &Captures<'_>| {
            format!("[{}]({})", &caps[0], repo.pull_url(&caps[1]))
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn repo() -> RepoRef {
        RepoRef::new("acme", "widget")
    }

    fn release(prerelease: bool, body: &str) -> Release {
        Release {
            name: "v1.2.0".into(),
            published_at: Utc::now(),
            html_url: "https://github.com/acme/widget/releases/tag/v1.2.0".into(),
            body: body.into(),
            prerelease,
        }
    }

    #[test]
    fn links_every_issue_reference() {
        let rewritten = link_issue_refs("Fixes #12, closes #345.", &repo());
        assert_eq!(
            rewritten,
            "Fixes [#12](https://github.com/acme/widget/pulls/12), \
             closes [#345](https://github.com/acme/widget/pulls/345)."
        );
    }

    #[test]
    fn body_without_references_is_unchanged() {
        let body = "No issues here, just notes. #notanumber";
        assert_eq!(link_issue_refs(body, &repo()), body);
    }

    #[test]
    fn stable_release_rendering() {
        let announcement = render(&release(false, "notes"), &repo());
        assert_eq!(announcement.content, "New release of acme/widget published!");
        assert_eq!(announcement.title, "v1.2.0");
        assert_eq!(
            announcement.url,
            "https://github.com/acme/widget/releases/tag/v1.2.0"
        );
        assert_eq!(announcement.color, RELEASE_COLOR);
    }

    #[test]
    fn canary_release_rendering() {
        let announcement = render(&release(true, "notes"), &repo());
        assert_eq!(
            announcement.content,
            "New canary release of acme/widget published!"
        );
        assert_eq!(announcement.color, PRERELEASE_COLOR);
    }

    #[test]
    fn description_carries_rewritten_body() {
        let announcement = render(&release(false, "See #7"), &repo());
        assert_eq!(
            announcement.description,
            "See [#7](https://github.com/acme/widget/pulls/7)"
        );
    }
}
