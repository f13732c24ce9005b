//! 입력 URL을 GitLab MR 대상으로 해석하는 모듈.

use anyhow::{Result, bail};
use url::Url;

#[derive(Debug, Clone)]
pub struct MergeRequestTarget {
    pub host: String,
    pub project_path: String,
    pub iid: u64,
    pub url: String,
}

impl MergeRequestTarget {
    /// `https://<host>/<group>/.../<project>/-/merge_requests/<iid>` 형태를 해석한다.
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input)?;
        let host = url
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("URL host is missing"))?
            .to_string();

        let segments: Vec<String> = url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).map(ToString::to_string).collect())
            .unwrap_or_default();

        if let Some(target) = parse_merge_request_path(&host, &segments, input) {
            return Ok(target);
        }

        bail!("unsupported URL format (expected a GitLab merge request URL): {input}")
    }
}

fn parse_merge_request_path(
    host: &str,
    segments: &[String],
    input: &str,
) -> Option<MergeRequestTarget> {
    // /group/.../project/-/merge_requests/<iid>
    let sep = segments.iter().position(|s| s == "-")?;
    if sep + 2 >= segments.len() {
        return None;
    }
    if segments.get(sep + 1)? != "merge_requests" {
        return None;
    }

    let iid = segments.get(sep + 2)?.parse().ok()?;
    if sep == 0 {
        return None;
    }

    let project_path = segments[..sep].join("/");

    Some(MergeRequestTarget {
        host: host.to_string(),
        project_path,
        iid,
        url: input.to_string(),
    })
}
