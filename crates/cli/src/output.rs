//! Human and JSON rendering of engine results

use chrono::{DateTime, Utc};
use serde::Serialize;

use govmode_governance::{ProposalStatus, ProposalView, Timestamp};

/// Proposal details together with their status at render time
#[derive(Debug, Serialize)]
pub struct ProposalReport {
    #[serde(flatten)]
    pub view: ProposalView,
    pub status: ProposalStatus,
}

/// Unix seconds as RFC 3339, falling back to the raw number
pub fn format_time(secs: Timestamp) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| secs.to_string())
}

/// Multi-line description of one proposal
pub fn render_details(report: &ProposalReport) -> String {
    let view = &report.view;
    format!(
        "Proposal {id}: {title}\n\
         Creator:  {creator}\n\
         Status:   {status}\n\
         Opens:    {start}\n\
         Closes:   {end}\n\
         For:      {for_votes}\n\
         Against:  {against_votes}\n\
         \n\
         {content}",
        id = view.id,
        title = view.title,
        creator = view.creator,
        status = report.status,
        start = format_time(view.start_time),
        end = format_time(view.end_time),
        for_votes = view.for_votes,
        against_votes = view.against_votes,
        content = view.content,
    )
}

/// One summary line for a proposal listing
pub fn render_summary(report: &ProposalReport) -> String {
    let view = &report.view;
    format!(
        "{:>4}  {:<7}  +{} -{}  {}",
        view.id, report.status, view.for_votes, view.against_votes, view.title
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use govmode_governance::{Identity, ProposalId};

    fn report() -> ProposalReport {
        ProposalReport {
            view: ProposalView {
                id: ProposalId(3),
                title: "Budget".to_string(),
                content: "Fund the garden.".to_string(),
                creator: Identity::new("member1").unwrap(),
                start_time: 0,
                end_time: 86_400,
                for_votes: 2,
                against_votes: 1,
            },
            status: ProposalStatus::Closed,
        }
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "1970-01-01T00:00:00+00:00");
        assert_eq!(format_time(u64::MAX), u64::MAX.to_string());
    }

    #[test]
    fn test_render_details_and_summary() {
        let report = report();
        let details = render_details(&report);
        assert!(details.starts_with("Proposal 3: Budget"));
        assert!(details.contains("Closes:   1970-01-02T00:00:00+00:00"));
        assert!(details.ends_with("Fund the garden."));

        assert_eq!(render_summary(&report), "   3  closed   +2 -1  Budget");
    }

    #[test]
    fn test_json_flattens_view() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["creator"], "member1");
        assert_eq!(json["status"], "Closed");
    }
}
