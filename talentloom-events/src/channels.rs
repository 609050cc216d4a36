//! Names of the realtime channels a view can listen on.

use talentloom_core::{CompanyId, EntityIdType, JobId};

/// Company-wide pipeline channel, plus the job's own channel when given.
pub fn pipeline_channels(company: &CompanyId, job: Option<&JobId>) -> Vec<String> {
    let mut channels = vec![format!("pipeline.{}", company.as_str())];
    if let Some(job) = job {
        channels.push(format!("pipeline.{}", job.as_str()));
    }
    channels
}

pub fn jobs_channel(company: &CompanyId) -> String {
    format!("jobs.{}", company.as_str())
}

pub fn offers_channel(company: &CompanyId) -> String {
    format!("offers.{}", company.as_str())
}

pub fn reports_channel(company: &CompanyId) -> String {
    format!("reports.{}", company.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_names() {
        let company = CompanyId::new("company_1");
        assert_eq!(pipeline_channels(&company, None), vec!["pipeline.company_1"]);
        assert_eq!(
            pipeline_channels(&company, Some(&JobId::new("1"))),
            vec!["pipeline.company_1", "pipeline.1"]
        );
        assert_eq!(jobs_channel(&company), "jobs.company_1");
        assert_eq!(offers_channel(&company), "offers.company_1");
        assert_eq!(reports_channel(&company), "reports.company_1");
    }
}
