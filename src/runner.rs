use crate::activation::{self, ActivationPolicy};
use crate::api_client::{ApiClient, DcmApi};
use crate::batch::{self, BatchReport};
use crate::config::{Config, Job};
use crate::creatives;
use crate::error::Error;
use crate::processor::RowProcessor;
use crate::targeting::{TargetingStrategy, ZipCodeTargeting};
use log::{info, warn};

/// Uploads every video listed in the job's CSV and writes the success and
/// failure files.
///
/// Fails only for problems that stop the whole batch: unusable input,
/// missing or rejected credentials, an unknown campaign, or output files
/// that cannot be written. Individual rows never fail the run.
pub async fn upload_videos(config: Config, job: Job) -> Result<BatchReport, Error> {
    let targeting = ZipCodeTargeting::new(&config.country_code, &config.country_dart_id);
    let token = config.access_token()?;
    let api_client = ApiClient::new(&config, token);

    let activation = config
        .activate
        .then(|| ActivationPolicy::new(config.activation_attempts));

    run_batch(&api_client, &targeting, &job, activation).await
}

pub async fn run_batch(
    api: &dyn DcmApi,
    targeting: &dyn TargetingStrategy,
    job: &Job,
    activation: Option<ActivationPolicy>,
) -> Result<BatchReport, Error> {
    let table = creatives::read_creatives(&job.creatives_list, targeting.required_columns())?;
    info!(
        "Read {} creatives from '{}'",
        table.rows.len(),
        job.creatives_list.display()
    );

    let context = job.context();
    let campaign = api
        .get_campaign(context.profile_id, context.campaign_id)
        .await?;
    info!(
        "Using campaign '{}' (ID: {}) ending {}",
        campaign.name, campaign.id, campaign.end_date
    );

    let processor = RowProcessor::new(api, targeting, context, campaign.end_date);
    let report = batch::process_rows(&processor, table.rows).await;

    creatives::write_report(
        table.columns.headers(),
        &report,
        &job.success_file,
        &job.failure_file,
    )?;

    if let Some(policy) = activation {
        let inactive =
            activation::activate_all(api, context.profile_id, &report.successes, policy).await;
        if !inactive.is_empty() {
            warn!("Ads left inactive: {:?}", inactive);
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_client::MockDcmApi;
    use crate::creatives::tests::HEADER;
    use crate::models::Campaign;
    use crate::processor::tests::{end_date, happy_api};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn job(dir: &Path, creatives: &str) -> Job {
        let creatives_list = dir.join("creatives.csv");
        fs::write(&creatives_list, creatives).unwrap();
        Job {
            profile_id: 1,
            advertiser_id: 2,
            campaign_id: 3,
            placement_id: 4,
            creatives_list,
            success_file: dir.join("success.csv"),
            failure_file: dir.join("failure.csv"),
        }
    }

    fn campaign() -> Campaign {
        Campaign {
            id: 3,
            name: "Spring".to_string(),
            end_date: end_date(),
        }
    }

    #[tokio::test]
    async fn test_run_batch_writes_both_files() {
        let dir = TempDir::new().unwrap();
        let job = job(
            dir.path(),
            &format!(
                "{}\na.mp4,,A,1,https://a.example\n,,B,2,https://b.example\n",
                HEADER
            ),
        );

        let mut api = happy_api();
        api.expect_get_campaign()
            .withf(|profile, campaign| *profile == 1 && *campaign == 3)
            .times(1)
            .returning(|_, _| Ok(campaign()));
        let targeting = ZipCodeTargeting::new("US", "256");

        let report = run_batch(&api, &targeting, &job, None).await.unwrap();
        assert_eq!(report.total(), 2);

        assert_eq!(
            fs::read_to_string(&job.success_file).unwrap(),
            format!("{},Ad ID\na.mp4,,A,1,https://a.example,201\n", HEADER)
        );
        let failures = fs::read_to_string(&job.failure_file).unwrap();
        let mut lines = failures.lines();
        assert_eq!(lines.next(), Some(format!("{},Failure reason", HEADER).as_str()));
        let failure = lines.next().unwrap();
        assert!(failure.starts_with(",,B,2,https://b.example,"));
        assert!(failure.contains("'Filename' and 'File URL'"));
        assert_eq!(lines.next(), None);
    }

    #[tokio::test]
    async fn test_header_only_input() {
        let dir = TempDir::new().unwrap();
        let job = job(dir.path(), &format!("{}\n", HEADER));

        let mut api = MockDcmApi::new();
        api.expect_get_campaign().returning(|_, _| Ok(campaign()));
        let targeting = ZipCodeTargeting::new("US", "256");

        let report = run_batch(&api, &targeting, &job, None).await.unwrap();
        assert_eq!(report.total(), 0);
        assert_eq!(
            fs::read_to_string(&job.success_file).unwrap(),
            format!("{},Ad ID\n", HEADER)
        );
        assert_eq!(
            fs::read_to_string(&job.failure_file).unwrap(),
            format!("{},Failure reason\n", HEADER)
        );
    }

    #[tokio::test]
    async fn test_bad_input_fails_before_any_remote_call() {
        let dir = TempDir::new().unwrap();
        let job = job(dir.path(), "Creative name,Landing URL\nA,https://a.example\n");

        let api = MockDcmApi::new();
        let targeting = ZipCodeTargeting::new("US", "256");

        let result = run_batch(&api, &targeting, &job, None).await;
        assert!(matches!(result.unwrap_err(), Error::Input { .. }));
        assert!(!job.success_file.exists());
        assert!(!job.failure_file.exists());
    }

    #[tokio::test]
    async fn test_rejected_credentials_abort_the_batch() {
        let dir = TempDir::new().unwrap();
        let job = job(
            dir.path(),
            &format!("{}\na.mp4,,A,1,https://a.example\n", HEADER),
        );

        let mut api = MockDcmApi::new();
        api.expect_get_campaign().times(1).returning(|_, _| {
            Err(Error::Auth {
                message: "Invalid Credentials".to_string(),
            })
        });
        api.expect_upload_asset().never();
        let targeting = ZipCodeTargeting::new("US", "256");

        let result = run_batch(&api, &targeting, &job, None).await;
        assert!(matches!(result.unwrap_err(), Error::Auth { .. }));
        assert!(!job.success_file.exists());
    }

    #[tokio::test]
    async fn test_activation_runs_after_files_are_written() {
        let dir = TempDir::new().unwrap();
        let job = job(
            dir.path(),
            &format!("{}\na.mp4,,A,1,https://a.example\n", HEADER),
        );

        let mut api = happy_api();
        api.expect_get_campaign().returning(|_, _| Ok(campaign()));
        api.expect_activate_creative()
            .withf(|_, creative| *creative == 101)
            .times(1)
            .returning(|_, _| Ok(()));
        api.expect_activate_ad()
            .withf(|_, ad| *ad == 201)
            .times(1)
            .returning(|_, _| Ok(()));
        let targeting = ZipCodeTargeting::new("US", "256");
        let policy = ActivationPolicy {
            attempts: 1,
            backoff_factor: 0,
        };

        let report = run_batch(&api, &targeting, &job, Some(policy)).await.unwrap();
        assert_eq!(report.successes.len(), 1);
        assert!(job.success_file.exists());
    }
}
