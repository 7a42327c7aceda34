use crate::api_client::DcmApi;
use crate::config::Context;
use crate::creatives::CreativeRow;
use crate::error::RowError;
use crate::models::{
    ClickThroughUrl, CreativeAssignment, CreativeRotation, DeliverySchedule, NewAd, NewCreative,
    PlacementAssignment, Resource,
};
use crate::targeting::TargetingStrategy;
use chrono::{Local, NaiveDate};
use log::{error, info};

const AD_NAME_PREFIX: &str = "AD_";

/// Result of processing one row.
#[derive(Debug)]
pub enum Outcome {
    Success {
        row: CreativeRow,
        ad_id: u64,
        creative_id: u64,
    },
    Failure {
        row: CreativeRow,
        reason: String,
    },
}

/// Turns one CSV row into a video ad: upload, creative, ad, targeting.
pub struct RowProcessor<'a> {
    api: &'a dyn DcmApi,
    targeting: &'a dyn TargetingStrategy,
    context: Context,
    campaign_end_date: NaiveDate,
}

/// Ids of the objects created for a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CreatedAd {
    ad_id: u64,
    creative_id: u64,
}

impl<'a> RowProcessor<'a> {
    pub fn new(
        api: &'a dyn DcmApi,
        targeting: &'a dyn TargetingStrategy,
        context: Context,
        campaign_end_date: NaiveDate,
    ) -> Self {
        RowProcessor {
            api,
            targeting,
            context,
            campaign_end_date,
        }
    }

    /// Processes a row, never failing: errors become [`Outcome::Failure`].
    pub async fn process(&self, row: CreativeRow) -> Outcome {
        let result = self.create_video_ad(&row).await;
        match result {
            Ok(created) => {
                info!("Row {}: created ad {}", row.line, created.ad_id);
                Outcome::Success {
                    row,
                    ad_id: created.ad_id,
                    creative_id: created.creative_id,
                }
            }
            Err(err) => {
                error!("Exception while processing row {}: {}", row.line, err);
                Outcome::Failure {
                    row,
                    reason: err.to_string(),
                }
            }
        }
    }

    async fn create_video_ad(&self, row: &CreativeRow) -> Result<CreatedAd, RowError> {
        let ctx = &self.context;

        // Everything that can be checked locally is checked before the first
        // remote call, so a bad row leaves nothing behind on DCM.
        let source = row.video_source()?;
        let creative_name = row.creative_name()?;
        let landing_url = row.landing_url()?;
        let criteria = self.targeting.derive(row)?;

        info!("Processing creative '{}' from '{}'", creative_name, source);

        let asset = self
            .api
            .upload_asset(ctx.profile_id, ctx.advertiser_id, &creative_name, &source)
            .await
            .map_err(RowError::Upload)?;

        let creative = NewCreative::instream_video(ctx.advertiser_id, asset, landing_url);
        let creative = self
            .api
            .create_creative(ctx.profile_id, &creative)
            .await
            .map_err(RowError::CreativeCreation)?;
        self.api
            .associate_creative(ctx.profile_id, ctx.campaign_id, creative.id)
            .await
            .map_err(RowError::CreativeCreation)?;
        info!("Added creative '{}' (ID: {})", creative.name, creative.id);

        let ad = self.new_ad(&creative, landing_url);
        let ad = self
            .api
            .create_ad(ctx.profile_id, &ad)
            .await
            .map_err(RowError::AdCreation)?;

        self.api
            .assign_targeting(ctx.profile_id, ad.id, &criteria)
            .await
            .map_err(RowError::TargetingAssignment)?;

        Ok(CreatedAd {
            ad_id: ad.id,
            creative_id: creative.id,
        })
    }

    fn new_ad(&self, creative: &Resource, landing_url: &str) -> NewAd {
        NewAd {
            active: false,
            advertiser_id: self.context.advertiser_id,
            campaign_id: self.context.campaign_id,
            creative_rotation: CreativeRotation {
                creative_assignments: vec![CreativeAssignment {
                    active: true,
                    creative_id: creative.id,
                    click_through_url: ClickThroughUrl {
                        default_landing_page: false,
                        custom_click_through_url: landing_url.to_string(),
                    },
                }],
                rotation_type: "CREATIVE_ROTATION_TYPE_RANDOM".to_string(),
                weight_calculation_strategy: "WEIGHT_STRATEGY_EQUAL".to_string(),
            },
            delivery_schedule: DeliverySchedule {
                impression_ratio: "1".to_string(),
                priority: "AD_PRIORITY_01".to_string(),
            },
            end_time: format!("{}T00:00:00Z", self.campaign_end_date.format("%Y-%m-%d")),
            name: format!("{}{}", AD_NAME_PREFIX, creative.name),
            placement_assignments: vec![PlacementAssignment {
                active: true,
                placement_id: self.context.placement_id,
            }],
            start_time: format!("{}T23:59:59Z", Local::now().format("%Y-%m-%d")),
            ad_type: "AD_SERVING_STANDARD_AD".to_string(),
        }
    }
}
