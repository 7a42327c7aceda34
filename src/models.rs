use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const ASSET_TYPE_VIDEO: &str = "VIDEO";

/// DCM encodes int64 ids as JSON strings but accepts numbers too.
mod int64 {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(u64),
    }

    pub fn serialize<S: Serializer>(id: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&id.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match StringOrNumber::deserialize(deserializer)? {
            StringOrNumber::String(s) => s.parse().map_err(de::Error::custom),
            StringOrNumber::Number(n) => Ok(n),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AssetIdentifier {
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreativeAssetMetadata {
    pub asset_identifier: AssetIdentifier,
}

/// Any DCM resource returned from an insert; only the id and name matter here.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    #[serde(with = "int64")]
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    #[serde(with = "int64")]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub end_date: NaiveDate,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewCreative {
    #[serde(with = "int64")]
    pub advertiser_id: u64,
    pub click_tags: Vec<ClickTag>,
    pub creative_assets: Vec<CreativeAsset>,
    pub name: String,
    #[serde(rename = "type")]
    pub creative_type: String,
    pub active: bool,
}

impl NewCreative {
    /// An inactive in-stream video creative built around a single uploaded asset.
    pub fn instream_video(advertiser_id: u64, asset: AssetIdentifier, landing_url: &str) -> Self {
        NewCreative {
            advertiser_id,
            click_tags: vec![ClickTag {
                event_name: "exit".to_string(),
                name: "click_tag".to_string(),
                value: landing_url.to_string(),
            }],
            name: asset.name.clone(),
            creative_assets: vec![CreativeAsset {
                asset_identifier: asset,
                role: "PARENT_VIDEO".to_string(),
                active: true,
            }],
            creative_type: "INSTREAM_VIDEO".to_string(),
            active: false,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClickTag {
    pub event_name: String,
    pub name: String,
    pub value: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreativeAsset {
    pub asset_identifier: AssetIdentifier,
    pub role: String,
    pub active: bool,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CampaignCreativeAssociation {
    #[serde(with = "int64")]
    pub creative_id: u64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewAd {
    pub active: bool,
    #[serde(with = "int64")]
    pub advertiser_id: u64,
    #[serde(with = "int64")]
    pub campaign_id: u64,
    pub creative_rotation: CreativeRotation,
    pub delivery_schedule: DeliverySchedule,
    pub end_time: String,
    pub name: String,
    pub placement_assignments: Vec<PlacementAssignment>,
    pub start_time: String,
    #[serde(rename = "type")]
    pub ad_type: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreativeRotation {
    pub creative_assignments: Vec<CreativeAssignment>,
    #[serde(rename = "type")]
    pub rotation_type: String,
    pub weight_calculation_strategy: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreativeAssignment {
    pub active: bool,
    #[serde(with = "int64")]
    pub creative_id: u64,
    pub click_through_url: ClickThroughUrl,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClickThroughUrl {
    pub default_landing_page: bool,
    pub custom_click_through_url: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeliverySchedule {
    pub impression_ratio: String,
    pub priority: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlacementAssignment {
    pub active: bool,
    #[serde(with = "int64")]
    pub placement_id: u64,
}

/// Targeting to apply on an ad. Serialized as-is into the ad patch, so each
/// dimension is a top-level ad field and absent dimensions are left untouched.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TargetingCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo_targeting: Option<GeoTargeting>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeoTargeting {
    pub postal_codes: Vec<PostalCode>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostalCode {
    pub kind: String,
    pub id: String,
    pub code: String,
    pub country_code: String,
    pub country_dart_id: String,
}

#[derive(Serialize, Debug)]
pub(crate) struct ActivePatch {
    pub active: bool,
}
