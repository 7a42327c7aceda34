use crate::config::Config;
use crate::error::Error;
use crate::models::{
    ActivePatch, AssetIdentifier, Campaign, CampaignCreativeAssociation, CreativeAssetMetadata,
    NewAd, NewCreative, Resource, TargetingCriteria, ASSET_TYPE_VIDEO,
};
use log::{debug, info};
use reqwest::{header::CONTENT_TYPE, Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const UPLOAD_BOUNDARY: &str = "dcm_video_uploader_related_boundary";

/// Where the bytes of a video come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    File(PathBuf),
    Url(Url),
}

impl VideoSource {
    /// The path component of the source, used to guess the media type.
    fn media_path(&self) -> String {
        match self {
            VideoSource::File(path) => path.to_string_lossy().into_owned(),
            VideoSource::Url(url) => url.path().to_string(),
        }
    }
}

impl std::fmt::Display for VideoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoSource::File(path) => write!(f, "{}", path.display()),
            VideoSource::Url(url) => write!(f, "{}", url),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DcmApi: Send + Sync + 'static {
    /// Fetches a campaign by id.
    async fn get_campaign(&self, profile_id: u64, campaign_id: u64) -> Result<Campaign, Error>;

    /// Uploads the video behind `source` as a new video asset of the advertiser.
    /// # Arguments
    /// * `profile_id` - The user profile making the request.
    /// * `advertiser_id` - The advertiser that will own the asset.
    /// * `name` - Desired asset name. DCM may alter it to keep names unique.
    /// * `source` - Local file or URL holding the video.
    /// # Returns
    /// The identifier DCM assigned to the uploaded asset.
    async fn upload_asset(
        &self,
        profile_id: u64,
        advertiser_id: u64,
        name: &str,
        source: &VideoSource,
    ) -> Result<AssetIdentifier, Error>;

    /// Inserts a creative and returns its id and final name.
    async fn create_creative(&self, profile_id: u64, creative: &NewCreative)
        -> Result<Resource, Error>;

    /// Makes the creative available to ads of the campaign.
    async fn associate_creative(
        &self,
        profile_id: u64,
        campaign_id: u64,
        creative_id: u64,
    ) -> Result<(), Error>;

    /// Inserts an ad and returns its id and final name.
    async fn create_ad(&self, profile_id: u64, ad: &NewAd) -> Result<Resource, Error>;

    /// Applies targeting criteria to an existing ad. The ad already carries
    /// its placement assignment, so the criteria apply within that placement.
    async fn assign_targeting(
        &self,
        profile_id: u64,
        ad_id: u64,
        criteria: &TargetingCriteria,
    ) -> Result<(), Error>;

    async fn activate_creative(&self, profile_id: u64, creative_id: u64) -> Result<(), Error>;

    async fn activate_ad(&self, profile_id: u64, ad_id: u64) -> Result<(), Error>;
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    upload_url: String,
    token: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl ApiClient {
    pub fn new(config: &Config, token: String) -> Self {
        ApiClient {
            client: Client::new(),
            base_url: config.api_url.to_string(),
            upload_url: config.upload_url.to_string(),
            token,
        }
    }

    fn endpoint(base: &str, segments: &[&str]) -> Result<Url, Error> {
        let mut url = Url::parse(base)?;
        url.path_segments_mut()
            .map_err(|_| Error::UrlParsingFailed(url::ParseError::SetHostOnCannotBeABaseUrl))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn profile_endpoint(&self, profile_id: u64, segments: &[&str]) -> Result<Url, Error> {
        let profile_id = profile_id.to_string();
        let mut all = vec!["userprofiles", profile_id.as_str()];
        all.extend_from_slice(segments);
        Self::endpoint(&self.base_url, &all)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self.client.get(url).bearer_auth(&self.token).send().await?;
        Ok(check_status(resp).await?.json::<T>().await?)
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        debug!("POST {}", url);
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        Ok(check_status(resp).await?.json::<T>().await?)
    }

    async fn patch<B: Serialize + ?Sized>(&self, url: Url, body: &B) -> Result<(), Error> {
        debug!("PATCH {}", url);
        let resp = self
            .client
            .patch(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    async fn patch_by_id<B: Serialize + ?Sized>(
        &self,
        profile_id: u64,
        collection: &str,
        id: u64,
        body: &B,
    ) -> Result<(), Error> {
        let mut url = self.profile_endpoint(profile_id, &[collection])?;
        url.query_pairs_mut().append_pair("id", &id.to_string());
        self.patch(url, body).await
    }

    async fn read_video(&self, source: &VideoSource) -> Result<Vec<u8>, Error> {
        let unavailable = |reason: String| Error::VideoUnavailable {
            source_name: source.to_string(),
            reason,
        };

        match source {
            VideoSource::File(path) => tokio::fs::read(path)
                .await
                .map_err(|err| unavailable(err.to_string())),
            VideoSource::Url(url) => {
                info!("Downloading video on URL '{}'", url);
                let resp = self
                    .client
                    .get(url.clone())
                    .send()
                    .await
                    .and_then(|resp| resp.error_for_status())
                    .map_err(|err| unavailable(err.to_string()))?;
                let bytes = resp
                    .bytes()
                    .await
                    .map_err(|err| unavailable(err.to_string()))?;
                info!("Video file downloaded");
                Ok(bytes.to_vec())
            }
        }
    }
}

#[async_trait::async_trait]
impl DcmApi for ApiClient {
    async fn get_campaign(&self, profile_id: u64, campaign_id: u64) -> Result<Campaign, Error> {
        let url = self.profile_endpoint(profile_id, &["campaigns", &campaign_id.to_string()])?;
        self.get(url).await
    }

    async fn upload_asset(
        &self,
        profile_id: u64,
        advertiser_id: u64,
        name: &str,
        source: &VideoSource,
    ) -> Result<AssetIdentifier, Error> {
        let media = self.read_video(source).await?;

        let metadata = serde_json::to_vec(&CreativeAssetMetadata {
            asset_identifier: AssetIdentifier {
                name: name.to_string(),
                asset_type: ASSET_TYPE_VIDEO.to_string(),
            },
        })?;

        let mut url = Self::endpoint(
            &self.upload_url,
            &[
                "userprofiles",
                &profile_id.to_string(),
                "creativeAssets",
                &advertiser_id.to_string(),
                "creativeAssets",
            ],
        )?;
        url.query_pairs_mut().append_pair("uploadType", "multipart");

        info!("Uploading asset '{}'", name);
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={}", UPLOAD_BOUNDARY),
            )
            .body(multipart_related(
                &metadata,
                video_content_type(&source.media_path()),
                &media,
            ))
            .send()
            .await?;

        let uploaded = check_status(resp)
            .await?
            .json::<CreativeAssetMetadata>()
            .await?;
        info!("Asset uploaded. Name: '{}'", uploaded.asset_identifier.name);

        Ok(uploaded.asset_identifier)
    }

    async fn create_creative(
        &self,
        profile_id: u64,
        creative: &NewCreative,
    ) -> Result<Resource, Error> {
        let url = self.profile_endpoint(profile_id, &["creatives"])?;
        self.post(url, creative).await
    }

    async fn associate_creative(
        &self,
        profile_id: u64,
        campaign_id: u64,
        creative_id: u64,
    ) -> Result<(), Error> {
        let url = self.profile_endpoint(
            profile_id,
            &[
                "campaigns",
                &campaign_id.to_string(),
                "campaignCreativeAssociations",
            ],
        )?;
        self.post::<_, serde_json::Value>(url, &CampaignCreativeAssociation { creative_id })
            .await?;
        Ok(())
    }

    async fn create_ad(&self, profile_id: u64, ad: &NewAd) -> Result<Resource, Error> {
        let url = self.profile_endpoint(profile_id, &["ads"])?;
        self.post(url, ad).await
    }

    async fn assign_targeting(
        &self,
        profile_id: u64,
        ad_id: u64,
        criteria: &TargetingCriteria,
    ) -> Result<(), Error> {
        self.patch_by_id(profile_id, "ads", ad_id, criteria).await
    }

    async fn activate_creative(&self, profile_id: u64, creative_id: u64) -> Result<(), Error> {
        self.patch_by_id(profile_id, "creatives", creative_id, &ActivePatch { active: true })
            .await
    }

    async fn activate_ad(&self, profile_id: u64, ad_id: u64) -> Result<(), Error> {
        self.patch_by_id(profile_id, "ads", ad_id, &ActivePatch { active: true })
            .await
    }
}

/// Turns non-2xx responses into errors, keeping DCM's own message when the
/// body is a Google error envelope.
async fn check_status(resp: Response) -> Result<Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or(body);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::Auth { message }),
        status => Err(Error::Api {
            status: status.as_u16(),
            message,
        }),
    }
}

fn multipart_related(metadata: &[u8], content_type: &str, media: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(metadata.len() + media.len() + 256);
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n",
            UPLOAD_BOUNDARY
        )
        .as_bytes(),
    );
    body.extend_from_slice(metadata);
    body.extend_from_slice(
        format!("\r\n--{}\r\nContent-Type: {}\r\n\r\n", UPLOAD_BOUNDARY, content_type).as_bytes(),
    );
    body.extend_from_slice(media);
    body.extend_from_slice(format!("\r\n--{}--\r\n", UPLOAD_BOUNDARY).as_bytes());
    body
}

fn video_content_type(source: &str) -> &'static str {
    let extension = source
        .rsplit('.')
        .next()
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "flv" => "video/x-flv",
        "wmv" => "video/x-ms-wmv",
        _ => "application/octet-stream",
    }
}
