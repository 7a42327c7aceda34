use crate::error::Error;
use clap::Args as ClapArgs;
use std::fs;
use std::path::PathBuf;

const DEFAULT_API_URL: &str = "https://dfareporting.googleapis.com/dfareporting/v4";
const DEFAULT_UPLOAD_URL: &str = "https://dfareporting.googleapis.com/upload/dfareporting/v4";
const DEFAULT_COUNTRY_CODE: &str = "US";
const DEFAULT_COUNTRY_DART_ID: &str = "256";
const DEFAULT_ACTIVATION_ATTEMPTS: &str = "5";

#[derive(ClapArgs)]
pub struct Config {
    #[arg(long, default_value = DEFAULT_API_URL, env = "DCM_API_URL")]
    pub(crate) api_url: String,

    #[arg(long, default_value = DEFAULT_UPLOAD_URL, env = "DCM_UPLOAD_URL")]
    pub(crate) upload_url: String,

    #[arg(long, env = "DCM_ACCESS_TOKEN", hide_env_values = true)]
    pub(crate) access_token: Option<String>,

    #[arg(long, env = "DCM_TOKEN_FILE", help = "File holding an OAuth access token")]
    pub(crate) token_file: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_COUNTRY_CODE, env = "DCM_COUNTRY_CODE")]
    pub(crate) country_code: String,

    #[arg(long, default_value = DEFAULT_COUNTRY_DART_ID, env = "DCM_COUNTRY_DART_ID")]
    pub(crate) country_dart_id: String,

    #[arg(long, help = "Activate the created ads once the batch is done")]
    pub(crate) activate: bool,

    #[arg(long, default_value = DEFAULT_ACTIVATION_ATTEMPTS)]
    pub(crate) activation_attempts: u32,
}

impl Config {
    /// Resolves the OAuth access token, preferring `--access-token` over `--token-file`.
    pub fn access_token(&self) -> Result<String, Error> {
        let token = match (&self.access_token, &self.token_file) {
            (Some(token), _) => token.trim().to_string(),
            (None, Some(path)) => fs::read_to_string(path)
                .map_err(|err| Error::Auth {
                    message: format!("cannot read token file '{}': {}", path.display(), err),
                })?
                .trim()
                .to_string(),
            (None, None) => {
                return Err(Error::Auth {
                    message: "no access token; pass --access-token or --token-file".to_string(),
                })
            }
        };

        if token.is_empty() {
            return Err(Error::Auth {
                message: "access token is empty".to_string(),
            });
        }

        Ok(token)
    }
}

/// The positional part of the command line: which DCM objects to work in and
/// which files to read and write.
#[derive(ClapArgs, Debug, Clone)]
pub struct Job {
    #[arg(help = "DCM user profile with write access to the advertiser and campaign", value_parser = validate_id)]
    pub profile_id: u64,

    #[arg(help = "Advertiser that will own the new video creatives", value_parser = validate_id)]
    pub advertiser_id: u64,

    #[arg(help = "Campaign where the ads will be created", value_parser = validate_id)]
    pub campaign_id: u64,

    #[arg(help = "Placement inside which the ads will be created", value_parser = validate_id)]
    pub placement_id: u64,

    #[arg(help = "CSV with columns 'Filename', 'File URL', 'Creative name', 'ZIP', 'Landing URL'")]
    pub creatives_list: PathBuf,

    #[arg(help = "Output CSV listing the ads that were created")]
    pub success_file: PathBuf,

    #[arg(help = "Output CSV listing the rows that failed, with the reason")]
    pub failure_file: PathBuf,
}

/// Fixed identifiers shared read-only by every row of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    pub profile_id: u64,
    pub advertiser_id: u64,
    pub campaign_id: u64,
    pub placement_id: u64,
}

impl Job {
    pub fn context(&self) -> Context {
        Context {
            profile_id: self.profile_id,
            advertiser_id: self.advertiser_id,
            campaign_id: self.campaign_id,
            placement_id: self.placement_id,
        }
    }
}

fn validate_id(s: &str) -> Result<u64, String> {
    match s.trim().parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(format!("Invalid id '{}', expected a positive integer", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config(access_token: Option<&str>, token_file: Option<PathBuf>) -> Config {
        Config {
            api_url: DEFAULT_API_URL.to_string(),
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            access_token: access_token.map(str::to_string),
            token_file,
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            country_dart_id: DEFAULT_COUNTRY_DART_ID.to_string(),
            activate: false,
            activation_attempts: 5,
        }
    }

    #[test]
    fn test_validate_id() {
        assert_eq!(validate_id("1234"), Ok(1234));
        assert_eq!(validate_id(" 42 "), Ok(42));
        assert!(validate_id("0").is_err());
        assert!(validate_id("-3").is_err());
        assert!(validate_id("abc").is_err());
    }

    #[test]
    fn test_access_token_prefers_flag() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "from-file").unwrap();

        let config = config(Some("from-flag"), Some(file.path().to_path_buf()));
        assert_eq!(config.access_token().unwrap(), "from-flag");
    }

    #[test]
    fn test_access_token_from_file_is_trimmed() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "  ya29.token  ").unwrap();

        let config = config(None, Some(file.path().to_path_buf()));
        assert_eq!(config.access_token().unwrap(), "ya29.token");
    }

    #[test]
    fn test_access_token_missing() {
        let config = config(None, None);
        assert!(matches!(config.access_token(), Err(Error::Auth { .. })));
    }

    #[test]
    fn test_access_token_empty() {
        let config = config(Some("   "), None);
        assert!(matches!(
            config.access_token(),
            Err(Error::Auth { message }) if message == "access token is empty"
        ));
    }

    #[test]
    fn test_access_token_unreadable_file() {
        let config = config(None, Some(PathBuf::from("/nonexistent/token")));
        assert!(matches!(config.access_token(), Err(Error::Auth { .. })));
    }
}
