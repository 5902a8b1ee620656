use ::anyhow::Result;
use ::log::warn;
use ::serde::Deserialize;
use ::serde_json::{json, Value};
use ::std::sync::Arc;
use ::std::time::SystemTime;

use crate::crypto::CredentialCipher;
use crate::model::{urls_equal, ExclusionSet, Site};
use crate::options::OptionsStore;

pub const OPTION_SITES: &str = "syndicate_sites";
pub const OPTION_CREDENTIAL: &str = "syndicate_credential";
pub const OPTION_EXCLUSIONS: &str = "syndicate_exclusions";
pub const OPTION_KEYWORDS_PREFIX: &str = "syndicate_keywords_";

/// Partial patch applied to a registered site.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct SitePatch {
    pub url: Option<String>,
    pub credential: Option<String>,
    pub name: Option<String>,
}

/// All registry state lives in the options store; credentials are encrypted
/// before they go in and decrypted only at the point of use.
pub struct SiteRegistry {
    options: Arc<dyn OptionsStore>,
    cipher: CredentialCipher,
}

impl SiteRegistry {
    pub fn new(options: Arc<dyn OptionsStore>, cipher: CredentialCipher) -> SiteRegistry {
        SiteRegistry { options, cipher }
    }

    /// Registered sites as stored, credentials still encrypted.
    pub async fn sites(&self) -> Result<Vec<Site>> {
        match self.options.get(OPTION_SITES).await? {
            Some(value) => Ok(::serde_json::from_value(value)?),
            None => Ok(vec![]),
        }
    }

    /// A single site with its credential decrypted. An undecryptable
    /// credential comes back empty, which downstream treats the same as a
    /// site that never had one.
    pub async fn site(&self, id: i64) -> Result<Option<Site>> {
        let sites = self.sites().await?;

        let mut site = match sites.into_iter().find(|site| site.id == id) {
            Some(site) => site,
            None => return Ok(None),
        };

        site.credential = match self.cipher.decrypt(&site.credential) {
            Ok(plain) => plain,
            Err(err) => {
                warn!("credential for site {} is undecryptable: {}", id, err);
                String::new()
            }
        };

        Ok(Some(site))
    }

    /// Registers a peer. Ids are assigned max-existing-plus-one and never
    /// reused downward.
    pub async fn add_site(&self, url: &str, credential: &str, name: &str) -> Result<i64> {
        let mut sites = self.sites().await?;

        let id = sites.iter().map(|site| site.id).max().unwrap_or(0) + 1;

        sites.push(Site {
            id,
            url: url.trim().to_string(),
            credential: self.cipher.encrypt(credential)?,
            name: name.trim().to_string(),
            created_unix: unix_now(),
        });

        self.options
            .set(OPTION_SITES, ::serde_json::to_value(&sites)?)
            .await?;

        Ok(id)
    }

    /// Applies a partial patch. Returns false when no site has the id.
    pub async fn update_site(&self, id: i64, patch: &SitePatch) -> Result<bool> {
        let mut sites = self.sites().await?;

        let site = match sites.iter_mut().find(|site| site.id == id) {
            Some(site) => site,
            None => return Ok(false),
        };

        if let Some(url) = &patch.url {
            site.url = url.trim().to_string();
        }
        if let Some(credential) = &patch.credential {
            site.credential = self.cipher.encrypt(credential)?;
        }
        if let Some(name) = &patch.name {
            site.name = name.trim().to_string();
        }

        self.options
            .set(OPTION_SITES, ::serde_json::to_value(&sites)?)
            .await?;

        Ok(true)
    }

    /// Removes a site and its keyword list. Returns false when no site has
    /// the id.
    pub async fn delete_site(&self, id: i64) -> Result<bool> {
        let mut sites = self.sites().await?;
        let before = sites.len();
        sites.retain(|site| site.id != id);

        if sites.len() == before {
            return Ok(false);
        }

        self.options
            .set(OPTION_SITES, ::serde_json::to_value(&sites)?)
            .await?;

        self.options.delete(&keywords_option(id)).await?;

        Ok(true)
    }

    pub async fn keywords(&self, site_id: i64) -> Result<Vec<String>> {
        let value = match self.options.get(&keywords_option(site_id)).await? {
            Some(value) => value,
            None => return Ok(vec![]),
        };

        // Stored as an array, but tolerate a comma-separated string from
        // older installs.
        let raw: Vec<String> = match value {
            Value::String(csv) => csv.split(',').map(|part| part.to_string()).collect(),
            other => ::serde_json::from_value(other)?,
        };

        Ok(raw
            .iter()
            .map(|keyword| keyword.trim().to_string())
            .filter(|keyword| !keyword.is_empty())
            .collect())
    }

    pub async fn save_keywords(&self, site_id: i64, keywords: &[String]) -> Result<()> {
        let cleaned: Vec<String> = keywords
            .iter()
            .map(|keyword| keyword.trim().to_string())
            .filter(|keyword| !keyword.is_empty())
            .collect();

        self.options
            .set(&keywords_option(site_id), json!(cleaned))
            .await
    }

    /// Keyword list used to filter a payload claiming `origin_url` as its
    /// origin. An unmatched origin borrows the first registered site's list;
    /// see DESIGN.md for why that behavior is kept.
    pub async fn keywords_for_origin(&self, origin_url: &str) -> Result<Vec<String>> {
        let sites = self.sites().await?;

        let matched = sites
            .iter()
            .find(|site| urls_equal(&site.url, origin_url))
            .or_else(|| sites.first());

        match matched {
            Some(site) => self.keywords(site.id).await,
            None => Ok(vec![]),
        }
    }

    pub async fn exclusions(&self) -> Result<ExclusionSet> {
        match self.options.get(OPTION_EXCLUSIONS).await? {
            Some(value) => Ok(::serde_json::from_value(value)?),
            None => Ok(ExclusionSet::default()),
        }
    }

    pub async fn save_exclusions(&self, exclusions: &ExclusionSet) -> Result<()> {
        self.options
            .set(OPTION_EXCLUSIONS, ::serde_json::to_value(exclusions)?)
            .await
    }

    /// This instance's own inbound credential, decrypted. Missing or
    /// undecryptable values come back as None, which rejects every inbound
    /// delivery until a new credential is issued.
    pub async fn own_credential(&self) -> Result<Option<String>> {
        let value = match self.options.get(OPTION_CREDENTIAL).await? {
            Some(Value::String(blob)) => blob,
            Some(_) | None => return Ok(None),
        };

        match self.cipher.decrypt(&value) {
            Ok(plain) => Ok(Some(plain)),
            Err(err) => {
                warn!("own credential is undecryptable: {}", err);
                Ok(None)
            }
        }
    }

    pub async fn set_own_credential(&self, credential: &str) -> Result<()> {
        self.options
            .set(OPTION_CREDENTIAL, json!(self.cipher.encrypt(credential)?))
            .await
    }

    /// Issues a credential on first start; subsequent starts keep the
    /// existing one.
    pub async fn ensure_own_credential(&self) -> Result<String> {
        if let Some(existing) = self.own_credential().await? {
            return Ok(existing);
        }

        let credential = crate::crypto::generate_credential();
        self.set_own_credential(&credential).await?;
        Ok(credential)
    }
}

fn keywords_option(site_id: i64) -> String {
    format!("{}{}", OPTION_KEYWORDS_PREFIX, site_id)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
