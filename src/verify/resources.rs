use super::{verify_status_code, Verifier};
use crate::client::{ObservedResponse, Resources};
use crate::verdict::VerifyError;
use md5::{Digest, Md5};
use reqwest::StatusCode;
use tracing::warn;

impl Verifier {
    /// Check the static assets a page load fetched.
    ///
    /// Every asset on the page's list is checked independently and every
    /// failure is reported. Cached (304) assets pass; fetched ones must be 200
    /// with the reference digest. Transient network failures come back as
    /// `VerifyError::Transient` so scoring can discount them.
    pub fn verify_resources(
        &self,
        page: &str,
        res: &ObservedResponse,
        resources: &Resources,
    ) -> Vec<VerifyError> {
        let manifest = &self.config().resources;
        let Some(assets) = manifest.pages.get(page) else {
            warn!(page = %page, "No resource list configured for page");
            return vec![VerifyError::Internal(format!(
                "no resource list for page {}",
                page
            ))];
        };

        assets
            .iter()
            .filter_map(|logical| self.check_resource(res, resources, logical).err())
            .collect()
    }

    fn check_resource(
        &self,
        res: &ObservedResponse,
        resources: &Resources,
        logical: &str,
    ) -> Result<(), VerifyError> {
        let manifest = &self.config().resources;
        let served = manifest.served_path(logical).ok_or_else(|| {
            VerifyError::Internal(format!("asset {} is not in the manifest", logical))
        })?;
        let url = res
            .url
            .join(&served)
            .map_err(|e| VerifyError::Internal(format!("cannot resolve {}: {}", served, e)))?;

        let fetched = match resources.get(url.as_str()) {
            Some(fetched) => fetched,
            None => {
                warn!(resource = %served, page = %res.url, "Resource not found in fetch results");
                return Err(VerifyError::checksum(
                    served,
                    "expected resource was not loaded",
                ));
            }
        };

        let response = match fetched {
            Ok(response) => response,
            Err(err) if err.is_transient() => {
                return Err(VerifyError::Transient {
                    resource: served,
                    source: err.clone(),
                });
            }
            Err(err) => {
                return Err(VerifyError::checksum(
                    served,
                    format!("failed to fetch resource: {}", err),
                ));
            }
        };

        if response.status == StatusCode::NOT_MODIFIED {
            return Ok(());
        }
        verify_status_code(response, StatusCode::OK)?;

        let path = response.url.path();
        let Some(expected) = manifest.digest(path) else {
            return Ok(());
        };
        let actual = format!("{:x}", Md5::digest(&response.body));
        if !expected.eq_ignore_ascii_case(&actual) {
            return Err(VerifyError::checksum(
                path,
                "checksum does not match the reference",
            ));
        }
        Ok(())
    }
}
