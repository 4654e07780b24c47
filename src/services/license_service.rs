use serde::Serialize;

use super::HealthReport;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LicenseInfo {
    pub product: &'static str,
    pub version: &'static str,
    pub license: &'static str,
}

/// Reports the license the running build is distributed under.
#[derive(Debug, Clone)]
pub struct LicenseService {
    info: LicenseInfo,
}

impl LicenseService {
    pub fn new() -> Self {
        Self {
            info: LicenseInfo {
                product: env!("CARGO_PKG_NAME"),
                version: env!("CARGO_PKG_VERSION"),
                license: env!("CARGO_PKG_LICENSE"),
            },
        }
    }

    pub fn license(&self) -> &LicenseInfo {
        &self.info
    }

    pub fn health(&self) -> HealthReport {
        if self.info.license.is_empty() {
            HealthReport::unhealthy("license", "no license declared for this build")
        } else {
            HealthReport::healthy("license")
        }
    }
}

impl Default for LicenseService {
    fn default() -> Self {
        Self::new()
    }
}
