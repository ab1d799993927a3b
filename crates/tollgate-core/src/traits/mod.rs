mod cache_tier;
mod license_source;

pub use cache_tier::ICacheTier;
pub use license_source::ILicenseSource;
