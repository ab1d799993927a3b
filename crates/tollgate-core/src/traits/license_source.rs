use std::future::Future;

use crate::errors::TollgateResult;
use crate::models::License;

/// Supplies fresh licenses from the billing backend. The governor never
/// talks to the network itself; it asks an implementation of this.
pub trait ILicenseSource: Send + Sync {
    fn fetch_license(&self) -> impl Future<Output = TollgateResult<License>> + Send;
}
