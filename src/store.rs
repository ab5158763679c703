// VendorStore - the five vendor operations behind one seam
//
// Implemented by VendorRegistry (memory) and SqliteVendorStore (database).
// The HTTP layer only ever sees `Arc<dyn VendorStore>`.

use crate::entities::{NewVendor, Vendor, VendorFilter, VendorId, VendorPatch};
use crate::error::Result;

pub trait VendorStore: Send + Sync {
    /// Allocate an id, stamp `registered`, store name and comment verbatim.
    fn create(&self, new: NewVendor) -> Result<Vendor>;

    /// Fails with `StoreError::NotFound` for unknown or deleted ids.
    fn get(&self, id: VendorId) -> Result<Vendor>;

    /// Active vendors matching `filter`, ordered by id.
    fn list(&self, filter: &VendorFilter) -> Result<Vec<Vendor>>;

    /// Overwrite the fields set in `patch`; `id` and `registered` are kept.
    fn update(&self, id: VendorId, patch: VendorPatch) -> Result<Vendor>;

    /// Not idempotent: deleting twice fails the second time.
    fn delete(&self, id: VendorId) -> Result<()>;
}
