// Entity Models
// Identity (id, registered) persists; values (name, comment) change.

pub mod vendor;

pub use vendor::{Field, NewVendor, Vendor, VendorFilter, VendorId, VendorPatch, VendorRegistry};
