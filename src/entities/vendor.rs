// 🏭 Vendor Entity - Stable identity + mutable values
//
// "Vendor id and registered are IDENTITY (never change), name and comment are VALUES"
//
// - id: assigned once by the store, never reused after delete
// - registered: stamped once at creation, survives every update
// - name / comment: overwritten by partial updates only

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::error::{Result, StoreError};
use crate::ids::{IdGenerator, SequentialIds};
use crate::store::VendorStore;

// ============================================================================
// IDENTITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VendorId(pub i64);

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// VENDOR ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vendor {
    // ========================================================================
    // IDENTITY (never changes)
    // ========================================================================
    pub id: VendorId,

    /// When the vendor was created, in UTC
    pub registered: DateTime<Utc>,

    // ========================================================================
    // VALUES (can change over time)
    // ========================================================================
    pub name: String,

    /// Free text, stored exactly as given
    pub comment: Option<String>,
}

impl Vendor {
    /// Apply a partial update in place. Identity fields are not reachable from a patch.
    pub fn apply(&mut self, patch: VendorPatch) {
        patch.name.apply_to(&mut self.name);
        patch.comment.apply_to(&mut self.comment);
    }
}

/// Payload for creating a vendor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVendor {
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
}

impl NewVendor {
    pub fn new(name: impl Into<String>) -> Self {
        NewVendor {
            name: name.into(),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

// ============================================================================
// PARTIAL UPDATE
// ============================================================================

/// One field of a partial update: either left alone or overwritten.
///
/// For optional columns use `Field<Option<T>>`, so `Set(None)` clears the
/// value while `Unchanged` keeps it. Deserializing a present JSON key always
/// yields `Set`; combine with `#[serde(default)]` to get `Unchanged` for
/// missing keys.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Field<T> {
    #[default]
    Unchanged,
    Set(T),
}

impl<T> Field<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Field::Set(_))
    }

    pub fn apply_to(self, target: &mut T) {
        if let Field::Set(value) = self {
            *target = value;
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        T::deserialize(deserializer).map(Field::Set)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VendorPatch {
    pub name: Field<String>,
    pub comment: Field<Option<String>>,
}

impl VendorPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Field::Set(name.into());
        self
    }

    pub fn comment(mut self, comment: Option<impl Into<String>>) -> Self {
        self.comment = Field::Set(comment.map(Into::into));
        self
    }

    pub fn is_empty(&self) -> bool {
        !self.name.is_set() && !self.comment.is_set()
    }
}

// ============================================================================
// FILTER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct VendorFilter {
    /// Exact, case-sensitive match on name
    #[serde(default)]
    pub name: Option<String>,
}

impl VendorFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        VendorFilter {
            name: Some(name.into()),
        }
    }

    pub fn matches(&self, vendor: &Vendor) -> bool {
        match &self.name {
            Some(name) => vendor.name == *name,
            None => true,
        }
    }
}

// ============================================================================
// VENDOR REGISTRY (in-memory store)
// ============================================================================

/// In-memory vendor store
///
/// Records live in a map keyed by id, so listing is ordered by id. Every
/// operation takes the lock once, which makes each one atomic with respect
/// to the others.
pub struct VendorRegistry<C = SystemClock, G = SequentialIds> {
    vendors: RwLock<BTreeMap<VendorId, Vendor>>,
    clock: C,
    ids: G,
}

impl VendorRegistry {
    pub fn new() -> Self {
        Self::with_parts(SystemClock, SequentialIds::new())
    }
}

impl Default for VendorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock, G: IdGenerator> VendorRegistry<C, G> {
    pub fn with_parts(clock: C, ids: G) -> Self {
        VendorRegistry {
            vendors: RwLock::new(BTreeMap::new()),
            clock,
            ids,
        }
    }

    /// Count active vendors
    pub fn count(&self) -> usize {
        self.vendors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<C: Clock, G: IdGenerator> VendorStore for VendorRegistry<C, G> {
    fn create(&self, new: NewVendor) -> Result<Vendor> {
        let vendor = Vendor {
            id: self.ids.next_id(),
            registered: self.clock.now(),
            name: new.name,
            comment: new.comment,
        };

        self.vendors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(vendor.id, vendor.clone());

        debug!(vendor_id = %vendor.id, "vendor created");
        Ok(vendor)
    }

    fn get(&self, id: VendorId) -> Result<Vendor> {
        self.vendors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn list(&self, filter: &VendorFilter) -> Result<Vec<Vendor>> {
        let vendors = self.vendors.read().unwrap_or_else(PoisonError::into_inner);
        Ok(vendors
            .values()
            .filter(|v| filter.matches(v))
            .cloned()
            .collect())
    }

    fn update(&self, id: VendorId, patch: VendorPatch) -> Result<Vendor> {
        let mut vendors = self.vendors.write().unwrap_or_else(PoisonError::into_inner);
        let vendor = vendors.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        vendor.apply(patch);

        debug!(vendor_id = %id, "vendor updated");
        Ok(vendor.clone())
    }

    fn delete(&self, id: VendorId) -> Result<()> {
        self.vendors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .ok_or(StoreError::NotFound(id))?;

        debug!(vendor_id = %id, "vendor deleted");
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
