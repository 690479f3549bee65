//! Type-safe hardware object handles.
//!
//! Handles are strongly typed so that, for example, a queue handle cannot be
//! passed where a buffer-profile handle is expected. "No object" is expressed
//! as `Option::None` throughout; a handle value of zero is unrepresentable,
//! so a legitimately low handle can never collide with a null sentinel.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::num::NonZeroU64;

/// An untyped, guaranteed-non-null hardware handle.
///
/// This is the common currency stored in name registries, where entries of
/// different object kinds live behind the same map type. Converting back to
/// a typed handle is done with [`SaiObjectId::from_oid`] at the point where
/// the kind is known from context (the table the registry entry came from).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawOid(NonZeroU64);

impl RawOid {
    /// Creates a raw handle from a raw value.
    ///
    /// Returns `None` for 0, which the hardware ABI reserves for "no object".
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// Returns the raw handle value.
    pub const fn get(&self) -> u64 {
        self.0.get()
    }
}

impl fmt::Debug for RawOid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawOid(0x{:016x})", self.0.get())
    }
}

impl fmt::Display for RawOid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0.get())
    }
}

/// Marker trait for hardware object kinds.
pub trait SaiObjectKind: Send + Sync + 'static {
    /// Returns the object type name for debugging.
    fn type_name() -> &'static str;
}

/// A type-safe hardware object handle.
///
/// The phantom type parameter `T` records what kind of object the handle
/// refers to, so mixing kinds is a compile error:
///
/// ```
/// use swsm_sai::{BufferPoolOid, QueueOid};
///
/// let pool: BufferPoolOid = BufferPoolOid::from_raw(0x1000).unwrap();
/// let queue: QueueOid = QueueOid::from_raw(0x2000).unwrap();
///
/// // fn binds(q: QueueOid) {}
/// // binds(pool);  // Error: expected QueueOid, found BufferPoolOid
/// ```
#[derive(Clone, Copy)]
pub struct SaiObjectId<T: SaiObjectKind> {
    raw: NonZeroU64,
    _marker: PhantomData<T>,
}

impl<T: SaiObjectKind> SaiObjectId<T> {
    /// Creates a handle from a raw value. Returns `None` for 0.
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(|raw| Self {
            raw,
            _marker: PhantomData,
        })
    }

    /// Types an untyped registry handle.
    ///
    /// The caller asserts the kind from context; there is no runtime check.
    pub const fn from_oid(oid: RawOid) -> Self {
        Self {
            raw: oid.0,
            _marker: PhantomData,
        }
    }

    /// Returns the raw handle value.
    pub const fn as_raw(&self) -> u64 {
        self.raw.get()
    }

    /// Erases the kind for registry storage.
    pub const fn as_oid(&self) -> RawOid {
        RawOid(self.raw)
    }
}

impl<T: SaiObjectKind> From<SaiObjectId<T>> for RawOid {
    fn from(id: SaiObjectId<T>) -> Self {
        id.as_oid()
    }
}

impl<T: SaiObjectKind> fmt::Debug for SaiObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:016x})", T::type_name(), self.raw)
    }
}

impl<T: SaiObjectKind> fmt::Display for SaiObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.raw)
    }
}

impl<T: SaiObjectKind> PartialEq for SaiObjectId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T: SaiObjectKind> Eq for SaiObjectId<T> {}

impl<T: SaiObjectKind> Hash for SaiObjectId<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

macro_rules! define_object_kind {
    ($name:ident, $type_name:literal, $oid_alias:ident) => {
        /// Marker type for $type_name objects.
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl SaiObjectKind for $name {
            fn type_name() -> &'static str {
                $type_name
            }
        }

        /// Type alias for $type_name object handles.
        pub type $oid_alias = SaiObjectId<$name>;
    };
}

define_object_kind!(PortKind, "Port", PortOid);
define_object_kind!(QueueKind, "Queue", QueueOid);
define_object_kind!(
    IngressPriorityGroupKind,
    "IngressPriorityGroup",
    IngressPriorityGroupOid
);
define_object_kind!(BufferPoolKind, "BufferPool", BufferPoolOid);
define_object_kind!(BufferProfileKind, "BufferProfile", BufferProfileOid);
define_object_kind!(QosMapKind, "QosMap", QosMapOid);
define_object_kind!(SchedulerKind, "Scheduler", SchedulerOid);
define_object_kind!(WredKind, "Wred", WredOid);
