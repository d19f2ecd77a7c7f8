/// Semantic annotation on a scalar value.
///
/// A tag records the intended interpretation of a value (a date-time string,
/// an epoch timestamp, base-encoded bytes, an arbitrary-precision number)
/// without changing the stored bytes. Parsers attach tags when the wire
/// format carries an equivalent marker (CBOR tags, MessagePack timestamps,
/// BSON datetimes); encoders map them back where the target format can, and
/// otherwise write the nearest native kind.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub enum SemanticTag {
    #[default]
    None,
    /// RFC 3339 date-time string.
    DateTime,
    /// Seconds since the Unix epoch.
    EpochSeconds,
    /// Milliseconds since the Unix epoch.
    EpochMillis,
    /// Nanoseconds since the Unix epoch.
    EpochNanos,
    /// Byte string rendered as base16 in text formats.
    Base16,
    /// Byte string rendered as base64 in text formats.
    Base64,
    /// Byte string rendered as base64url in text formats.
    Base64Url,
    /// Arbitrary-precision integer stored as a decimal string.
    BigInt,
    /// Arbitrary-precision decimal stored as a decimal string.
    BigDec,
    /// 128-bit floating point literal stored as a string.
    Float128,
    /// String known to need no escaping when written as text.
    NoEsc,
}

impl SemanticTag {
    /// Returns `true` if this tag marks an epoch timestamp.
    pub const fn is_epoch(self) -> bool {
        matches!(
            self,
            Self::EpochSeconds | Self::EpochMillis | Self::EpochNanos
        )
    }

    /// Returns `true` if this tag selects a base-N rendering for byte strings.
    pub const fn is_base_encoding(self) -> bool {
        matches!(self, Self::Base16 | Self::Base64 | Self::Base64Url)
    }

    /// Returns `true` if this tag marks an arbitrary-precision number stored
    /// as a decimal string.
    pub const fn is_big_number(self) -> bool {
        matches!(self, Self::BigInt | Self::BigDec | Self::Float128)
    }
}

/// The physical storage kind of a [`Value`](crate::Value).
///
/// Short vs. long string storage is an implementation detail: two strings
/// with the same contents compare equal whichever storage they use, and
/// `Kind` is the only way to observe the difference.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Kind {
    Null,
    Bool,
    Int64,
    UInt64,
    Double,
    /// String stored inline in the value cell, no heap allocation.
    ShortString,
    /// String stored on the heap, owned or shared.
    LongString,
    ByteString,
    Array,
    Object,
}

impl Kind {
    /// Returns `true` for the numeric kinds.
    pub const fn is_number(self) -> bool {
        matches!(self, Self::Int64 | Self::UInt64 | Self::Double)
    }

    /// Returns `true` for both string storage kinds.
    pub const fn is_string(self) -> bool {
        matches!(self, Self::ShortString | Self::LongString)
    }

    /// Returns `true` if values of this kind own child values.
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Array | Self::Object)
    }

    pub(crate) const fn description(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Int64 => "int64",
            Kind::UInt64 => "uint64",
            Kind::Double => "double",
            Kind::ShortString | Kind::LongString => "string",
            Kind::ByteString => "byte string",
            Kind::Array => "array",
            Kind::Object => "object",
        }
    }
}
