// -----------------------------------------------------------------------------
// RepeatedObjectPolicy

/// What a session does when nesting goes beyond [`Settings::depth_limit`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepeatedObjectPolicy {
    /// Omit the content of the too-deep structure and continue.
    ///
    /// Only formats that can express an empty structure honor this;
    /// the binary format is positional and always fails.
    #[default]
    Skip,
    /// Abort with [`Error::DepthExceeded`](crate::Error::DepthExceeded).
    Fail,
}

// -----------------------------------------------------------------------------
// Settings

/// Options shared by every reader and writer.
///
/// One instance is bound to a session and is never changed during a call.
///
/// # Examples
///
/// ```
/// use vc_serial::{RepeatedObjectPolicy, Settings};
///
/// const COMPACT: Settings = Settings::new()
///     .with_varint(true)
///     .with_omit_member_names(true)
///     .with_depth_limit(16)
///     .with_repeated_object_policy(RepeatedObjectPolicy::Fail);
///
/// assert!(COMPACT.encode_integers_as_varint);
/// assert!(COMPACT.little_endian);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Write 16/32/64-bit integers as base-128 varints.
    pub encode_integers_as_varint: bool,
    /// Byte order of fixed-width integers and floats.
    pub little_endian: bool,
    /// Do not write type metadata for statically known composites.
    pub omit_type_tag: bool,
    /// Do not write member names before member values (binary only).
    pub omit_member_names: bool,
    /// Optional values must be present; no presence byte is written.
    pub required: bool,
    /// Maximum nesting of composites, sequences and maps.
    pub depth_limit: usize,
    /// Behavior once [`depth_limit`](Self::depth_limit) is exceeded.
    pub repeated_object_policy: RepeatedObjectPolicy,
    /// Escape every non-ASCII character as `\uXXXX` (JSON only).
    pub encode_unicode: bool,
}

impl Default for Settings {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Settings {
    pub const DEFAULT_DEPTH_LIMIT: usize = 64;

    /// Creates the default settings.
    #[inline]
    pub const fn new() -> Self {
        Self {
            encode_integers_as_varint: false,
            little_endian: true,
            omit_type_tag: false,
            omit_member_names: false,
            required: false,
            depth_limit: Self::DEFAULT_DEPTH_LIMIT,
            repeated_object_policy: RepeatedObjectPolicy::Skip,
            encode_unicode: false,
        }
    }

    #[inline]
    pub const fn with_varint(mut self, enabled: bool) -> Self {
        self.encode_integers_as_varint = enabled;
        self
    }

    #[inline]
    pub const fn with_little_endian(mut self, enabled: bool) -> Self {
        self.little_endian = enabled;
        self
    }

    #[inline]
    pub const fn with_omit_type_tag(mut self, enabled: bool) -> Self {
        self.omit_type_tag = enabled;
        self
    }

    #[inline]
    pub const fn with_omit_member_names(mut self, enabled: bool) -> Self {
        self.omit_member_names = enabled;
        self
    }

    #[inline]
    pub const fn with_required(mut self, enabled: bool) -> Self {
        self.required = enabled;
        self
    }

    #[inline]
    pub const fn with_depth_limit(mut self, limit: usize) -> Self {
        self.depth_limit = limit;
        self
    }

    #[inline]
    pub const fn with_repeated_object_policy(mut self, policy: RepeatedObjectPolicy) -> Self {
        self.repeated_object_policy = policy;
        self
    }

    #[inline]
    pub const fn with_encode_unicode(mut self, enabled: bool) -> Self {
        self.encode_unicode = enabled;
        self
    }
}
