//! Built-in field grammars.
//!
//! Phone patterns follow the regional mobile-number formats commonly accepted
//! by form validators; the region is picked through configuration.

/// A regional mobile-number grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhonePattern {
    /// Locale-style region code, e.g. `id-ID`.
    pub region: &'static str,

    /// Human readable description.
    pub description: &'static str,

    /// Anchored regex source.
    pub pattern: &'static str,
}

/// Default region for phone validation.
pub const DEFAULT_PHONE_REGION: &str = "id-ID";

/// All supported phone regions.
pub const PHONE_PATTERNS: &[PhonePattern] = &[
    PhonePattern {
        region: "id-ID",
        description: "Indonesian mobile numbers (08xx or +628xx)",
        pattern: r"^(\+?62|0)8(1[123456789]|2[1238]|3[1238]|5[12356789]|7[78]|9[56789]|8[123456789])([\s?|\d]{5,11})$",
    },
    PhonePattern {
        region: "en-US",
        description: "North American numbers with optional +1",
        pattern: r"^((\+1|1)?( |-)?)?(\([2-9][0-9]{2}\)|[2-9][0-9]{2})( |-)?([2-9][0-9]{2}( |-)?[0-9]{4})$",
    },
    PhonePattern {
        region: "en-GB",
        description: "UK mobile numbers (07xxx or +447xxx)",
        pattern: r"^(\+?44|0)7\d{9}$",
    },
    PhonePattern {
        region: "en-SG",
        description: "Singapore numbers with optional +65",
        pattern: r"^(\+65)?[3689]\d{7}$",
    },
    PhonePattern {
        region: "ms-MY",
        description: "Malaysian mobile numbers (01x or +601x)",
        pattern: r"^(\+?60|0)1(([0145](-|\s)?\d{7,8})|([236-9](-|\s)?\d{7}))$",
    },
];

/// Email address grammar: dot-atom local part and a dotted host name with an
/// alphabetic top-level label.
pub const EMAIL_PATTERN: &str = r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$";

/// Longest accepted email address.
pub const EMAIL_MAX_LEN: usize = 254;

/// Longest accepted local part (before the `@`).
pub const EMAIL_LOCAL_MAX_LEN: usize = 64;

/// Look up the phone grammar for a region code.
#[must_use]
pub fn phone_pattern(region: &str) -> Option<&'static PhonePattern> {
    PHONE_PATTERNS.iter().find(|p| p.region == region)
}

/// Region codes accepted by [`phone_pattern`].
#[must_use]
pub fn supported_regions() -> Vec<&'static str> {
    PHONE_PATTERNS.iter().map(|p| p.region).collect()
}
