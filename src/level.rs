//! Level Map — bidirectional translation between logical compression levels
//! and the codec's signed level cookies.
//!
//! The on-disk format stores the *logical* level as a single stable byte
//! (the block header's level field); the codec only ever sees the *cookie*
//! (a codec-internal `i32`, including negative "fast" levels). Keeping the
//! two separated means a future Zstd release renumbering its fast-level
//! cookies only touches the table in this module.

use crate::diagnostics::note;

/// Logical compression level, as stored (as a single byte) in the on-disk
/// block header.
///
/// A closed, append-only enumeration: each variant's discriminant is fixed
/// forever once shipped, since old on-disk blocks must keep decoding
/// correctly. New levels may only be appended after [`FastVeryCoarse1000`];
/// nothing here may ever be renumbered or removed.
///
/// [`FastVeryCoarse1000`]: Logical::FastVeryCoarse1000
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Logical {
    /// Inherit the compression setting from the containing dataset/dnode.
    /// Never appears in the cookie table or on disk as a stored level.
    Inherit = 0,
    /// Use whatever the system default positive level currently is.
    /// Never appears in the cookie table or on disk as a stored level.
    Default = 1,
    Level1 = 2,
    Level2 = 3,
    Level3 = 4,
    Level4 = 5,
    Level5 = 6,
    Level6 = 7,
    Level7 = 8,
    Level8 = 9,
    Level9 = 10,
    Level10 = 11,
    Level11 = 12,
    Level12 = 13,
    Level13 = 14,
    Level14 = 15,
    Level15 = 16,
    Level16 = 17,
    Level17 = 18,
    Level18 = 19,
    Level19 = 20,
    Fast1 = 21,
    Fast2 = 22,
    Fast3 = 23,
    Fast4 = 24,
    Fast5 = 25,
    Fast6 = 26,
    Fast7 = 27,
    Fast8 = 28,
    Fast9 = 29,
    Fast10 = 30,
    FastCoarse20 = 31,
    FastCoarse30 = 32,
    FastCoarse40 = 33,
    FastCoarse50 = 34,
    FastCoarse60 = 35,
    FastCoarse70 = 36,
    FastCoarse80 = 37,
    FastCoarse90 = 38,
    FastCoarse100 = 39,
    FastVeryCoarse500 = 40,
    FastVeryCoarse1000 = 41,
}

/// The system default positive compression level.
///
/// Referenced from two places historically (a literal `3` in one fallback
/// path and a named constant in another); this crate exposes it as a single
/// named constant so both call sites stay in lockstep.
pub const DEFAULT_LEVEL: Logical = Logical::Level3;

/// Static table mapping every non-sentinel [`Logical`] to its codec cookie.
///
/// Linear-scanned in both directions; at most 40 entries (19 positive + 10
/// fine fast + 9 coarse fast + 2 very-coarse fast), small enough that a hash
/// table buys nothing. `Inherit`/`Default` are intentionally absent: they
/// are resolved to [`DEFAULT_LEVEL`] before any lookup.
static LEVEL_TABLE: &[(Logical, i32)] = &[
    (Logical::Level1, 1),
    (Logical::Level2, 2),
    (Logical::Level3, 3),
    (Logical::Level4, 4),
    (Logical::Level5, 5),
    (Logical::Level6, 6),
    (Logical::Level7, 7),
    (Logical::Level8, 8),
    (Logical::Level9, 9),
    (Logical::Level10, 10),
    (Logical::Level11, 11),
    (Logical::Level12, 12),
    (Logical::Level13, 13),
    (Logical::Level14, 14),
    (Logical::Level15, 15),
    (Logical::Level16, 16),
    (Logical::Level17, 17),
    (Logical::Level18, 18),
    (Logical::Level19, 19),
    (Logical::Fast1, -1),
    (Logical::Fast2, -2),
    (Logical::Fast3, -3),
    (Logical::Fast4, -4),
    (Logical::Fast5, -5),
    (Logical::Fast6, -6),
    (Logical::Fast7, -7),
    (Logical::Fast8, -8),
    (Logical::Fast9, -9),
    (Logical::Fast10, -10),
    (Logical::FastCoarse20, -20),
    (Logical::FastCoarse30, -30),
    (Logical::FastCoarse40, -40),
    (Logical::FastCoarse50, -50),
    (Logical::FastCoarse60, -60),
    (Logical::FastCoarse70, -70),
    (Logical::FastCoarse80, -80),
    (Logical::FastCoarse90, -90),
    (Logical::FastCoarse100, -100),
    (Logical::FastVeryCoarse500, -500),
    (Logical::FastVeryCoarse1000, -1000),
];

impl Logical {
    /// The on-disk byte tag for this level. Stable forever per variant.
    #[inline]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Recovers a [`Logical`] from an on-disk byte tag.
    ///
    /// Returns `None` for any byte that is not a currently-known variant —
    /// the header codec treats that as `HeaderInvalid`.
    pub fn from_tag(tag: u8) -> Option<Logical> {
        use Logical::*;
        const ALL: &[Logical] = &[
            Inherit, Default, Level1, Level2, Level3, Level4, Level5, Level6, Level7, Level8,
            Level9, Level10, Level11, Level12, Level13, Level14, Level15, Level16, Level17,
            Level18, Level19, Fast1, Fast2, Fast3, Fast4, Fast5, Fast6, Fast7, Fast8, Fast9,
            Fast10, FastCoarse20, FastCoarse30, FastCoarse40, FastCoarse50, FastCoarse60,
            FastCoarse70, FastCoarse80, FastCoarse90, FastCoarse100, FastVeryCoarse500,
            FastVeryCoarse1000,
        ];
        ALL.iter().find(|l| l.tag() == tag).copied()
    }
}

/// Translates a codec cookie back to a logical level.
///
/// `INHERIT`/`DEFAULT` never appear in the table, so a cookie that isn't
/// found here indicates a corrupt frame — the caller (the header codec)
/// treats that as `HeaderInvalid`. A lookup miss emits one diagnostic line,
/// since it can only happen on read of a block this adapter did not itself
/// produce.
pub fn logical_of_cookie(cookie: i32) -> Option<Logical> {
    let found = LEVEL_TABLE
        .iter()
        .find(|(_, c)| *c == cookie)
        .map(|(logical, _)| *logical);
    if found.is_none() {
        note(&format!("level map: no logical level for cookie {cookie}"));
    }
    found
}

/// Translates a logical level to its codec cookie.
///
/// `Inherit` and `Default` are normalised to [`DEFAULT_LEVEL`]'s cookie
/// before lookup: the mapper never fails on these two sentinels.
pub fn cookie_of_logical(logical: Logical) -> i32 {
    let resolved = match logical {
        Logical::Inherit | Logical::Default => DEFAULT_LEVEL,
        other => other,
    };
    LEVEL_TABLE
        .iter()
        .find(|(l, _)| *l == resolved)
        .map(|(_, c)| *c)
        .expect("every non-sentinel Logical is present in LEVEL_TABLE")
}
