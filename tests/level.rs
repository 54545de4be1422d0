use zio_zstd::{cookie_of_logical, logical_of_cookie, Logical, DEFAULT_LEVEL};

#[test]
fn every_positive_level_maps_to_itself_as_a_cookie() {
    let levels = [
        Logical::Level1,
        Logical::Level3,
        Logical::Level9,
        Logical::Level19,
    ];
    let expected = [1, 3, 9, 19];
    for (level, cookie) in levels.iter().zip(expected) {
        assert_eq!(cookie_of_logical(*level), cookie);
        assert_eq!(logical_of_cookie(cookie), Some(*level));
    }
}

#[test]
fn inherit_and_default_never_surface_as_cookies_on_read() {
    // A cookie equal to the default level's own cookie is ambiguous
    // between "someone stored default explicitly" and "someone stored
    // INHERIT/DEFAULT" — that's expected, since both normalise to the same
    // on-wire cookie before being written.
    let default_cookie = cookie_of_logical(DEFAULT_LEVEL);
    assert_eq!(logical_of_cookie(default_cookie), Some(DEFAULT_LEVEL));
}
