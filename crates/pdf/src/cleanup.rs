use unicode_normalization::UnicodeNormalization;

const LIGATURES: &[(char, &str)] = &[
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
];

/// Normalize the text of one decoded run before it is split into glyphs.
///
/// NFC composition, ligature expansion, and removal of U+FFFD.
pub fn clean_run(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.nfc() {
        match LIGATURES.iter().find(|(lig, _)| *lig == c) {
            Some((_, expanded)) => out.push_str(expanded),
            None if c == '\u{FFFD}' => {}
            None => out.push(c),
        }
    }
    out
}
