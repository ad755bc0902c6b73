use std::collections::HashMap;

use lazy_static::lazy_static;

// control keys the browser reports by name rather than as a character
const ENTER_KEY: u8 = b'\n';
const BACKSPACE_KEY: u8 = 0x08;
const TAB_KEY: u8 = b'\t';
const ESCAPE_KEY: u8 = 0x1B;
const DELETE_KEY: u8 = 0x7F;

lazy_static! {
    static ref ACTION_KEY_CODES: HashMap<&'static str, u8> = {
        let mut map = HashMap::new();
        map.insert("Enter", ENTER_KEY);
        map.insert("Backspace", BACKSPACE_KEY);
        map.insert("Tab", TAB_KEY);
        map.insert("Escape", ESCAPE_KEY);
        map.insert("Delete", DELETE_KEY);
        map
    };
}

/// Translate a browser key name into the byte the keyboard interrupt
/// deposits in the key buffer. Single characters map to their code point;
/// keys outside the byte range have no LS-8 representation.
pub fn get_key_code(key: &str) -> Option<u8> {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => u8::try_from(c as u32).ok(),
        _ => ACTION_KEY_CODES.get(key).copied(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_characters() {
        assert_eq!(Some(b'a'), get_key_code("a"));
        assert_eq!(Some(b'Z'), get_key_code("Z"));
        assert_eq!(Some(b' '), get_key_code(" "));
        assert_eq!(Some(b'7'), get_key_code("7"));
    }

    #[test]
    fn test_named_keys() {
        assert_eq!(Some(b'\n'), get_key_code("Enter"));
        assert_eq!(Some(0x08), get_key_code("Backspace"));
        assert_eq!(None, get_key_code("ArrowLeft"));
        assert_eq!(None, get_key_code("F1"));
    }
}
