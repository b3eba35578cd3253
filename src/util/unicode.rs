//! Unicode utilities
//!
//! Code point classification for the lexer.

/// Check if a code point is a line terminator
#[inline]
pub fn is_line_terminator(c: u32) -> bool {
    matches!(c, 0x000A | 0x000D | 0x2028 | 0x2029)
}

/// Check if a code point is whitespace
#[inline]
pub fn is_whitespace(c: u32) -> bool {
    matches!(
        c,
        0x0009  // Tab
        | 0x000B // Vertical Tab
        | 0x000C // Form Feed
        | 0x0020 // Space
        | 0x00A0 // No-Break Space
        | 0xFEFF // BOM
    ) || is_line_terminator(c)
        || is_unicode_space(c)
}

/// Check if a code point is a Unicode space character
#[inline]
pub fn is_unicode_space(c: u32) -> bool {
    matches!(c, 0x1680 | 0x2000..=0x200A | 0x202F | 0x205F | 0x3000)
}

/// Check if a code point can start an identifier
#[inline]
pub fn is_id_start(c: u32) -> bool {
    c == u32::from(b'_') || char::from_u32(c).is_some_and(char::is_alphabetic)
}

/// Check if a code point can continue an identifier
#[inline]
pub fn is_id_continue(c: u32) -> bool {
    c == u32::from(b'_') || char::from_u32(c).is_some_and(char::is_alphanumeric)
}

/// Check if a byte renders as itself when printed
#[inline]
pub fn is_printable_ascii(b: u8) -> bool {
    (0x20..0x7F).contains(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace() {
        assert!(is_whitespace(' ' as u32));
        assert!(is_whitespace('\t' as u32));
        assert!(is_whitespace('\n' as u32));
        assert!(is_whitespace(0x3000));
        assert!(!is_whitespace('a' as u32));
    }

    #[test]
    fn test_identifier_classes() {
        assert!(is_id_start('a' as u32));
        assert!(is_id_start('_' as u32));
        assert!(is_id_start('é' as u32));
        assert!(!is_id_start('1' as u32));
        assert!(!is_id_start('$' as u32));

        assert!(is_id_continue('1' as u32));
        assert!(is_id_continue('_' as u32));
        assert!(is_id_continue('ж' as u32));
        assert!(!is_id_continue('.' as u32));
    }

    #[test]
    fn test_printable() {
        assert!(is_printable_ascii(b' '));
        assert!(is_printable_ascii(b'~'));
        assert!(!is_printable_ascii(b'\n'));
        assert!(!is_printable_ascii(0x7F));
        assert!(!is_printable_ascii(0xE9));
    }
}
