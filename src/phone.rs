//! Phone number normalization.

/// Groups a bare 5 or 6 digit number into the directory's dashed form.
///
/// Text already containing `-` is returned unchanged. Otherwise every
/// non-digit is stripped: six digits become `DD-DD-DD`, five become
/// `D-DD-DD`, and anything else comes back trimmed but unmodified.
///
/// ```
/// use staff_directory::format_phone;
///
/// assert_eq!(format_phone("123456"), "12-34-56");
/// assert_eq!(format_phone("12345"), "1-23-45");
/// assert_eq!(format_phone("12-34-56"), "12-34-56");
/// assert_eq!(format_phone(" доб. 7 "), "доб. 7");
/// ```
pub fn format_phone(raw: &str) -> String {
    if raw.contains('-') {
        return raw.to_owned();
    }
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    match digits.len() {
        6 => format!("{}-{}-{}", &digits[0..2], &digits[2..4], &digits[4..6]),
        5 => format!("{}-{}-{}", &digits[0..1], &digits[1..3], &digits[3..5]),
        _ => raw.trim().to_owned(),
    }
}

/// True when `value` is a non-empty run of ASCII digits, the only shape the
/// mapper reformats.
pub(crate) fn is_bare_number(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
}
