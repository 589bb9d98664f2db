//! Conversions between A1-style cell references and 0-based (row, column) indexes.

/// Converts column letters ("A", "AB") to a 0-based column index.
pub(crate) fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || !letters.chars().all(|char| char.is_ascii_alphabetic()) {
        return None;
    }
    letters
        .to_ascii_uppercase()
        .bytes()
        .try_fold(0usize, |index, byte| {
            index.checked_mul(26)?.checked_add((byte - b'A') as usize + 1)
        })
        .map(|col| col - 1)
}

/// Converts a 1-based row number ("1", "42") to a 0-based row index.
pub(crate) fn row_to_index(number: &str) -> Option<usize> {
    number
        .parse::<usize>()
        .ok()
        .filter(|row| *row > 0)
        .map(|row| row - 1)
}

/// Splits a reference like "B12" into (row, column) indexes.
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let reference = reference.replace('$', "");
    let split = reference.find(|char: char| char.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    Some((row_to_index(digits)?, col_to_index(letters)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_references() {
        assert_eq!(reference_to_index("A1"), Some((0, 0)));
        assert_eq!(reference_to_index("I12"), Some((11, 8)));
        assert_eq!(reference_to_index("$AB$3"), Some((2, 27)));
        assert_eq!(reference_to_index("12"), None);
        assert_eq!(reference_to_index("A0"), None);
    }
}
