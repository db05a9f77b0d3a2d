pub mod password;

/// Collapse a user-supplied login handle: all whitespace is stripped before
/// lookups and token comparisons.
pub fn strip_whitespace(input: &str) -> String {
    input.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_whitespace_removes_inner_and_outer_spaces() {
        assert_eq!(strip_whitespace(" USER_01 "), "USER_01");
        assert_eq!(strip_whitespace("US ER\t_01\n"), "USER_01");
        assert_eq!(strip_whitespace("USER_01"), "USER_01");
    }
}
