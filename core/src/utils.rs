pub fn strbool(value: &str) -> bool {
    ["true", "True", "t", "T", "1"].contains(&value.trim())
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("1", true)]
    #[case(" true ", true)]
    #[case("T", true)]
    #[case("0", false)]
    #[case("yes", false)]
    #[case("", false)]
    fn test_strbool(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(strbool(value), expected)
    }
}
