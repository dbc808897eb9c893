pub mod cli;
pub mod prompt;

use std::fmt::Display;

pub fn list_display(list: &[impl Display]) -> String {
    match list {
        [] => String::new(),
        [only] => only.to_string(),
        [first, second] => format!("{} and {}", first, second),
        [init @ .., last] => {
            let mut display = String::new();
            for item in init {
                display.push_str(&format!("{}, ", item));
            }
            display.push_str(&format!("and {}", last));
            display
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest(
        items,
        expected,
        case(&[], ""),
        case(&["A"], "A"),
        case(&["A", "B"], "A and B"),
        case(&["A", "B", "C"], "A, B, and C")
    )]
    fn joins_like_prose(items: &[&str], expected: &str) {
        assert_eq!(list_display(items), expected);
    }
}
