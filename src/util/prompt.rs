use colored::Colorize as _;
use std::{
    fmt::Display,
    io::{self, Write},
};

pub fn minimal(msg: impl Display) -> io::Result<String> {
    let mut input = String::new();
    print!("{}: ", msg);
    io::stdout().flush()?;
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_owned())
}

fn interpret_yes_no(response: &str, default: Option<bool>) -> Option<bool> {
    if response.eq_ignore_ascii_case("y") || response.eq_ignore_ascii_case("yes") {
        Some(true)
    } else if response.eq_ignore_ascii_case("n") || response.eq_ignore_ascii_case("no") {
        Some(false)
    } else if response.is_empty() {
        default
    } else {
        None
    }
}

/// `None` means the answer was neither yes nor no, and there was no default
/// to fall back on.
pub fn yes_no(msg: impl Display, default: Option<bool>) -> io::Result<Option<bool>> {
    let y_n = match default {
        Some(true) => "[Y/n]",
        Some(false) => "[y/N]",
        None => "[y/n]",
    };
    minimal(format!("{} {}", msg, y_n)).map(|response| {
        let answer = interpret_yes_no(&response, default);
        if answer.is_none() {
            println!("{:?} isn't a yes or a no, so that's a no.", response);
        }
        answer
    })
}

pub fn list_display_only(choices: impl Iterator<Item = impl Display>, choice_count: usize) {
    if choice_count > 0 {
        for (index, choice) in choices.enumerate() {
            println!("  [{}] {}", index.to_string().green(), choice);
        }
    } else {
        println!("  -- none --");
    }
}
