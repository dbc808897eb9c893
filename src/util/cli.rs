use crate::opts;
use colored::Colorize as _;
use std::fmt::{Debug, Display};
use structopt::{
    clap::{self, AppSettings},
    StructOpt,
};

pub static SETTINGS: &[AppSettings] = &[
    AppSettings::ColoredHelp,
    AppSettings::DeriveDisplayOrder,
    AppSettings::SubcommandRequiredElseHelp,
    AppSettings::VersionlessSubcommands,
];

pub mod colors {
    use colored::Color;

    pub const ERROR: Color = Color::BrightRed;
    pub const WARNING: Color = Color::BrightYellow;
    pub const ACTION_REQUEST: Color = Color::BrightMagenta;
    pub const VICTORY: Color = Color::BrightGreen;
}

#[derive(Clone, Copy, Debug, StructOpt)]
pub struct GlobalFlags {
    #[structopt(
        short = "v",
        long = "verbose",
        help = "Make life louder",
        global = true,
        multiple = true,
        parse(from_occurrences = opts::NoiseLevel::from_occurrences),
    )]
    pub noise_level: opts::NoiseLevel,
    #[structopt(
        long = "non-interactive",
        help = "Go with the flow",
        global = true,
        parse(from_flag = opts::Interactivity::from_flag),
    )]
    pub interactivity: opts::Interactivity,
}

pub type TextWrapper = textwrap::Wrapper<'static, textwrap::NoHyphenation>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Label {
    Error,
    ActionRequest,
    Victory,
}

impl Label {
    pub fn color(self) -> colored::Color {
        match self {
            Self::Error => colors::ERROR,
            Self::ActionRequest => colors::ACTION_REQUEST,
            Self::Victory => colors::VICTORY,
        }
    }

    pub fn exit_code(self) -> i8 {
        match self {
            Self::Victory => 0,
            _ => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::ActionRequest => "action request",
            Self::Victory => "victory",
        }
    }
}

/// Something the user should read, with a one-line summary and some details.
#[derive(Clone, Debug)]
pub struct Report {
    label: Label,
    msg: String,
    details: String,
}

impl Report {
    pub fn new(label: Label, msg: impl Display, details: impl Display) -> Self {
        Self {
            label,
            msg: msg.to_string(),
            details: details.to_string(),
        }
    }

    pub fn error(msg: impl Display, details: impl Display) -> Self {
        Self::new(Label::Error, msg, details)
    }

    pub fn action_request(msg: impl Display, details: impl Display) -> Self {
        Self::new(Label::ActionRequest, msg, details)
    }

    pub fn victory(msg: impl Display, details: impl Display) -> Self {
        Self::new(Label::Victory, msg, details)
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn msg(&self) -> &str {
        &self.msg
    }

    pub fn details(&self) -> &str {
        &self.details
    }

    pub fn exit_code(&self) -> i8 {
        self.label.exit_code()
    }

    fn format(&self, wrapper: &TextWrapper) -> String {
        static INDENT: &str = "    ";
        let head = if colored::control::SHOULD_COLORIZE.should_colorize() {
            wrapper.fill(&format!(
                "{} {}",
                format!("{}:", self.label.as_str())
                    .color(self.label.color())
                    .bold(),
                self.msg.as_str().bold()
            ))
        } else {
            wrapper.fill(&format!("{}: {}", self.label.as_str(), self.msg))
        };
        let wrapper = wrapper
            .clone()
            .initial_indent(INDENT)
            .subsequent_indent(INDENT);
        format!("{}\n{}\n", head, wrapper.fill(&self.details))
    }

    pub fn print(&self, wrapper: &TextWrapper) {
        let s = self.format(wrapper);
        if matches!(self.label, Label::Error) {
            eprint!("{}", s)
        } else {
            print!("{}", s)
        }
    }
}

pub trait Reportable: Debug {
    fn report(&self) -> Report;
}

impl Reportable for Report {
    fn report(&self) -> Report {
        self.clone()
    }
}

pub trait Exec: Debug + StructOpt {
    type Report: Reportable;

    fn global_flags(&self) -> GlobalFlags;

    fn exec(self, wrapper: &TextWrapper) -> Result<(), Self::Report>;
}

fn init_logging(noise_level: opts::NoiseLevel) {
    use env_logger::{Builder, Env};
    let env = Env::default().default_filter_or(noise_level.log_filter());
    Builder::from_env(env).init();
}

#[derive(Debug)]
enum Exit {
    Report(Report),
    Clap(clap::Error),
}

impl Exit {
    fn report(reportable: impl Reportable) -> Self {
        log::info!("exiting with {:#?}", reportable);
        Self::Report(reportable.report())
    }

    fn do_the_thing(self, wrapper: TextWrapper) -> ! {
        match self {
            Self::Report(report) => {
                report.print(&wrapper);
                // We only expose access to the 8 lsb of the exit code, since:
                // https://doc.rust-lang.org/std/process/fn.exit.html#platform-specific-behavior
                std::process::exit(report.exit_code() as i32)
            }
            Self::Clap(err) => err.exit(),
        }
    }

    fn main(inner: impl FnOnce(&TextWrapper) -> Result<(), Self>) {
        let wrapper = TextWrapper::with_splitter(textwrap::termwidth(), textwrap::NoHyphenation);
        if let Err(exit) = inner(&wrapper) {
            exit.do_the_thing(wrapper)
        }
    }
}

pub fn exec<E: Exec>() {
    Exit::main(|wrapper| {
        let input = E::from_iter_safe(std::env::args()).map_err(Exit::Clap)?;
        init_logging(input.global_flags().noise_level);
        input.exec(wrapper).map_err(Exit::report)
    })
}
