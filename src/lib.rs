#![deny(unsafe_code)]

pub mod apple;
pub mod catalog;
pub mod command;
pub mod config;
pub mod env;
pub mod model;
pub mod opts;
pub mod runner;
pub mod selection;
pub mod util;

pub use self::{
    catalog::{DeviceCatalog, DisplayRow},
    model::{BatchReport, DeviceListModel, Event},
    runner::{ProcessRunner, Runner},
    selection::Selection,
};

use std::ffi::OsStr;

pub static NAME: &str = "simbatch";

trait DuctExpressionExt {
    fn vars(self, vars: impl IntoIterator<Item = (impl AsRef<OsStr>, impl AsRef<OsStr>)>) -> Self;
}

impl DuctExpressionExt for duct::Expression {
    fn vars(
        mut self,
        vars: impl IntoIterator<Item = (impl AsRef<OsStr>, impl AsRef<OsStr>)>,
    ) -> Self {
        for (key, val) in vars {
            self = self.env(&key, &val);
        }
        self
    }
}
