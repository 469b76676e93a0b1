#![doc = include_str!("../README.md")]

// -------------------------------------------------------------------------------------------------

mod client;
mod error;
mod publisher;

// -------------------------------------------------------------------------------------------------

use clap::Parser;
use std::path::Path;

use crate::{
    error::Error,
    publisher::{options::Options, publish_site},
};

fn main() -> Result<(), Error> {
    // get and validate args
    let options = Options::parse();
    if !Path::exists(&options.site) {
        return Err(Error::Options(format!(
            "site path does not exist: `{}`",
            options.site.as_path().to_string_lossy(),
        )));
    }
    // publish with options from args...
    publish_site(&options)
}
