use std::path::PathBuf;

// -------------------------------------------------------------------------------------------------

/// Options for the site publisher.
///
/// Includes clap argument definitions, when using the publisher from the command line.
/// The server options can also be picked up from the environment, which keeps access
/// tokens out of shell history and CI logs.
#[derive(clap::Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Options {
    /// Base URL of the LMS server, e.g. `https://lms.example.edu`.
    #[arg(long, env = "LMS_URL")]
    pub lms_url: String,
    /// API access token of an account allowed to manage the course.
    #[arg(long, env = "LMS_TOKEN", hide_env_values = true)]
    pub lms_token: String,
    /// Numeric id of the course to publish into.
    #[arg(long, env = "LMS_COURSE_ID")]
    pub course_id: u64,
    /// Root directory of the rendered site.
    #[arg(name = "site_path", default_value = "site")]
    pub site: PathBuf,
}

// -------------------------------------------------------------------------------------------------
