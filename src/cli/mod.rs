mod dispatch;
mod parse;

pub use crate::cli::dispatch::dispatch;
pub use crate::cli::parse::parse_from_safe;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Command {
    pub group: String,
    pub regions: Vec<String>,
    pub ports: Vec<u16>,
    pub url: String,
    pub profile: Option<String>,
}
