use clap::Subcommand;

pub mod inspect;
pub mod refine;
pub mod threadcount;

pub use inspect::InspectCMD;
pub use refine::{Refine, RefineCMD};
pub use threadcount::determine_thread_count;

///////////////////////////////
/// Possible subcommands to parse
#[derive(Subcommand)]
pub enum Commands {
    Refine(RefineCMD),
    Inspect(InspectCMD),
}
