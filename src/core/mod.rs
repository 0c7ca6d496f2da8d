pub mod harness;
pub mod propagation;

pub use crate::domain::model::{BasePathMapping, CommandOutput, CommandSpec, DomainReport};
pub use crate::domain::ports::{CommandRunner, DnsProbe, DomainLookup, HttpProbe};
pub use crate::utils::error::Result;
