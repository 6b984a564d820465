//! Advisory document parsers, one module per vendor page family

pub mod apache;
pub mod html;
pub mod ibm;
pub mod mariadb;
pub mod oracle;
pub mod redhat;
pub mod traits;

pub use traits::{AdvisoryParser, ParserKind, RequestContext};
