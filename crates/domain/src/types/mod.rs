//! Domain data types.

pub mod bulk;
pub mod credentials;
pub mod population;
pub mod record;
