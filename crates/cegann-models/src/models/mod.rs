mod gann;
mod gin;
mod rgcn;
mod sage;

pub use self::gann::Gann;
pub use self::gin::Gin;
pub use self::rgcn::Rgcn;
pub use self::sage::Sage;
