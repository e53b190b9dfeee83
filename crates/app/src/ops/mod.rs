pub mod cid;
pub mod hash;
pub mod init;
pub mod ls;
pub mod reveal;
pub mod submit;
pub mod version;

pub use cid::Cid;
pub use hash::Hash;
pub use init::Init;
pub use ls::Ls;
pub use reveal::Reveal;
pub use submit::Submit;
pub use version::Version;
