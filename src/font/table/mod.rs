pub mod cmap;
pub mod glyf;
pub mod head;
pub mod hhea;
pub mod hmtx;
pub mod loca;
pub mod maxp;
pub mod name;
pub mod os2;
pub mod post;

pub use cmap::Cmap;
pub use glyf::GlyfReader;
pub use head::Head;
pub use hhea::Hhea;
pub use hmtx::Hmtx;
pub use loca::Loca;
pub use maxp::Maxp;
pub use name::NameTable;
pub use os2::Os2;
pub use post::Post;
