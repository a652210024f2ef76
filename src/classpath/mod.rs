//! Class index built from compiled archives

pub mod archive;
pub mod classfile;
pub mod descriptor_cache;
pub mod index;

pub use archive::{
    ArchiveEnumerator, FsArchiveEnumerator, IndexError, PlatformFilter, ProjectDescriptor,
    ProjectKind,
};
pub use classfile::ClassParseError;
pub use descriptor_cache::{CacheStats, DescriptorCache};
pub use index::{ClassEntry, ClassIndex, LoadOutcome, LoadReport};
