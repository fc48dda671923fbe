//! Local project tree: path model, selection, traversal, packaging

pub mod archive;
pub mod bundle;
pub mod path;
pub mod selection;
pub mod walker;

pub use archive::{Archive, ArchiveBuilder};
pub use bundle::{Attachment, BundleEntry, LocalBundle};
pub use path::{asset_path, classify, should_descend, Classification, CodeFile, ResourceId};
pub use selection::{Inclusion, SelectionPolicy};
pub use walker::{AssetWalker, WalkStats, WalkedFile};
