pub mod bootstrap;
pub mod cloudinit;
pub mod cluster;
pub mod ec2;
pub mod error;
pub mod kubelet;

pub use bootstrap::{generate_user_data, generate_user_data_with, BootstrapScripts, Bootstrapper};
pub use cluster::{ClusterSpec, NodeGroupSpec, NodeTaint, OsFamily};
pub use error::{Error, Result};
use rust_embed::RustEmbed;

/// Embeds the contents of the `files/` directory into the binary
///
/// This struct contains the default bootstrap scripts shipped with `eksboot`
#[derive(RustEmbed)]
#[folder = "files/"]
pub struct Assets;
