use super::{build_user_data, script_contents, BootstrapScripts, Bootstrapper};
use crate::{
  cloudinit::Script,
  cluster::{ClusterSpec, NodeGroupSpec},
  error::Result,
  kubelet::Authenticator,
};

/// Ubuntu node bootstrapper
///
/// Covers 18.04 and 20.04. On 20.04 the kubelet resolver path additionally
/// defaults to the systemd-resolved stub unless the operator set one.
pub struct UbuntuBootstrapper<'a> {
  cluster: &'a ClusterSpec,
  node_group: &'a NodeGroupSpec,
  scripts: &'a dyn BootstrapScripts,
}

impl<'a> UbuntuBootstrapper<'a> {
  pub fn new(cluster: &'a ClusterSpec, node_group: &'a NodeGroupSpec, scripts: &'a dyn BootstrapScripts) -> Self {
    UbuntuBootstrapper {
      cluster,
      node_group,
      scripts,
    }
  }
}

impl Bootstrapper for UbuntuBootstrapper<'_> {
  fn user_data(&self) -> Result<Vec<u8>> {
    let script = match self.node_group.override_bootstrap_command {
      Some(_) => None,
      None => Some(Script::new(
        "bootstrap.ubuntu.sh",
        script_contents(self.scripts, self.node_group.ami_family)?,
      )),
    };

    build_user_data(self.cluster, self.node_group, Authenticator::AwsCli, script)
  }
}
