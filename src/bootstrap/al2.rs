use super::{build_user_data, script_contents, BootstrapScripts, Bootstrapper};
use crate::{
  cloudinit::Script,
  cluster::{ClusterSpec, NodeGroupSpec, OsFamily},
  error::Result,
  kubelet::Authenticator,
};

/// Amazon Linux 2 node bootstrapper
pub struct AmazonLinux2Bootstrapper<'a> {
  cluster: &'a ClusterSpec,
  node_group: &'a NodeGroupSpec,
  scripts: &'a dyn BootstrapScripts,
}

impl<'a> AmazonLinux2Bootstrapper<'a> {
  pub fn new(cluster: &'a ClusterSpec, node_group: &'a NodeGroupSpec, scripts: &'a dyn BootstrapScripts) -> Self {
    AmazonLinux2Bootstrapper {
      cluster,
      node_group,
      scripts,
    }
  }
}

impl Bootstrapper for AmazonLinux2Bootstrapper<'_> {
  fn user_data(&self) -> Result<Vec<u8>> {
    let script = match self.node_group.override_bootstrap_command {
      Some(_) => None,
      None => Some(Script::new(
        "bootstrap.al2.sh",
        script_contents(self.scripts, OsFamily::AmazonLinux2)?,
      )),
    };

    build_user_data(self.cluster, self.node_group, Authenticator::AwsIamAuthenticator, script)
  }
}
