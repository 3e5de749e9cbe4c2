use super::{build_user_data, Bootstrapper};
use crate::{
  cluster::{ClusterSpec, NodeGroupSpec},
  error::{Error, Result},
  kubelet::Authenticator,
};

/// Bring-your-own-image bootstrapper
///
/// No default script is embedded for custom images - the node group supplies
/// the full bootstrap command, and only the standard configuration files and
/// caller hooks are assembled around it.
pub struct CustomBootstrapper<'a> {
  cluster: &'a ClusterSpec,
  node_group: &'a NodeGroupSpec,
}

impl<'a> CustomBootstrapper<'a> {
  pub fn new(cluster: &'a ClusterSpec, node_group: &'a NodeGroupSpec) -> Self {
    CustomBootstrapper { cluster, node_group }
  }
}

impl Bootstrapper for CustomBootstrapper<'_> {
  fn user_data(&self) -> Result<Vec<u8>> {
    if self.node_group.override_bootstrap_command.is_none() {
      return Err(Error::PreconditionFailed(
        "a custom OS family requires an override bootstrap command",
      ));
    }

    build_user_data(self.cluster, self.node_group, Authenticator::AwsIamAuthenticator, None)
  }
}
