mod al2;
mod custom;
mod ubuntu;

use std::borrow::Cow;

pub use al2::AmazonLinux2Bootstrapper;
pub use custom::CustomBootstrapper;
use tracing::debug;
pub use ubuntu::UbuntuBootstrapper;

use crate::{
  cloudinit::{CloudConfig, ConfigFile, Script},
  cluster::{ClusterSpec, NodeGroupSpec, OsFamily},
  ec2,
  error::{Error, Result},
  kubelet::{self, Authenticator, KubeConfig, KubeletConfiguration},
  Assets,
};

/// Directory on the node holding the assembled configuration files
pub const CONFIG_DIR: &str = "/etc/eksboot/";

/// Produces the complete user-data payload for one OS family
///
/// Every invocation is a stateless transformation of the two input specs into
/// one document or one error; retries belong to the caller, not here.
pub trait Bootstrapper {
  fn user_data(&self) -> Result<Vec<u8>>;
}

/// Read-only lookup of the default bootstrap script for an OS family
///
/// Injected into the bootstrappers so tests can substitute fixtures for the
/// embedded assets
pub trait BootstrapScripts {
  fn bootstrap_script(&self, family: OsFamily) -> Result<Cow<'static, [u8]>>;
}

/// Bootstrap scripts compiled into the crate from `files/`
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbeddedScripts;

impl BootstrapScripts for EmbeddedScripts {
  fn bootstrap_script(&self, family: OsFamily) -> Result<Cow<'static, [u8]>> {
    let name = match family {
      OsFamily::AmazonLinux2 => "bootstrap.al2.sh",
      OsFamily::Ubuntu1804 | OsFamily::Ubuntu2004 => "bootstrap.ubuntu.sh",
      OsFamily::Custom => return Err(Error::MissingScript(family)),
    };

    match Assets::get(name) {
      Some(file) => Ok(file.data),
      None => Err(Error::MissingScript(family)),
    }
  }
}

/// Assemble the encoded user-data document for a node group
pub fn generate_user_data(cluster: &ClusterSpec, node_group: &NodeGroupSpec) -> Result<Vec<u8>> {
  generate_user_data_with(cluster, node_group, &EmbeddedScripts)
}

/// Same as [generate_user_data] with a caller-supplied script lookup
pub fn generate_user_data_with(
  cluster: &ClusterSpec,
  node_group: &NodeGroupSpec,
  scripts: &dyn BootstrapScripts,
) -> Result<Vec<u8>> {
  let user_data = match node_group.ami_family {
    OsFamily::AmazonLinux2 => AmazonLinux2Bootstrapper::new(cluster, node_group, scripts).user_data(),
    OsFamily::Ubuntu1804 | OsFamily::Ubuntu2004 => UbuntuBootstrapper::new(cluster, node_group, scripts).user_data(),
    OsFamily::Custom => CustomBootstrapper::new(cluster, node_group).user_data(),
  }?;

  debug!("user-data = {}", String::from_utf8_lossy(&user_data));
  Ok(user_data)
}

/// The standard file set written under the configuration directory
///
/// Insertion order is preserved into the document
fn common_files(
  cluster: &ClusterSpec,
  node_group: &NodeGroupSpec,
  authenticator: Authenticator,
) -> Result<Vec<ConfigFile>> {
  let ca_path = format!("{CONFIG_DIR}ca.crt");
  let kubeconfig = KubeConfig::new_for_node(cluster, authenticator, &ca_path)?;

  let extra_config = kubelet::extra_kubelet_config(node_group);
  let kubelet_yaml = KubeletConfiguration::new(&ca_path).render(&extra_config)?;

  let ca = String::from_utf8(cluster.certificate_authority_data.clone()).map_err(|_| Error::Encoding {
    reason: "certificate authority data is not valid UTF-8".to_owned(),
  })?;

  Ok(vec![
    ConfigFile::new(CONFIG_DIR, "metadata.env", kubelet::metadata_env_params(cluster).join("\n")),
    ConfigFile::new(CONFIG_DIR, "kubelet.env", kubelet::kubelet_env_params(node_group).join("\n")),
    ConfigFile::new(CONFIG_DIR, "kubelet.yaml", kubelet_yaml),
    ConfigFile::new(CONFIG_DIR, "ca.crt", ca),
    ConfigFile::new(CONFIG_DIR, "kubeconfig.yaml", kubeconfig.to_yaml()?),
    ConfigFile::new(CONFIG_DIR, "max_pods.map", ec2::max_pods_mapping()),
  ])
}

/// Shared assembly path across OS families
///
/// Command/script selection is mutually exclusive, in priority order:
/// pre-bootstrap hooks always run first, a full override replaces the default
/// script entirely, otherwise the family's script runs.
fn build_user_data(
  cluster: &ClusterSpec,
  node_group: &NodeGroupSpec,
  authenticator: Authenticator,
  script: Option<Script>,
) -> Result<Vec<u8>> {
  if cluster.certificate_authority_data.is_empty() {
    return Err(Error::MissingCredentialData("cluster certificate authority data is empty"));
  }

  let mut config = CloudConfig::new();

  for file in common_files(cluster, node_group, authenticator)? {
    config.add_file(file)?;
  }

  for command in &node_group.pre_bootstrap_commands {
    config.add_shell_command(command);
  }

  if let Some(command) = &node_group.override_bootstrap_command {
    config.add_shell_command(command);
  } else if let Some(script) = script {
    config.run_script(script)?;
  }

  config.encode()
}

/// Decode a family's bootstrap script into the text embedded in the document
fn script_contents(scripts: &dyn BootstrapScripts, family: OsFamily) -> Result<String> {
  let contents = scripts.bootstrap_script(family)?;

  String::from_utf8(contents.into_owned()).map_err(|_| Error::Encoding {
    reason: "bootstrap script is not valid UTF-8".to_owned(),
  })
}
