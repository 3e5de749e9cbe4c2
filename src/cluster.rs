use std::{collections::BTreeMap, net::IpAddr};

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// OS family of the image a node group launches
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OsFamily {
  AmazonLinux2,
  Ubuntu1804,
  Ubuntu2004,
  /// Bring-your-own image; the node group must supply its own bootstrap command
  Custom,
}

impl Default for OsFamily {
  fn default() -> Self {
    Self::AmazonLinux2
  }
}

/// Details of the cluster a node joins
///
/// Supplied in-memory by the caller, already validated - values originate from
/// the EKS DescribeCluster response or the caller's own configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClusterSpec {
  /// The name of the EKS cluster
  pub name: String,

  /// The AWS region the cluster resides in
  pub region: String,

  /// The cluster API server endpoint
  pub endpoint: String,

  /// The decoded (PEM) cluster certificate authority contents
  pub certificate_authority_data: Vec<u8>,
}

impl ClusterSpec {
  /// Build a spec from the base64 encoded CA content returned by the EKS API
  pub fn from_base64_ca(name: &str, region: &str, endpoint: &str, b64_ca: &str) -> Result<Self> {
    let certificate_authority_data = general_purpose::STANDARD.decode(b64_ca)?;

    Ok(ClusterSpec {
      name: name.to_owned(),
      region: region.to_owned(),
      endpoint: endpoint.to_owned(),
      certificate_authority_data,
    })
  }
}

/// Configuration template shared by every node of a node group
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeGroupSpec {
  /// OS family of the image the group launches
  pub ami_family: OsFamily,

  /// Overrides the IP address to use for DNS queries within the cluster
  pub cluster_dns: Option<IpAddr>,

  /// Open key/value overrides merged into the kubelet configuration document
  pub kubelet_extra_config: Option<BTreeMap<String, serde_json::Value>>,

  /// Shell commands run before the bootstrap step, in the order supplied
  pub pre_bootstrap_commands: Vec<String>,

  /// Replaces the default bootstrap script entirely when set
  pub override_bootstrap_command: Option<String>,

  /// Pins the kubelet max pods count instead of the instance-type derived value
  pub max_pods_per_node: Option<i32>,

  /// Labels applied to the node at registration
  pub labels: BTreeMap<String, String>,

  /// Taints applied to the node at registration
  pub taints: Vec<NodeTaint>,
}

/// Taint applied to a node at registration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeTaint {
  /// The taint key to be applied to a node
  pub key: String,

  /// The taint value corresponding to the taint key
  pub value: String,

  /// The effect of the taint on pods that do not tolerate the taint
  /// (NoSchedule, PreferNoSchedule, NoExecute)
  pub effect: String,
}

impl NodeGroupSpec {
  /// Render node labels as the comma separated `key=value` list the kubelet expects
  pub(crate) fn formatted_labels(&self) -> String {
    self
      .labels
      .iter()
      .map(|(key, value)| format!("{key}={value}"))
      .collect::<Vec<_>>()
      .join(",")
  }

  /// Render node taints as the comma separated `key=value:effect` list the kubelet expects
  pub(crate) fn formatted_taints(&self) -> String {
    self
      .taints
      .iter()
      .map(|taint| format!("{}={}:{}", taint.key, taint.value, taint.effect))
      .collect::<Vec<_>>()
      .join(",")
  }
}
